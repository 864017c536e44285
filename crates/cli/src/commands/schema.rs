//! Schema command handler.

use catalog_core::AppResult;
use catalog_pipeline::SchemaDescriptor;
use clap::Args;

/// List built-in schema families or print one as YAML
#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Family to print
    #[arg(long)]
    pub family: Option<String>,
}

impl SchemaCommand {
    pub async fn execute(&self) -> AppResult<()> {
        match &self.family {
            Some(family) => {
                let schema = SchemaDescriptor::builtin(family)?;
                print!("{}", schema.to_yaml()?);
            }
            None => {
                for family in SchemaDescriptor::builtin_families() {
                    let schema = SchemaDescriptor::builtin(family)?;
                    let levels: Vec<&str> = schema.levels.iter().map(|l| l.level.as_str()).collect();
                    println!("{} (levels: {})", family, levels.join(" → "));
                }
            }
        }
        Ok(())
    }
}
