//! Template rendering for chunk text.
//!
//! Templates are handlebars strings registered in strict mode with escaping
//! disabled. Before rendering, every `{{field}}` placeholder is resolved
//! against the chunk context using the template's missing-value policy, so a
//! missing required field is reported by name instead of as a generic
//! handlebars failure.

use crate::error::RenderError;
use crate::schema::{SchemaDescriptor, TextTemplate, NOT_AVAILABLE};
use crate::types::ChunkType;
use catalog_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Placeholders and missing-value policy of one registered template.
#[derive(Debug, Clone)]
struct CompiledTemplate {
    /// Placeholder names in order of first appearance
    placeholders: Vec<String>,
    fallback: HashSet<String>,
    coalesce: BTreeMap<String, Vec<String>>,
}

/// Renders chunk text from a schema's templates.
#[derive(Debug)]
pub struct Renderer {
    registry: Handlebars<'static>,
    compiled: HashMap<ChunkType, CompiledTemplate>,
}

impl Renderer {
    /// Register every template of `schema`.
    pub fn new(schema: &SchemaDescriptor) -> AppResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);

        let mut compiled = HashMap::new();
        for (chunk_type, template) in &schema.templates {
            registry
                .register_template_string(chunk_type.as_str(), &template.text)
                .map_err(|e| {
                    AppError::Schema(format!(
                        "Invalid {} template in schema '{}': {}",
                        chunk_type, schema.family, e
                    ))
                })?;
            compiled.insert(*chunk_type, compile(template));
        }

        tracing::debug!(
            "Registered {} templates for schema '{}'",
            compiled.len(),
            schema.family
        );

        Ok(Self { registry, compiled })
    }

    pub fn has_template(&self, chunk_type: ChunkType) -> bool {
        self.compiled.contains_key(&chunk_type)
    }

    /// Render the text for `chunk_type` from `context`.
    ///
    /// Chunk types without a template get a generic `key: value` listing.
    pub fn render(
        &self,
        chunk_type: ChunkType,
        context: &Map<String, Value>,
    ) -> Result<String, RenderError> {
        let Some(template) = self.compiled.get(&chunk_type) else {
            return Ok(generic_text(chunk_type, context));
        };

        let mut values: HashMap<&str, String> = HashMap::new();
        for name in &template.placeholders {
            let value = match resolve(context, name, &template.coalesce) {
                Some(value) => display_value(value),
                None if template.fallback.contains(name) => NOT_AVAILABLE.to_string(),
                None => return Err(RenderError::MissingKey(name.clone())),
            };
            values.insert(name.as_str(), value);
        }

        let text = self
            .registry
            .render(chunk_type.as_str(), &values)
            .map_err(|e| RenderError::Template(e.to_string()))?;

        Ok(text.trim().to_string())
    }
}

/// Look `name` up in the context, then through its coalesce candidates.
fn resolve<'a>(
    context: &'a Map<String, Value>,
    name: &str,
    coalesce: &BTreeMap<String, Vec<String>>,
) -> Option<&'a Value> {
    if let Some(value) = context.get(name) {
        return Some(value);
    }

    coalesce
        .get(name)?
        .iter()
        .find_map(|candidate| context.get(candidate).filter(|v| !v.is_null()))
}

fn compile(template: &TextTemplate) -> CompiledTemplate {
    CompiledTemplate {
        placeholders: placeholders(&template.text),
        fallback: template.fallback.iter().cloned().collect(),
        coalesce: template.coalesce.clone(),
    }
}

/// Simple `{{identifier}}` placeholders in order of first appearance.
///
/// Helpers, block expressions and paths are left to handlebars.
pub(crate) fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };

        let name = after[..end].trim();
        let is_identifier = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if is_identifier && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }

        rest = &after[end + 2..];
    }

    names
}

/// Text form of a context value.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let separator = if items.iter().any(Value::is_object) {
                "; "
            } else {
                ", "
            };
            items
                .iter()
                .map(display_value)
                .collect::<Vec<_>>()
                .join(separator)
        }
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{}: {}", key, display_value(value)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Fallback text for chunk types the schema has no template for.
fn generic_text(chunk_type: ChunkType, context: &Map<String, Value>) -> String {
    let body = context
        .iter()
        .map(|(key, value)| format!("{}: {}", key, display_value(value)))
        .collect::<Vec<_>>()
        .join("; ");
    format!("{}: {}", chunk_type, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    fn schema_with(chunk_type: ChunkType, template: TextTemplate) -> SchemaDescriptor {
        let mut schema = SchemaDescriptor::builtin("flat-product").unwrap();
        schema.templates.clear();
        schema.templates.insert(chunk_type, template);
        schema
    }

    #[test]
    fn test_placeholder_scan() {
        let names = placeholders("{{a}} and {{ b_c }} then {{a}}, {{#if x}}{{/if}} {{d.e}}");
        assert_eq!(names, vec!["a", "b_c"]);
    }

    #[test]
    fn test_renders_branch_with_fallback() {
        let schema = SchemaDescriptor::builtin("nested-product").unwrap();
        let renderer = Renderer::new(&schema).unwrap();
        let ctx = context(json!({
            "branch_name": "Mombasa",
            "branch_id": "JUB_branch_001",
            "company_id": "JUB",
            "address": "Nkrumah Rd",
            "phone": "0700, 0711"
        }));

        let text = renderer.render(ChunkType::Branch, &ctx).unwrap();
        assert_eq!(
            text,
            "Branch Mombasa (ID: JUB_branch_001) of JUB is located at Nkrumah Rd. \
             Contact phones: 0700, 0711. Mobile: N/A. Email: N/A."
        );
    }

    #[test]
    fn test_missing_required_key_names_first_missing_field() {
        let schema = schema_with(
            ChunkType::Premium,
            TextTemplate {
                text: "{{product_name}} {{premium_currency}} {{premium_notes}}".to_string(),
                ..Default::default()
            },
        );
        let renderer = Renderer::new(&schema).unwrap();

        let err = renderer
            .render(ChunkType::Premium, &context(json!({"product_name": "Motor"})))
            .unwrap_err();
        assert_eq!(err, RenderError::MissingKey("premium_currency".to_string()));
    }

    #[test]
    fn test_no_html_escaping() {
        let schema = schema_with(
            ChunkType::Exclusions,
            TextTemplate {
                text: "Exclusions: {{exclusions}}".to_string(),
                ..Default::default()
            },
        );
        let renderer = Renderer::new(&schema).unwrap();
        let text = renderer
            .render(
                ChunkType::Exclusions,
                &context(json!({"exclusions": "War & \"riots\" <any>"})),
            )
            .unwrap();
        assert_eq!(text, "Exclusions: War & \"riots\" <any>");
    }

    #[test]
    fn test_coalesce_takes_first_present_candidate() {
        let schema = SchemaDescriptor::builtin("alt-facet").unwrap();
        let template = schema.template(ChunkType::ProviderNetwork).unwrap();
        assert!(template.coalesce.contains_key("network_partners"));

        let renderer = Renderer::new(&schema).unwrap();
        let ctx = context(json!({
            "product_name": "Health",
            "product_id": "H1",
            "provider_network_partners": "AAR, Avenue"
        }));
        let text = renderer.render(ChunkType::ProviderNetwork, &ctx).unwrap();
        assert!(text.contains("AAR, Avenue"), "{}", text);
    }

    #[test]
    fn test_display_values() {
        assert_eq!(display_value(&json!(null)), "N/A");
        assert_eq!(display_value(&json!(4.5)), "4.5");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!(["a", "b"])), "a, b");
        assert_eq!(
            display_value(&json!([{"age": 30, "rate": 100}, {"age": 40, "rate": 150}])),
            "age: 30, rate: 100; age: 40, rate: 150"
        );
    }

    #[test]
    fn test_generic_text_without_template() {
        let mut schema = SchemaDescriptor::builtin("flat-product").unwrap();
        schema.templates.clear();
        let renderer = Renderer::new(&schema).unwrap();

        assert!(!renderer.has_template(ChunkType::AddOns));
        let text = renderer
            .render(ChunkType::AddOns, &context(json!({"add_ons": "Roadside", "cost": 500})))
            .unwrap();
        assert_eq!(text, "add_ons: add_ons: Roadside; cost: 500");
    }

    #[test]
    fn test_invalid_template_is_schema_error() {
        let schema = schema_with(
            ChunkType::Premium,
            TextTemplate {
                text: "{{#if}}unterminated".to_string(),
                ..Default::default()
            },
        );
        let err = Renderer::new(&schema).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }
}
