//! Declarative schema descriptors.
//!
//! A descriptor captures everything that differs between insurer data shapes:
//! required top-level keys, which list fields hold sub-entities, how deep the
//! product hierarchy goes, which facets each level carries (in emission
//! order) and the text template for every chunk type.

use crate::types::{ChunkType, EntityLevel};
use catalog_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Built-in families, embedded at compile time.
const BUILTIN_FAMILIES: [(&str, &str); 3] = [
    ("flat-product", include_str!("families/flat_product.yaml")),
    ("nested-product", include_str!("families/nested_product.yaml")),
    ("alt-facet", include_str!("families/alt_facet.yaml")),
];

/// Placeholder rendered for fallback fields that are absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Company key holding the branch list (shared by every family).
pub const BRANCH_LIST_KEY: &str = "branches";

/// Schema descriptor for one insurer data shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Family name (e.g. "nested-product")
    pub family: String,

    /// Separator used when joining flattened key paths
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Keys that must exist on the company record
    pub required_top_level: Vec<String>,

    /// List-valued fields passed through the flattener untouched
    #[serde(default)]
    pub entity_list_fields: Vec<String>,

    /// Product hierarchy, outermost level first
    pub levels: Vec<LevelSpec>,

    /// Text template per chunk type
    #[serde(default)]
    pub templates: BTreeMap<ChunkType, TextTemplate>,
}

/// One level of the product hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub level: EntityLevel,

    /// Key of the list holding entities of this level in the parent
    pub list_key: String,

    /// Source-provided identifier key
    pub id_key: String,

    /// Display name key
    pub name_key: String,

    /// Optional keys; absence is reported as a diagnostic
    #[serde(default)]
    pub expected_keys: Vec<String>,

    /// Facets of this level, in emission order
    #[serde(default)]
    pub facets: Vec<ChunkType>,
}

/// Template text plus its per-field missing-value policy.
///
/// Every `{{field}}` referenced by `text` is required unless listed in
/// `fallback`, in which case it renders as `N/A` when absent. `coalesce`
/// derives a field from the first present field of a candidate list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextTemplate {
    pub text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub coalesce: BTreeMap<String, Vec<String>>,
}

fn default_separator() -> String {
    "_".to_string()
}

impl SchemaDescriptor {
    /// Names of the built-in schema families.
    pub fn builtin_families() -> Vec<&'static str> {
        BUILTIN_FAMILIES.iter().map(|(name, _)| *name).collect()
    }

    /// Load a built-in schema family by name.
    pub fn builtin(name: &str) -> AppResult<Self> {
        let (_, source) = BUILTIN_FAMILIES
            .iter()
            .find(|(family, _)| *family == name)
            .ok_or_else(|| {
                AppError::Schema(format!(
                    "Unknown schema family: '{}'. Built-in families: {}",
                    name,
                    Self::builtin_families().join(", ")
                ))
            })?;

        Self::from_yaml_str(source)
    }

    /// Parse and validate a descriptor from YAML.
    pub fn from_yaml_str(source: &str) -> AppResult<Self> {
        let descriptor: SchemaDescriptor = serde_yaml::from_str(source)
            .map_err(|e| AppError::Schema(format!("Failed to parse schema descriptor: {}", e)))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Load a descriptor from a YAML file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Schema(format!("Failed to read schema file {:?}: {}", path, e))
        })?;

        let descriptor = Self::from_yaml_str(&content)?;
        tracing::debug!("Loaded schema '{}' from {:?}", descriptor.family, path);
        Ok(descriptor)
    }

    /// Render the descriptor back to YAML.
    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> AppResult<()> {
        if self.family.trim().is_empty() {
            return Err(AppError::Schema("Schema family name is empty".to_string()));
        }

        if self.separator.is_empty() {
            return Err(AppError::Schema(format!(
                "Schema '{}' has an empty separator",
                self.family
            )));
        }

        let expected_order = [
            EntityLevel::Product,
            EntityLevel::SubProduct,
            EntityLevel::Variant,
        ];

        if self.levels.is_empty() || self.levels.len() > expected_order.len() {
            return Err(AppError::Schema(format!(
                "Schema '{}' must declare between 1 and 3 levels, found {}",
                self.family,
                self.levels.len()
            )));
        }

        for (spec, expected) in self.levels.iter().zip(expected_order) {
            if spec.level != expected {
                return Err(AppError::Schema(format!(
                    "Schema '{}' declares level '{}' where '{}' was expected",
                    self.family,
                    spec.level.as_str(),
                    expected.as_str()
                )));
            }

            if spec.list_key.is_empty() || spec.id_key.is_empty() || spec.name_key.is_empty() {
                return Err(AppError::Schema(format!(
                    "Level '{}' of schema '{}' needs list_key, id_key and name_key",
                    spec.level.as_str(),
                    self.family
                )));
            }

            if let Some(facet) = spec.facets.iter().find(|f| !f.is_facet()) {
                return Err(AppError::Schema(format!(
                    "'{}' is not a facet (level '{}' of schema '{}')",
                    facet,
                    spec.level.as_str(),
                    self.family
                )));
            }
        }

        Ok(())
    }

    /// Level spec for an entity level, if this schema defines it.
    pub fn level(&self, level: EntityLevel) -> Option<&LevelSpec> {
        self.levels.iter().find(|spec| spec.level == level)
    }

    /// Spec of the level directly below `level`.
    pub fn child_of(&self, level: EntityLevel) -> Option<&LevelSpec> {
        let index = self.levels.iter().position(|spec| spec.level == level)?;
        self.levels.get(index + 1)
    }

    /// Spec of the outermost (product) level. `None` only for descriptors
    /// built by hand without levels.
    pub fn product_level(&self) -> Option<&LevelSpec> {
        self.levels
            .first()
            .filter(|spec| spec.level == EntityLevel::Product)
    }

    pub fn is_entity_list_field(&self, key: &str) -> bool {
        self.entity_list_fields.iter().any(|field| field == key)
    }

    pub fn template(&self, chunk_type: ChunkType) -> Option<&TextTemplate> {
        self.templates.get(&chunk_type)
    }
}
