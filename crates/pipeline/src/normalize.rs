//! Hierarchical normalization.
//!
//! Walks company → branches/products → sub-products → variants, assigns
//! synthetic branch ids and pushes foreign keys down to every entity. Facets
//! are kept as nested source values keyed by facet name; the chunk builder
//! flattens them when it emits their chunks.

use crate::error::StructuralError;
use crate::flatten::Flattener;
use crate::schema::{LevelSpec, SchemaDescriptor, BRANCH_LIST_KEY};
use crate::types::{EntityKeys, EntityLevel};
use crate::validate::entity_id;
use serde_json::{Map, Value};

/// A company record reshaped into its entity tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCatalog {
    pub company_id: String,

    /// Flattened company fields (everything except branches and products)
    pub company_metadata: Map<String, Value>,

    /// Branches in source order
    pub branches: Vec<BranchRecord>,

    /// Products in source order, each owning its sub-entities
    pub products: Vec<EntityNode>,
}

/// A branch with its synthetic id.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRecord {
    pub branch_id: String,

    /// Flattened branch fields plus `company_id` and `branch_id`
    pub fields: Map<String, Value>,
}

/// A product, sub-product or variant.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityNode {
    pub level: EntityLevel,

    /// Propagated foreign keys, including this entity's own id
    pub keys: EntityKeys,

    /// Source-provided identifier
    pub id: String,

    /// Display name, when the source provides one
    pub name: Option<String>,

    /// Flattened descriptive fields (facets and child lists excluded) plus foreign keys
    pub fields: Map<String, Value>,

    /// Facet source values keyed by facet name, in declared facet order
    pub facets: Map<String, Value>,

    /// Entities one level down, in source order
    pub children: Vec<EntityNode>,
}

impl NormalizedCatalog {
    /// Every product, sub-product and variant in emission (pre-)order.
    pub fn entities(&self) -> Vec<&EntityNode> {
        fn walk<'a>(node: &'a EntityNode, out: &mut Vec<&'a EntityNode>) {
            out.push(node);
            for child in &node.children {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for product in &self.products {
            walk(product, &mut out);
        }
        out
    }

    pub fn sub_products(&self) -> Vec<&EntityNode> {
        self.at_level(EntityLevel::SubProduct)
    }

    pub fn variants(&self) -> Vec<&EntityNode> {
        self.at_level(EntityLevel::Variant)
    }

    fn at_level(&self, level: EntityLevel) -> Vec<&EntityNode> {
        self.entities()
            .into_iter()
            .filter(|node| node.level == level)
            .collect()
    }
}

/// Synthetic branch id: `{company_id}_branch_{ordinal:03}`, ordinal 1-based.
pub fn branch_id(company_id: &str, ordinal: usize) -> String {
    format!("{}_branch_{:03}", company_id, ordinal)
}

/// Normalize a validated company record.
pub fn normalize(
    record: &Value,
    schema: &SchemaDescriptor,
) -> Result<NormalizedCatalog, StructuralError> {
    let record = record.as_object().ok_or(StructuralError::NotAMapping)?;
    let flattener = Flattener::for_schema(schema);
    let product_level = schema
        .product_level()
        .ok_or_else(|| StructuralError::NoProductLevel(schema.family.clone()))?;

    let company_id = entity_id(record.get("company_id")).ok_or(StructuralError::InvalidCompanyId)?;
    let company_keys = EntityKeys::company(company_id.clone());

    let company_fields: Map<String, Value> = record
        .iter()
        .filter(|(key, _)| key.as_str() != BRANCH_LIST_KEY && **key != product_level.list_key)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let company_metadata = flattener.flatten(&company_fields, "");

    let mut branches = Vec::new();
    for (index, branch) in list(record, BRANCH_LIST_KEY, None)?.iter().enumerate() {
        let branch = branch
            .as_object()
            .ok_or_else(|| StructuralError::ElementNotAMapping {
                key: BRANCH_LIST_KEY.to_string(),
                index,
                owner: None,
            })?;

        let id = branch_id(&company_id, index + 1);
        let mut fields = flattener.flatten(branch, "");
        fields.insert("company_id".to_string(), Value::String(company_id.clone()));
        fields.insert("branch_id".to_string(), Value::String(id.clone()));
        branches.push(BranchRecord {
            branch_id: id,
            fields,
        });
    }

    let products = normalize_level(
        list(record, &product_level.list_key, None)?,
        product_level,
        &company_keys,
        schema,
        &flattener,
    )?;

    let catalog = NormalizedCatalog {
        company_id,
        company_metadata,
        branches,
        products,
    };

    tracing::info!(
        "Normalized data: {} branches, {} products, {} sub-products, {} variants",
        catalog.branches.len(),
        catalog.products.len(),
        catalog.sub_products().len(),
        catalog.variants().len()
    );

    Ok(catalog)
}

fn normalize_level(
    items: &[Value],
    spec: &LevelSpec,
    parent_keys: &EntityKeys,
    schema: &SchemaDescriptor,
    flattener: &Flattener<'_>,
) -> Result<Vec<EntityNode>, StructuralError> {
    let child_spec = schema.child_of(spec.level);
    let owner = parent_keys.pairs().last().map(|(_, id)| id.to_string());

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let entity = item
                .as_object()
                .ok_or_else(|| StructuralError::ElementNotAMapping {
                    key: spec.list_key.clone(),
                    index,
                    owner: owner.clone(),
                })?;

            let id = entity_id(entity.get(&spec.id_key)).ok_or_else(|| {
                StructuralError::MissingEntityId {
                    key: spec.list_key.clone(),
                    index,
                    id_key: spec.id_key.clone(),
                }
            })?;
            let keys = parent_keys.child(spec.level, &id);

            let is_facet = |key: &str| spec.facets.iter().any(|f| f.as_str() == key);
            let is_children = |key: &str| child_spec.is_some_and(|c| c.list_key == key);

            let descriptive: Map<String, Value> = entity
                .iter()
                .filter(|(key, _)| !is_facet(key) && !is_children(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            let mut fields = flattener.flatten(&descriptive, "");
            for (key, value) in keys.pairs() {
                fields.insert(key.to_string(), Value::String(value.to_string()));
            }

            let facets: Map<String, Value> = spec
                .facets
                .iter()
                .filter_map(|facet| {
                    entity
                        .get(facet.as_str())
                        .map(|value| (facet.as_str().to_string(), value.clone()))
                })
                .collect();

            let children = match child_spec {
                Some(child) => normalize_level(
                    list(entity, &child.list_key, Some(&id))?,
                    child,
                    &keys,
                    schema,
                    flattener,
                )?,
                None => Vec::new(),
            };

            Ok(EntityNode {
                level: spec.level,
                name: entity.get(&spec.name_key).and_then(display_name),
                keys,
                id,
                fields,
                facets,
                children,
            })
        })
        .collect()
}

/// The list stored under `key`; absent or null counts as empty.
fn list<'a>(
    mapping: &'a Map<String, Value>,
    key: &str,
    owner: Option<&str>,
) -> Result<&'a [Value], StructuralError> {
    match mapping.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(StructuralError::NotASequence {
            key: key.to_string(),
            owner: owner.map(str::to_string),
        }),
    }
}

fn display_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
