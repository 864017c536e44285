//! Structural validation of company records.
//!
//! Violations that make the record impossible to walk (missing required keys,
//! lists that are not lists, entities that are not objects or have no id) are
//! fatal. Missing optional keys and duplicate ids are recorded as diagnostics
//! and processing continues. The record is never modified.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::StructuralError;
use crate::schema::{LevelSpec, SchemaDescriptor, BRANCH_LIST_KEY};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Validate `record` against `schema`, recording non-fatal findings.
pub fn validate(
    record: &Value,
    schema: &SchemaDescriptor,
    diagnostics: &mut Diagnostics,
) -> Result<(), StructuralError> {
    let record = record.as_object().ok_or(StructuralError::NotAMapping)?;

    for key in &schema.required_top_level {
        if !record.contains_key(key) {
            return Err(StructuralError::MissingKey(key.clone()));
        }
    }

    let company_id = match record.get("company_id") {
        None => return Err(StructuralError::MissingKey("company_id".to_string())),
        Some(value) => entity_id(Some(value)).ok_or(StructuralError::InvalidCompanyId)?,
    };

    if let Some(branches) = record.get(BRANCH_LIST_KEY) {
        let branches = branches
            .as_array()
            .ok_or_else(|| StructuralError::NotASequence {
                key: BRANCH_LIST_KEY.to_string(),
                owner: None,
            })?;
        for (index, branch) in branches.iter().enumerate() {
            if !branch.is_object() {
                return Err(StructuralError::ElementNotAMapping {
                    key: BRANCH_LIST_KEY.to_string(),
                    index,
                    owner: None,
                });
            }
        }
    }

    let product_level = schema
        .product_level()
        .ok_or_else(|| StructuralError::NoProductLevel(schema.family.clone()))?;
    if let Some(products) = record.get(&product_level.list_key) {
        validate_level(products, product_level, None, schema, diagnostics)?;
    }

    tracing::debug!("Validated record for company {}", company_id);
    Ok(())
}

/// Validate one entity list and, recursively, the lists nested below it.
fn validate_level(
    items: &Value,
    spec: &LevelSpec,
    owner: Option<&str>,
    schema: &SchemaDescriptor,
    diagnostics: &mut Diagnostics,
) -> Result<(), StructuralError> {
    let items = items
        .as_array()
        .ok_or_else(|| StructuralError::NotASequence {
            key: spec.list_key.clone(),
            owner: owner.map(str::to_string),
        })?;

    let child = schema.child_of(spec.level);
    let mut seen = HashSet::new();

    for (index, item) in items.iter().enumerate() {
        let entity = item
            .as_object()
            .ok_or_else(|| StructuralError::ElementNotAMapping {
                key: spec.list_key.clone(),
                index,
                owner: owner.map(str::to_string),
            })?;

        let id = entity_id(entity.get(&spec.id_key)).ok_or_else(|| {
            StructuralError::MissingEntityId {
                key: spec.list_key.clone(),
                index,
                id_key: spec.id_key.clone(),
            }
        })?;

        report_missing_keys(entity, spec, &id, diagnostics);

        if !seen.insert(id.clone()) {
            diagnostics.record(
                DiagnosticKind::DuplicateId,
                Some(&id),
                format!(
                    "Duplicate {} '{}' in {}",
                    spec.id_key,
                    id,
                    owner.unwrap_or("company")
                ),
            );
        }

        if let Some(child_spec) = child {
            match entity.get(&child_spec.list_key) {
                None | Some(Value::Null) => {}
                Some(children) => {
                    validate_level(children, child_spec, Some(&id), schema, diagnostics)?
                }
            }
        }
    }

    Ok(())
}

fn report_missing_keys(
    entity: &Map<String, Value>,
    spec: &LevelSpec,
    id: &str,
    diagnostics: &mut Diagnostics,
) {
    for key in &spec.expected_keys {
        if !entity.contains_key(key) {
            diagnostics.record(
                DiagnosticKind::FieldMissing,
                Some(id),
                format!("{} {} missing key: {}", spec.level.as_str(), id, key),
            );
        }
    }
}

/// Usable identifier from a source value: non-empty string or a number.
pub(crate) fn entity_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
