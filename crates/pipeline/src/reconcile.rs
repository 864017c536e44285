//! Post-build consistency checks between the source record and its chunks.
//!
//! Reconciliation never changes the output; every mismatch becomes a
//! warning and a diagnostic.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::schema::{SchemaDescriptor, BRANCH_LIST_KEY};
use crate::types::{Chunk, ChunkType, EntityLevel};
use crate::validate::entity_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A disagreement between source counts and emitted chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconciliationWarning {
    CountMismatch {
        chunk_type: ChunkType,
        expected: usize,
        actual: usize,
    },
    MissingChunk {
        entity_id: String,
        chunk_type: ChunkType,
    },
}

impl fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationWarning::CountMismatch {
                chunk_type,
                expected,
                actual,
            } => write!(
                f,
                "{} count mismatch: expected {}, got {}",
                chunk_type, expected, actual
            ),
            ReconciliationWarning::MissingChunk {
                entity_id,
                chunk_type,
            } => write!(f, "Missing {} chunk for {}", chunk_type, entity_id),
        }
    }
}

/// Compare `chunks` against `record`.
pub fn reconcile(
    record: &Value,
    schema: &SchemaDescriptor,
    chunks: &[Chunk],
    diagnostics: &mut Diagnostics,
) -> Vec<ReconciliationWarning> {
    let mut warnings = Vec::new();
    let Some(product_level) = schema.product_level() else {
        return warnings;
    };

    let branches = items(record, BRANCH_LIST_KEY);
    let products = items(record, &product_level.list_key);

    let mut expected = vec![
        (ChunkType::Branch, branches.len()),
        (ChunkType::ProductMetadata, products.len()),
    ];

    if let Some(sub_spec) = schema.level(EntityLevel::SubProduct) {
        let sub_products: Vec<&Value> = products
            .iter()
            .flat_map(|product| items(product, &sub_spec.list_key))
            .collect();
        expected.push((ChunkType::SubProductMetadata, sub_products.len()));

        if let Some(variant_spec) = schema.level(EntityLevel::Variant) {
            let variants = sub_products
                .iter()
                .map(|sub| items(sub, &variant_spec.list_key).len())
                .sum();
            expected.push((ChunkType::VariantMetadata, variants));
        }
    }

    for (chunk_type, expected) in expected {
        let actual = chunks.iter().filter(|c| c.chunk_type == chunk_type).count();
        if actual != expected {
            warnings.push(ReconciliationWarning::CountMismatch {
                chunk_type,
                expected,
                actual,
            });
        }
    }

    if let Some(first) = products.first() {
        if let Some(product_id) = entity_id(first.get(&product_level.id_key)) {
            let present_facets = product_level.facets.iter().copied().filter(|facet| {
                first
                    .get(facet.as_str())
                    .is_some_and(|value| !value.is_null())
            });

            for chunk_type in std::iter::once(ChunkType::ProductMetadata).chain(present_facets) {
                let found = chunks.iter().any(|c| {
                    c.chunk_type == chunk_type
                        && c.product_id.as_deref() == Some(product_id.as_str())
                        && c.sub_product_id.is_none()
                });
                if !found {
                    warnings.push(ReconciliationWarning::MissingChunk {
                        entity_id: product_id.clone(),
                        chunk_type,
                    });
                }
            }
        }
    }

    for warning in &warnings {
        let entity = match warning {
            ReconciliationWarning::MissingChunk { entity_id, .. } => Some(entity_id.as_str()),
            ReconciliationWarning::CountMismatch { .. } => None,
        };
        diagnostics.record(DiagnosticKind::Reconciliation, entity, warning.to_string());
    }

    if warnings.is_empty() {
        tracing::info!("Reconciliation passed for {} chunks", chunks.len());
    }

    warnings
}

/// Elements of the list under `key`; absent, null or non-list counts as empty.
fn items<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
