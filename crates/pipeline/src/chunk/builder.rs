//! Chunk emission.
//!
//! Walks a normalized catalog in emission order: company, branches, then for
//! each product its metadata and facets followed by its sub-products (and
//! their variants) in the same shape.

use crate::chunk::ids::ChunkIdStrategy;
use crate::chunk::render::Renderer;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::RenderError;
use crate::flatten::Flattener;
use crate::normalize::{EntityNode, NormalizedCatalog};
use crate::schema::SchemaDescriptor;
use crate::types::{Chunk, ChunkType, EntityKeys};
use serde_json::{Map, Value};

/// Context key holding the entity's display name in facet templates.
const ENTITY_NAME: &str = "entity_name";

/// Builds the ordered chunk sequence for one company.
pub struct ChunkBuilder<'a> {
    schema: &'a SchemaDescriptor,
    renderer: &'a Renderer,
    id_strategy: ChunkIdStrategy,
}

/// Accumulates chunks and assigns ids by position.
struct Emitter<'d> {
    id_strategy: ChunkIdStrategy,
    chunks: Vec<Chunk>,
    diagnostics: &'d mut Diagnostics,
}

/// The entity a chunk describes, for diagnostics and error text.
#[derive(Clone, Copy)]
struct Subject<'s> {
    entity_id: &'s str,
    /// Record field behind `entity_name`
    name_key: Option<&'s str>,
}

impl<'s> Subject<'s> {
    fn id(entity_id: &'s str) -> Self {
        Self {
            entity_id,
            name_key: None,
        }
    }
}

impl<'a> ChunkBuilder<'a> {
    pub fn new(
        schema: &'a SchemaDescriptor,
        renderer: &'a Renderer,
        id_strategy: ChunkIdStrategy,
    ) -> Self {
        Self {
            schema,
            renderer,
            id_strategy,
        }
    }

    /// Emit every chunk of `catalog`. Render failures degrade the affected
    /// chunk's text and are recorded in `diagnostics`.
    pub fn build(&self, catalog: &NormalizedCatalog, diagnostics: &mut Diagnostics) -> Vec<Chunk> {
        let mut emitter = Emitter {
            id_strategy: self.id_strategy,
            chunks: Vec::new(),
            diagnostics,
        };

        let company_keys = EntityKeys::company(catalog.company_id.clone());
        emitter.emit(
            self.renderer,
            &company_keys,
            ChunkType::CompanyMetadata,
            catalog.company_metadata.clone(),
            &catalog.company_metadata,
            Subject::id(&catalog.company_id),
        );

        for branch in &catalog.branches {
            emitter.emit(
                self.renderer,
                &company_keys,
                ChunkType::Branch,
                branch.fields.clone(),
                &branch.fields,
                Subject::id(&branch.branch_id),
            );
        }

        for product in &catalog.products {
            self.emit_entity(product, &mut emitter);
        }

        tracing::info!(
            "Generated {} chunks for company {}",
            emitter.chunks.len(),
            catalog.company_id
        );

        emitter.chunks
    }

    fn emit_entity(&self, node: &EntityNode, emitter: &mut Emitter<'_>) {
        let flattener = Flattener::for_schema(self.schema);
        let level = self.schema.level(node.level);
        let subject = Subject {
            entity_id: &node.id,
            name_key: level.map(|spec| spec.name_key.as_str()),
        };

        let mut metadata_context = node.fields.clone();
        for (facet, value) in &node.facets {
            let single = Map::from_iter([(facet.clone(), value.clone())]);
            for (key, value) in flattener.flatten(&single, "") {
                metadata_context.entry(key).or_insert(value);
            }
        }
        emitter.emit(
            self.renderer,
            &node.keys,
            node.level.metadata_chunk_type(),
            node.fields.clone(),
            &metadata_context,
            subject,
        );

        let facets = level.map(|spec| spec.facets.as_slice()).unwrap_or_default();

        for facet in facets {
            let value = match node.facets.get(facet.as_str()) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };

            let wrapped = Map::from_iter([(facet.as_str().to_string(), value.clone())]);
            let raw_data = flattener.flatten(&wrapped, "");

            let mut context = raw_data.clone();
            for (key, value) in entity_context(node, self.schema) {
                context.insert(key, value);
            }

            emitter.emit(self.renderer, &node.keys, *facet, raw_data, &context, subject);
        }

        for child in &node.children {
            self.emit_entity(child, emitter);
        }
    }
}

/// Identity fields every facet template may reference.
fn entity_context(node: &EntityNode, schema: &SchemaDescriptor) -> Map<String, Value> {
    let mut context = Map::new();
    for (key, value) in node.keys.pairs() {
        context.insert(key.to_string(), Value::String(value.to_string()));
    }

    if let Some(name) = &node.name {
        if let Some(spec) = schema.level(node.level) {
            context.insert(spec.name_key.clone(), Value::String(name.clone()));
        }
        context.insert(ENTITY_NAME.to_string(), Value::String(name.clone()));
    }
    context.insert("entity_id".to_string(), Value::String(node.id.clone()));

    context
}

impl Emitter<'_> {
    fn emit(
        &mut self,
        renderer: &Renderer,
        keys: &EntityKeys,
        chunk_type: ChunkType,
        raw_data: Map<String, Value>,
        context: &Map<String, Value>,
        subject: Subject<'_>,
    ) {
        let text = match renderer.render(chunk_type, context) {
            Ok(text) => text,
            Err(e) => {
                // A missing display name is reported as the record field it comes from.
                let e = match (e, subject.name_key) {
                    (RenderError::MissingKey(key), Some(name_key)) if key == ENTITY_NAME => {
                        RenderError::MissingKey(name_key.to_string())
                    }
                    (e, _) => e,
                };
                let entity = subject.entity_id;
                self.diagnostics.record(
                    DiagnosticKind::Render,
                    Some(entity),
                    format!("Failed to render {} for {}: {}", chunk_type, entity, e),
                );
                format!("Error generating text for {}: {}", chunk_type, e)
            }
        };

        let chunk_id = self
            .id_strategy
            .chunk_id(keys, chunk_type, self.chunks.len());
        self.chunks
            .push(Chunk::new(chunk_id, keys.clone(), chunk_type, raw_data, text));
    }
}
