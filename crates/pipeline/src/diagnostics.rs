//! Per-run diagnostics collector.
//!
//! Every non-fatal condition found while processing one company record is
//! recorded here instead of a process-wide log sink, so runs stay independent
//! and testable. Each event is also emitted as a `tracing` warning.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a non-fatal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Optional field absent from an entity
    FieldMissing,
    /// Source id used by more than one entity of the same level
    DuplicateId,
    /// Template could not be rendered; the chunk carries degraded text
    Render,
    /// Emitted chunks disagree with source counts
    Reconciliation,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::FieldMissing => "field_missing",
            DiagnosticKind::DuplicateId => "duplicate_id",
            DiagnosticKind::Render => "render",
            DiagnosticKind::Reconciliation => "reconciliation",
        };
        f.write_str(name)
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    /// Entity the event is about, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    pub message: String,
}

/// Ordered list of diagnostics for a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and forward it to the tracing subscriber.
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        entity_id: Option<&str>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        match entity_id {
            Some(id) => tracing::warn!(kind = %kind, entity = id, "{}", message),
            None => tracing::warn!(kind = %kind, "{}", message),
        }
        self.events.push(Diagnostic {
            kind,
            entity_id: entity_id.map(str::to_string),
            message,
        });
    }

    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.iter().filter(|d| d.kind == kind).count()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter().filter(move |d| d.kind == kind)
    }

    pub fn into_events(self) -> Vec<Diagnostic> {
        self.events
    }
}
