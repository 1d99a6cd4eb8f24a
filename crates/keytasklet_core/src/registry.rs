//! Event source registry.
//!
//! # Responsibility
//! - Hold the fixed, ordered table of monitored lines.
//! - Resolve `SourceId` values carried through interrupt dispatch.
//!
//! # Invariants
//! - The table is built once and never mutated afterwards.
//! - Iteration order is table order; `SourceId(n)` is the n-th entry.

use crate::model::source::{EventSource, KeyCode, LineId, SourceId, TriggerId};

/// Compiled-in button table.
pub const DEFAULT_SOURCES: &[EventSource] = &[
    EventSource::new("KEY_UP", LineId(0), TriggerId(0), KeyCode::UP),
    EventSource::new("KEY_DOWN", LineId(1), TriggerId(1), KeyCode::DOWN),
];

/// Immutable ordered table of event sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<EventSource>,
}

impl SourceRegistry {
    /// Builds a registry from a static table.
    pub fn from_table(table: &[EventSource]) -> Self {
        Self {
            sources: table.to_vec(),
        }
    }

    /// Registry over `DEFAULT_SOURCES`.
    pub fn builtin() -> Self {
        Self::from_table(DEFAULT_SOURCES)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, id: SourceId) -> Option<&EventSource> {
        self.sources.get(id.index())
    }

    /// Looks up a source by its human-readable name.
    pub fn find(&self, name: &str) -> Option<(SourceId, &EventSource)> {
        self.iter().find(|(_, source)| source.name == name)
    }

    /// Iterates sources in table order together with their ids.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (SourceId, &EventSource)> + '_ {
        self.sources
            .iter()
            .enumerate()
            .map(|(index, source)| (SourceId(index), source))
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
