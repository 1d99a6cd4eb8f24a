//! Event source domain model.
//!
//! # Responsibility
//! - Define the immutable description of one monitored input line.
//! - Define line levels and their button-state interpretation.
//!
//! # Invariants
//! - An `EventSource` never changes after the registry is built.
//! - Sources are addressed by `SourceId`, their position in the registry.

pub mod source;
