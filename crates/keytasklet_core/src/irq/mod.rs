//! Top-half / deferred-half split.
//!
//! # Responsibility
//! - Capture transitions in interrupt context with bounded work.
//! - Hand the firing source to one shared deferred unit through a single slot.
//! - Inspect and report the button state outside interrupt context.
//!
//! # Invariants
//! - One handoff slot and one deferred unit serve all sources.
//! - Rapid transitions on several sources before a deferred run collapse into
//!   one report about the last source that fired.

pub mod deferred;
pub mod handoff;
pub mod inspect;
pub mod top_half;
