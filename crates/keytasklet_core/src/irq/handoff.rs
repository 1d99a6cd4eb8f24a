//! Single-slot handoff from the top half to the deferred unit.
//!
//! # Invariants
//! - The slot holds the most recently published source, nothing more.
//! - A publish unconditionally replaces the previous value, consumed or not.
//! - Readers never clear the slot.
//! - Values are whole-word replacements, so a reader sees either the old or
//!   the new source, never a mix.

use crate::model::source::SourceId;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

const EMPTY: usize = usize::MAX;

/// Last-writer-wins cell naming the source that fired most recently.
///
/// Any number of top halves may publish; one deferred unit reads. Events
/// published between two deferred runs are folded into the latest one.
#[derive(Debug)]
pub struct HandoffSlot {
    slot: AtomicUsize,
    publishes: AtomicU64,
}

impl HandoffSlot {
    pub const fn new() -> Self {
        Self {
            slot: AtomicUsize::new(EMPTY),
            publishes: AtomicU64::new(0),
        }
    }

    /// Overwrites the slot and returns what it held before.
    pub fn publish(&self, source: SourceId) -> Option<SourceId> {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        decode(self.slot.swap(source.index(), Ordering::AcqRel))
    }

    /// Reads the current source without consuming it.
    pub fn current(&self) -> Option<SourceId> {
        decode(self.slot.load(Ordering::Acquire))
    }

    /// Returns the number of publishes since the previous call and resets it.
    pub fn take_publish_count(&self) -> u64 {
        self.publishes.swap(0, Ordering::AcqRel)
    }
}

impl Default for HandoffSlot {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(raw: usize) -> Option<SourceId> {
    (raw != EMPTY).then_some(SourceId(raw))
}
