//! Deferred processing unit.
//!
//! # Responsibility
//! - Bind one processing body to a two-flag `scheduled`/`running` state.
//! - Coalesce repeated run requests into one outstanding run.
//!
//! # Invariants
//! - `mark_scheduled` is a compare-and-set: at most one outstanding run.
//! - The body never runs concurrently with itself.
//! - `scheduled` is cleared before the body executes, so a request landing
//!   during the body yields exactly one more run.

use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Body executed by a deferred unit.
pub trait DeferredWork: Send + Sync {
    fn run(&self);
}

impl<F> DeferredWork for F
where
    F: Fn() + Send + Sync,
{
    fn run(&self) {
        self()
    }
}

/// Observable state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    Idle,
    Scheduled,
    Running,
}

/// Result of one `DeferredUnit::run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Another context is executing the body; the request stays outstanding.
    Busy,
    /// The unit was disabled; the body was skipped.
    Disabled,
}

/// Counter snapshot for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitStats {
    pub state: UnitState,
    pub accepted_requests: u64,
    pub coalesced_requests: u64,
    pub completed_runs: u64,
}

/// A single unit of delayed work, shared by every event source.
pub struct DeferredUnit {
    name: &'static str,
    work: Box<dyn DeferredWork>,
    scheduled: AtomicBool,
    running: AtomicBool,
    disabled: AtomicBool,
    accepted: AtomicU64,
    coalesced: AtomicU64,
    completed: AtomicU64,
}

impl DeferredUnit {
    pub fn new(name: &'static str, work: impl DeferredWork + 'static) -> Self {
        Self {
            name,
            work: Box::new(work),
            scheduled: AtomicBool::new(false),
            running: AtomicBool::new(false),
            disabled: AtomicBool::new(false),
            accepted: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Moves `idle -> scheduled`. Returns `false` if already scheduled or
    /// disabled. Safe to call from interrupt context.
    pub fn mark_scheduled(&self) -> bool {
        if self.disabled.load(Ordering::Acquire) {
            return false;
        }
        match self
            .scheduled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Executes the body once, as the deferred scheduler does.
    pub fn run(&self) -> RunOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return RunOutcome::Busy;
        }

        let outcome = if self.disabled.load(Ordering::Acquire) {
            self.scheduled.store(false, Ordering::Release);
            RunOutcome::Disabled
        } else {
            self.scheduled.store(false, Ordering::Release);
            self.work.run();
            self.completed.fetch_add(1, Ordering::Relaxed);
            RunOutcome::Completed
        };

        self.running.store(false, Ordering::Release);
        outcome
    }

    /// Stops future bodies from executing.
    ///
    /// An outstanding request stays queued with `scheduled` set; its run
    /// clears the flag. Requests made after a re-`enable()` coalesce into
    /// that queued entry instead of queuing a second one.
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Release);
    }

    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Release);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn state(&self) -> UnitState {
        if self.running.load(Ordering::Acquire) {
            UnitState::Running
        } else if self.scheduled.load(Ordering::Acquire) {
            UnitState::Scheduled
        } else {
            UnitState::Idle
        }
    }

    pub fn stats(&self) -> UnitStats {
        UnitStats {
            state: self.state(),
            accepted_requests: self.accepted.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced.load(Ordering::Relaxed),
            completed_runs: self.completed.load(Ordering::Relaxed),
        }
    }
}

impl Debug for DeferredUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredUnit")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}
