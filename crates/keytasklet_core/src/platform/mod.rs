//! Platform collaborator contracts.
//!
//! # Responsibility
//! - Describe the line, interrupt, deferred-work and reporting services the
//!   button module is wired against.
//! - Keep hardware specifics behind object-safe traits.
//!
//! # Invariants
//! - `IrqHandler::handle` runs in interrupt context: bounded work, no sleeping
//!   and no waiting on a deferred run. Its only output is a best-effort,
//!   non-blocking `Reporter::emit` notification.
//! - `DeferredScheduler::request_run` is the only way a unit becomes
//!   scheduled; repeated requests while scheduled coalesce.

use crate::error::{IrqError, LineError};
use crate::irq::deferred::DeferredUnit;
use crate::model::source::{LineId, LineLevel, SourceId, TriggerId};
use serde::Serialize;
use std::sync::Arc;

pub mod sim;

/// Proof of a claimed line, returned by `LineController::acquire`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineHandle {
    line: LineId,
}

impl LineHandle {
    pub fn new(line: LineId) -> Self {
        Self { line }
    }

    pub fn line(self) -> LineId {
        self.line
    }
}

/// Line multiplexing and state service.
pub trait LineController: Send + Sync {
    fn acquire(&self, line: LineId, owner: &str) -> Result<LineHandle, LineError>;
    fn release(&self, handle: LineHandle);
    /// Synchronous, non-blocking level query.
    fn read_level(&self, handle: LineHandle) -> Result<LineLevel, LineError>;
}

/// Which edges raise the interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    RisingEdge,
    FallingEdge,
    BothEdges,
}

/// Outcome reported back to the interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    Handled,
    NotHandled,
}

/// Routine invoked in interrupt context with the registered per-call context.
pub trait IrqHandler: Send + Sync {
    fn handle(&self, source: SourceId) -> IrqReturn;
}

/// Interrupt dispatch service.
pub trait InterruptController: Send + Sync {
    fn register_handler(
        &self,
        trigger: TriggerId,
        handler: Arc<dyn IrqHandler>,
        source: SourceId,
        policy: TriggerPolicy,
    ) -> Result<(), IrqError>;

    /// Removes the binding; no further dispatches for `source` after return.
    fn unregister_handler(&self, trigger: TriggerId, source: SourceId);
}

/// Deferred-work service.
pub trait DeferredScheduler: Send + Sync {
    /// Queues a unit that has just moved from idle to scheduled.
    fn enqueue(&self, unit: Arc<DeferredUnit>);

    /// Requests one run of `unit`.
    ///
    /// Returns `false` when the unit was already scheduled; the outstanding
    /// run will observe whatever this request wanted to hand off.
    fn request_run(&self, unit: &Arc<DeferredUnit>) -> bool {
        if !unit.mark_scheduled() {
            return false;
        }
        self.enqueue(Arc::clone(unit));
        true
    }
}

/// Best-effort, non-blocking output sink.
///
/// A reporter shared with a top half is called from interrupt context, so
/// `emit` must return promptly and never wait on deferred work. The in-process
/// reporters here take a short uncontended lock; a hardware port binds a
/// lock-free sink instead.
pub trait Reporter: Send + Sync {
    fn emit(&self, message: &str);
}

/// Reporter that forwards every message to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn emit(&self, message: &str) {
        log::info!(target: "keytasklet::report", "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::{DeferredScheduler, LogReporter, Reporter};
    use crate::irq::deferred::{DeferredUnit, UnitState};
    use crate::platform::sim::ManualScheduler;
    use std::sync::Arc;

    #[test]
    fn log_reporter_is_usable_without_a_logger() {
        LogReporter.emit("deferred: aux=0x5555 source=KEY_UP state=pressed code=103 folded=1");
    }

    #[test]
    fn request_run_enqueues_only_on_first_request() {
        let scheduler = ManualScheduler::new();
        let unit = Arc::new(DeferredUnit::new("noop", || {}));
        assert!(scheduler.request_run(&unit));
        assert!(!scheduler.request_run(&unit));
        assert_eq!(scheduler.pending_len(), 1);
        assert_eq!(unit.state(), UnitState::Scheduled);
    }
}
