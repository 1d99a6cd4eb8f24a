//! Interrupt-context capture routine.
//!
//! # Invariants
//! - Bounded work only: one atomic swap, one compare-and-set, one enqueue,
//!   one static notification.
//! - Every dispatch is reported as handled; the routine is only ever bound
//!   to triggers of known sources.

use crate::irq::deferred::DeferredUnit;
use crate::irq::handoff::HandoffSlot;
use crate::model::source::SourceId;
use crate::platform::{DeferredScheduler, IrqHandler, IrqReturn, Reporter};
use std::sync::Arc;

/// Static notification emitted on every top-half pass.
pub const TOP_HALF_NOTE: &str = "top half: capture_isr";

/// Top half shared by every registered source.
pub struct CaptureRoutine {
    handoff: Arc<HandoffSlot>,
    unit: Arc<DeferredUnit>,
    scheduler: Arc<dyn DeferredScheduler>,
    reporter: Arc<dyn Reporter>,
}

impl CaptureRoutine {
    pub fn new(
        handoff: Arc<HandoffSlot>,
        unit: Arc<DeferredUnit>,
        scheduler: Arc<dyn DeferredScheduler>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            handoff,
            unit,
            scheduler,
            reporter,
        }
    }
}

impl IrqHandler for CaptureRoutine {
    fn handle(&self, source: SourceId) -> IrqReturn {
        self.handoff.publish(source);
        self.scheduler.request_run(&self.unit);
        self.reporter.emit(TOP_HALF_NOTE);
        IrqReturn::Handled
    }
}
