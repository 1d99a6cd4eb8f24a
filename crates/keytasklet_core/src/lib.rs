//! Button edge capture with a top-half / deferred-half split.
//!
//! Transitions are captured in interrupt context by a bounded top half that
//! records the firing source in a single handoff slot and requests one shared
//! deferred unit. The deferred unit later reads the slot, queries the live
//! line level and reports the button state.

pub mod config;
pub mod error;
pub mod irq;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod platform;
pub mod registry;

pub use config::{ModuleConfig, DEFAULT_AUX_PAYLOAD, DEFAULT_OWNER_LABEL};
pub use error::{ButtonError, IrqError, LifecycleError, LineError};
pub use irq::deferred::{DeferredUnit, DeferredWork, RunOutcome, UnitState, UnitStats};
pub use irq::handoff::HandoffSlot;
pub use irq::inspect::{ButtonInspector, ButtonReport};
pub use irq::top_half::{CaptureRoutine, TOP_HALF_NOTE};
pub use lifecycle::{ButtonModule, ModuleStatus, Platform, SourceStatus, StartSummary};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::source::{
    ButtonState, EventSource, KeyCode, LineId, LineLevel, SourceId, TriggerId,
};
pub use platform::{
    DeferredScheduler, InterruptController, IrqHandler, IrqReturn, LineController, LineHandle,
    LogReporter, Reporter, TriggerPolicy,
};
pub use registry::{SourceRegistry, DEFAULT_SOURCES};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
