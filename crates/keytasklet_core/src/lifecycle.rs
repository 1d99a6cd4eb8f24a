//! Button module lifecycle.
//!
//! # Responsibility
//! - Own every line handle, the shared deferred unit and the handoff slot.
//! - Wire each registry source to the shared top half on `start()` and
//!   unwire it on `stop()`.
//!
//! # Invariants
//! - The deferred unit exists before any handler is registered.
//! - A line handle is published in `HeldLines` before its handler is bound,
//!   so an interrupt firing mid-startup can already be inspected.
//! - Per-source failures are logged and reported, never fatal; remaining
//!   sources are still wired.
//! - `stop()` releases only what `start()` actually acquired and is a no-op
//!   when called again.

use crate::config::ModuleConfig;
use crate::error::{ButtonError, LifecycleError};
use crate::irq::deferred::{DeferredUnit, DeferredWork, UnitStats};
use crate::irq::handoff::HandoffSlot;
use crate::irq::inspect::{ButtonInspector, ButtonReport};
use crate::irq::top_half::CaptureRoutine;
use crate::model::source::{EventSource, LineId, SourceId, TriggerId};
use crate::platform::{
    DeferredScheduler, InterruptController, IrqHandler, LineController, LineHandle, Reporter,
};
use crate::registry::SourceRegistry;
use log::{info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

const DEFERRED_UNIT_NAME: &str = "button_inspect";

/// Line handles currently owned by the module, indexed by `SourceId`.
#[derive(Debug)]
pub struct HeldLines {
    handles: Mutex<Vec<Option<LineHandle>>>,
}

impl HeldLines {
    fn with_len(len: usize) -> Self {
        Self {
            handles: Mutex::new(vec![None; len]),
        }
    }

    pub fn get(&self, id: SourceId) -> Option<LineHandle> {
        self.lock().get(id.index()).copied().flatten()
    }

    pub fn held_count(&self) -> usize {
        self.lock().iter().filter(|slot| slot.is_some()).count()
    }

    fn set(&self, id: SourceId, handle: LineHandle) {
        if let Some(slot) = self.lock().get_mut(id.index()) {
            *slot = Some(handle);
        }
    }

    fn take(&self, id: SourceId) -> Option<LineHandle> {
        self.lock().get_mut(id.index()).and_then(Option::take)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Option<LineHandle>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collaborators the module is wired against.
#[derive(Clone)]
pub struct Platform {
    pub lines: Arc<dyn LineController>,
    pub interrupts: Arc<dyn InterruptController>,
    pub scheduler: Arc<dyn DeferredScheduler>,
    pub reporter: Arc<dyn Reporter>,
}

/// Result of one `start()` pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StartSummary {
    pub wired: Vec<&'static str>,
    pub failures: Vec<ButtonError>,
}

impl StartSummary {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Per-source wiring snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub name: &'static str,
    pub line: LineId,
    pub trigger: TriggerId,
    pub line_held: bool,
    pub handler_registered: bool,
    pub last_error: Option<String>,
}

/// Whole-module snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    pub started: bool,
    pub config: ModuleConfig,
    pub sources: Vec<SourceStatus>,
    pub unit: UnitStats,
    pub last_report: Option<ButtonReport>,
}

#[derive(Debug, Default, Clone)]
struct Wiring {
    registered: bool,
    last_error: Option<ButtonError>,
}

/// Owner of the button sources, the shared top half and the deferred unit.
pub struct ButtonModule {
    config: ModuleConfig,
    registry: Arc<SourceRegistry>,
    handoff: Arc<HandoffSlot>,
    held: Arc<HeldLines>,
    inspector: Arc<ButtonInspector>,
    unit: Arc<DeferredUnit>,
    routine: Arc<CaptureRoutine>,
    platform: Platform,
    wiring: Vec<Wiring>,
    started: bool,
}

impl ButtonModule {
    /// Builds the handoff slot, the deferred unit and the top half.
    ///
    /// Nothing is acquired or registered until `start()`.
    pub fn new(config: ModuleConfig, registry: SourceRegistry, platform: Platform) -> Self {
        let registry = Arc::new(registry);
        let handoff = Arc::new(HandoffSlot::new());
        let held = Arc::new(HeldLines::with_len(registry.len()));
        let inspector = Arc::new(ButtonInspector::new(
            Arc::clone(&registry),
            Arc::clone(&handoff),
            Arc::clone(&held),
            Arc::clone(&platform.lines),
            Arc::clone(&platform.reporter),
            config.aux_payload,
        ));
        let body = Arc::clone(&inspector);
        let unit = Arc::new(DeferredUnit::new(DEFERRED_UNIT_NAME, move || {
            DeferredWork::run(body.as_ref())
        }));
        let routine = Arc::new(CaptureRoutine::new(
            Arc::clone(&handoff),
            Arc::clone(&unit),
            Arc::clone(&platform.scheduler),
            Arc::clone(&platform.reporter),
        ));

        Self {
            wiring: vec![Wiring::default(); registry.len()],
            config,
            registry,
            handoff,
            held,
            inspector,
            unit,
            routine,
            platform,
            started: false,
        }
    }

    /// Module over the compiled-in source table and default config.
    pub fn with_defaults(platform: Platform) -> Self {
        Self::new(ModuleConfig::default(), SourceRegistry::builtin(), platform)
    }

    /// Acquires every line and binds the top half to every trigger, in
    /// registry order.
    ///
    /// Sources become live one by one; the top half may run before this
    /// returns.
    ///
    /// # Errors
    /// - `LifecycleError::AlreadyStarted` when called twice without `stop()`.
    ///   Per-source failures are returned in the summary, not as errors.
    pub fn start(&mut self) -> Result<StartSummary, LifecycleError> {
        if self.started {
            return Err(LifecycleError::AlreadyStarted);
        }
        self.started = true;
        self.unit.enable();
        info!(
            "event=module_start module=lifecycle status=begin sources={}",
            self.registry.len()
        );

        let results: Vec<_> = self
            .registry
            .iter()
            .map(|(id, source)| (id, source.name, self.wire(id, source)))
            .collect();

        let mut summary = StartSummary::default();
        for (id, name, result) in results {
            let wiring = &mut self.wiring[id.index()];
            match result {
                Ok(()) => {
                    wiring.registered = true;
                    wiring.last_error = None;
                    summary.wired.push(name);
                }
                Err(err) => {
                    warn!(
                        "event=source_wire module=lifecycle status=error code={} source={} detail={}",
                        err.code(),
                        name,
                        err
                    );
                    self.platform.reporter.emit(&err.to_string());
                    wiring.last_error = Some(err.clone());
                    summary.failures.push(err);
                }
            }
        }

        info!(
            "event=module_start module=lifecycle status={} wired={} failed={}",
            if summary.is_complete() { "ok" } else { "degraded" },
            summary.wired.len(),
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Unbinds every handler and releases every held line, last source first.
    ///
    /// Returns how many lines were released. Calling it again, or before
    /// `start()`, releases nothing.
    pub fn stop(&mut self) -> usize {
        self.unit.disable();

        let mut released = 0;
        for (id, source) in self.registry.iter().rev() {
            let wiring = &mut self.wiring[id.index()];
            if wiring.registered {
                self.platform
                    .interrupts
                    .unregister_handler(source.trigger, id);
                wiring.registered = false;
            }
            if let Some(handle) = self.held.take(id) {
                self.platform.lines.release(handle);
                released += 1;
            }
        }

        if self.started {
            info!("event=module_stop module=lifecycle status=ok released={released}");
        }
        self.started = false;
        released
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn handoff(&self) -> &Arc<HandoffSlot> {
        &self.handoff
    }

    pub fn deferred_unit(&self) -> &Arc<DeferredUnit> {
        &self.unit
    }

    /// Top half as registered with the interrupt controller.
    pub fn capture_routine(&self) -> Arc<dyn IrqHandler> {
        self.routine.clone()
    }

    pub fn held_lines(&self) -> usize {
        self.held.held_count()
    }

    pub fn last_report(&self) -> Option<ButtonReport> {
        self.inspector.last_report()
    }

    pub fn status(&self) -> ModuleStatus {
        let sources = self
            .registry
            .iter()
            .map(|(id, source)| {
                let wiring = &self.wiring[id.index()];
                SourceStatus {
                    name: source.name,
                    line: source.line,
                    trigger: source.trigger,
                    line_held: self.held.get(id).is_some(),
                    handler_registered: wiring.registered,
                    last_error: wiring.last_error.as_ref().map(ToString::to_string),
                }
            })
            .collect();

        ModuleStatus {
            started: self.started,
            config: self.config.clone(),
            sources,
            unit: self.unit.stats(),
            last_report: self.last_report(),
        }
    }

    fn wire(&self, id: SourceId, source: &EventSource) -> Result<(), ButtonError> {
        let handle = self
            .platform
            .lines
            .acquire(source.line, self.config.owner_label)
            .map_err(|err| ButtonError::ResourceUnavailable {
                name: source.name,
                err,
            })?;
        self.held.set(id, handle);

        let handler: Arc<dyn IrqHandler> = self.routine.clone();
        if let Err(err) = self.platform.interrupts.register_handler(
            source.trigger,
            handler,
            id,
            self.config.trigger_policy,
        ) {
            if let Some(handle) = self.held.take(id) {
                self.platform.lines.release(handle);
            }
            return Err(ButtonError::RegistrationFailed {
                name: source.name,
                err,
            });
        }

        info!(
            "event=source_wire module=lifecycle status=ok source={} line={} trigger={}",
            source.name, source.line, source.trigger
        );
        Ok(())
    }
}

impl Drop for ButtonModule {
    fn drop(&mut self) {
        if self.started {
            self.stop();
        }
    }
}
