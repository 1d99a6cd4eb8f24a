//! Deferred button inspection body.
//!
//! # Responsibility
//! - Resolve the source currently named by the handoff slot.
//! - Query the live line level and report the button state.
//!
//! # Invariants
//! - Reports whatever the slot holds at run time; sources that fired and
//!   were overwritten before the run are not reported individually.
//! - A failed level query is reported and logged; the run still completes.

use crate::error::{ButtonError, LineError};
use crate::irq::deferred::DeferredWork;
use crate::irq::handoff::HandoffSlot;
use crate::lifecycle::HeldLines;
use crate::model::source::{ButtonState, KeyCode};
use crate::platform::{LineController, Reporter};
use crate::registry::SourceRegistry;
use log::{debug, warn};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

/// One deferred observation of a button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonReport {
    pub source: &'static str,
    pub code: KeyCode,
    pub state: ButtonState,
    pub aux: u32,
    /// Transitions published since the previous run, this one included.
    pub folded_events: u64,
}

impl Display for ButtonReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "deferred: aux={:#x} source={} state={} code={} folded={}",
            self.aux, self.source, self.state, self.code, self.folded_events
        )
    }
}

/// Body bound to the module's deferred unit.
pub struct ButtonInspector {
    registry: Arc<SourceRegistry>,
    handoff: Arc<HandoffSlot>,
    held: Arc<HeldLines>,
    lines: Arc<dyn LineController>,
    reporter: Arc<dyn Reporter>,
    aux: u32,
    last_report: Mutex<Option<ButtonReport>>,
}

impl ButtonInspector {
    pub fn new(
        registry: Arc<SourceRegistry>,
        handoff: Arc<HandoffSlot>,
        held: Arc<HeldLines>,
        lines: Arc<dyn LineController>,
        reporter: Arc<dyn Reporter>,
        aux: u32,
    ) -> Self {
        Self {
            registry,
            handoff,
            held,
            lines,
            reporter,
            aux,
            last_report: Mutex::new(None),
        }
    }

    /// Most recent successful report, if any.
    pub fn last_report(&self) -> Option<ButtonReport> {
        self.last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn inspect(&self) -> Result<Option<ButtonReport>, ButtonError> {
        let folded_events = self.handoff.take_publish_count();
        let Some(id) = self.handoff.current() else {
            return Ok(None);
        };
        let Some(source) = self.registry.get(id) else {
            warn!("event=deferred_run module=inspect status=error reason=unknown_source id={id}");
            return Ok(None);
        };

        let level = match self.held.get(id) {
            Some(handle) => self.lines.read_level(handle),
            None => Err(LineError::NotAcquired(source.line)),
        }
        .map_err(|err| ButtonError::StateQueryFailed {
            name: source.name,
            err,
        })?;

        Ok(Some(ButtonReport {
            source: source.name,
            code: source.code,
            state: ButtonState::from_level(level),
            aux: self.aux,
            folded_events,
        }))
    }
}

impl DeferredWork for ButtonInspector {
    fn run(&self) {
        match self.inspect() {
            Ok(Some(report)) => {
                debug!(
                    "event=deferred_run module=inspect status=ok source={} state={} folded={}",
                    report.source, report.state, report.folded_events
                );
                self.reporter.emit(&report.to_string());
                *self
                    .last_report
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(report);
            }
            Ok(None) => {
                debug!("event=deferred_run module=inspect status=ok reason=slot_empty");
            }
            Err(err) => {
                warn!(
                    "event=deferred_run module=inspect status=error code={} source={} detail={}",
                    err.code(),
                    err.source_name(),
                    err
                );
                self.reporter.emit(&err.to_string());
            }
        }
    }
}
