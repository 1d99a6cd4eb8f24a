//! In-process simulated platform.
//!
//! # Responsibility
//! - Provide deterministic line, interrupt, scheduler and reporter services
//!   for tests and the smoke CLI.
//! - Allow fault injection for acquisition, registration and level reads.
//!
//! # Invariants
//! - `SimInterrupts::fire` dispatches outside the handler table lock, so a
//!   handler may run concurrently with (un)registration.
//! - `ManualScheduler` only runs units when `run_pending` is called.

use crate::error::{IrqError, LineError};
use crate::irq::deferred::{DeferredUnit, RunOutcome};
use crate::model::source::{LineId, LineLevel, SourceId, TriggerId};
use crate::platform::{
    DeferredScheduler, InterruptController, IrqHandler, IrqReturn, LineController, LineHandle,
    Reporter, TriggerPolicy,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct SimLine {
    level: LineLevel,
    owner: Option<String>,
    read_fault: Option<String>,
}

/// Simulated input lines. Unclaimed lines idle high (released).
#[derive(Debug, Default)]
pub struct SimLines {
    lines: Mutex<BTreeMap<LineId, SimLine>>,
}

impl SimLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates lines `0..count`, all high.
    pub fn with_lines(count: u32) -> Self {
        let lines = Self::new();
        for id in 0..count {
            lines.add_line(LineId(id));
        }
        lines
    }

    pub fn add_line(&self, line: LineId) {
        lock(&self.lines).insert(
            line,
            SimLine {
                level: LineLevel::High,
                owner: None,
                read_fault: None,
            },
        );
    }

    pub fn set_level(&self, line: LineId, level: LineLevel) {
        if let Some(entry) = lock(&self.lines).get_mut(&line) {
            entry.level = level;
        }
    }

    /// Claims `line` for someone else so the module's acquire fails.
    pub fn claim_externally(&self, line: LineId, owner: &str) {
        if let Some(entry) = lock(&self.lines).get_mut(&line) {
            entry.owner = Some(owner.to_string());
        }
    }

    /// Makes every subsequent level read of `line` fail.
    pub fn fail_reads(&self, line: LineId, message: &str) {
        if let Some(entry) = lock(&self.lines).get_mut(&line) {
            entry.read_fault = Some(message.to_string());
        }
    }

    pub fn owner(&self, line: LineId) -> Option<String> {
        lock(&self.lines)
            .get(&line)
            .and_then(|entry| entry.owner.clone())
    }

    /// Number of lines claimed by `owner`.
    pub fn claimed_by(&self, owner: &str) -> usize {
        lock(&self.lines)
            .values()
            .filter(|entry| entry.owner.as_deref() == Some(owner))
            .count()
    }
}

impl LineController for SimLines {
    fn acquire(&self, line: LineId, owner: &str) -> Result<LineHandle, LineError> {
        let mut lines = lock(&self.lines);
        let entry = lines.get_mut(&line).ok_or(LineError::InvalidLine(line))?;
        if entry.owner.is_some() {
            return Err(LineError::AlreadyClaimed(line));
        }
        entry.owner = Some(owner.to_string());
        Ok(LineHandle::new(line))
    }

    fn release(&self, handle: LineHandle) {
        if let Some(entry) = lock(&self.lines).get_mut(&handle.line()) {
            entry.owner = None;
        }
    }

    fn read_level(&self, handle: LineHandle) -> Result<LineLevel, LineError> {
        let lines = lock(&self.lines);
        let line = handle.line();
        let entry = lines.get(&line).ok_or(LineError::InvalidLine(line))?;
        if entry.owner.is_none() {
            return Err(LineError::NotAcquired(line));
        }
        match &entry.read_fault {
            Some(message) => Err(LineError::Hardware {
                line,
                message: message.clone(),
            }),
            None => Ok(entry.level),
        }
    }
}

#[derive(Clone)]
struct Binding {
    handler: Arc<dyn IrqHandler>,
    source: SourceId,
    policy: TriggerPolicy,
}

/// Simulated interrupt controller with one handler per trigger.
#[derive(Default)]
pub struct SimInterrupts {
    bindings: Mutex<BTreeMap<TriggerId, Binding>>,
    refused: Mutex<BTreeSet<TriggerId>>,
}

impl SimInterrupts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next registrations on `trigger` fail.
    pub fn refuse(&self, trigger: TriggerId) {
        lock(&self.refused).insert(trigger);
    }

    pub fn registered_count(&self) -> usize {
        lock(&self.bindings).len()
    }

    pub fn is_registered(&self, trigger: TriggerId) -> bool {
        lock(&self.bindings).contains_key(&trigger)
    }

    pub fn policy(&self, trigger: TriggerId) -> Option<TriggerPolicy> {
        lock(&self.bindings).get(&trigger).map(|binding| binding.policy)
    }

    /// Simulates one transition on `trigger`.
    ///
    /// Returns `None` when no handler is bound.
    pub fn fire(&self, trigger: TriggerId) -> Option<IrqReturn> {
        let binding = lock(&self.bindings).get(&trigger).cloned()?;
        Some(binding.handler.handle(binding.source))
    }
}

impl InterruptController for SimInterrupts {
    fn register_handler(
        &self,
        trigger: TriggerId,
        handler: Arc<dyn IrqHandler>,
        source: SourceId,
        policy: TriggerPolicy,
    ) -> Result<(), IrqError> {
        if lock(&self.refused).contains(&trigger) {
            return Err(IrqError::InvalidTrigger(trigger));
        }
        let mut bindings = lock(&self.bindings);
        if bindings.contains_key(&trigger) {
            return Err(IrqError::TriggerBusy(trigger));
        }
        bindings.insert(
            trigger,
            Binding {
                handler,
                source,
                policy,
            },
        );
        Ok(())
    }

    fn unregister_handler(&self, trigger: TriggerId, source: SourceId) {
        let mut bindings = lock(&self.bindings);
        if bindings
            .get(&trigger)
            .is_some_and(|binding| binding.source == source)
        {
            bindings.remove(&trigger);
        }
    }
}

/// FIFO deferred scheduler drained explicitly by the caller.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<Arc<DeferredUnit>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Runs the units queued at call time, in request order.
    ///
    /// Units requested while draining wait for the next call. Returns the
    /// number of bodies that completed.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<_> = lock(&self.queue).drain(..).collect();
        let mut completed = 0;
        for unit in batch {
            match unit.run() {
                RunOutcome::Completed => completed += 1,
                RunOutcome::Busy => lock(&self.queue).push_back(unit),
                RunOutcome::Disabled => {}
            }
        }
        completed
    }
}

impl DeferredScheduler for ManualScheduler {
    fn enqueue(&self, unit: Arc<DeferredUnit>) {
        lock(&self.queue).push_back(unit);
    }
}

/// Reporter that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }

    /// Messages produced by deferred runs, top-half notes excluded.
    pub fn reports(&self) -> Vec<String> {
        lock(&self.messages)
            .iter()
            .filter(|message| message.starts_with("deferred:"))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.messages).clear();
    }
}

impl Reporter for RecordingReporter {
    fn emit(&self, message: &str) {
        lock(&self.messages).push(message.to_string());
    }
}
