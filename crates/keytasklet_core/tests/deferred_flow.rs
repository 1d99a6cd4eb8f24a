use keytasklet_core::platform::sim::{ManualScheduler, RecordingReporter, SimInterrupts, SimLines};
use keytasklet_core::{
    ButtonModule, ButtonState, DeferredScheduler, InterruptController, IrqError, IrqHandler,
    IrqReturn, KeyCode, LineId, LineLevel, Platform, SourceId, TriggerId, TriggerPolicy,
    UnitState, TOP_HALF_NOTE,
};
use std::sync::Arc;

const UP: TriggerId = TriggerId(0);
const DOWN: TriggerId = TriggerId(1);

struct Rig {
    lines: Arc<SimLines>,
    irqs: Arc<SimInterrupts>,
    scheduler: Arc<ManualScheduler>,
    reporter: Arc<RecordingReporter>,
}

impl Rig {
    fn new() -> Self {
        Self {
            lines: Arc::new(SimLines::with_lines(2)),
            irqs: Arc::new(SimInterrupts::new()),
            scheduler: Arc::new(ManualScheduler::new()),
            reporter: Arc::new(RecordingReporter::new()),
        }
    }

    fn platform(&self) -> Platform {
        Platform {
            lines: self.lines.clone(),
            interrupts: self.irqs.clone(),
            scheduler: self.scheduler.clone(),
            reporter: self.reporter.clone(),
        }
    }

    fn started(&self) -> ButtonModule {
        let mut module = ButtonModule::with_defaults(self.platform());
        module.start().expect("start");
        module
    }
}

#[test]
fn single_transition_yields_one_report_with_live_state() {
    let rig = Rig::new();
    let module = rig.started();

    rig.lines.set_level(LineId(0), LineLevel::Low);
    assert_eq!(rig.irqs.fire(UP), Some(IrqReturn::Handled));
    assert_eq!(module.deferred_unit().state(), UnitState::Scheduled);
    assert!(rig.reporter.reports().is_empty());

    assert_eq!(rig.scheduler.run_pending(), 1);
    assert_eq!(
        rig.reporter.reports(),
        vec!["deferred: aux=0x5555 source=KEY_UP state=pressed code=103 folded=1"]
    );
    assert_eq!(module.deferred_unit().state(), UnitState::Idle);

    let report = module.last_report().expect("report kept");
    assert_eq!(report.code, KeyCode::UP);
    assert_eq!(report.state, ButtonState::Pressed);
}

#[test]
fn state_is_read_at_run_time_not_at_interrupt_time() {
    let rig = Rig::new();
    let module = rig.started();

    rig.lines.set_level(LineId(1), LineLevel::Low);
    rig.irqs.fire(DOWN);
    rig.lines.set_level(LineId(1), LineLevel::High);
    rig.scheduler.run_pending();

    let report = module.last_report().expect("report");
    assert_eq!(report.source, "KEY_DOWN");
    assert_eq!(report.state, ButtonState::Released);
}

#[test]
fn rapid_transitions_across_sources_collapse_into_last_source() {
    let rig = Rig::new();
    let module = rig.started();

    rig.irqs.fire(UP);
    rig.irqs.fire(UP);
    rig.irqs.fire(DOWN);
    assert_eq!(rig.scheduler.pending_len(), 1);

    assert_eq!(rig.scheduler.run_pending(), 1);
    let reports = rig.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].contains("source=KEY_DOWN"));
    assert!(reports[0].contains("folded=3"));
    assert!(!reports[0].contains("KEY_UP"));

    let stats = module.deferred_unit().stats();
    assert_eq!(stats.accepted_requests, 1);
    assert_eq!(stats.coalesced_requests, 2);
    assert_eq!(stats.completed_runs, 1);
    assert_eq!(
        rig.reporter
            .messages()
            .iter()
            .filter(|message| message.as_str() == TOP_HALF_NOTE)
            .count(),
        3
    );
}

#[test]
fn requests_while_scheduled_never_exceed_one_extra_run() {
    let rig = Rig::new();
    let module = rig.started();
    let unit = Arc::clone(module.deferred_unit());

    assert!(rig.scheduler.request_run(&unit));
    let repeats = 5;
    for _ in 0..repeats {
        assert!(!rig.scheduler.request_run(&unit));
    }

    let mut executions = 0;
    for _ in 0..3 {
        executions += rig.scheduler.run_pending();
    }
    assert!(executions <= repeats + 1);
    assert_eq!(executions, 1);
}

#[test]
fn failed_level_query_is_reported_and_unit_returns_idle() {
    let rig = Rig::new();
    let module = rig.started();
    rig.lines.fail_reads(LineId(0), "bank powered down");

    rig.irqs.fire(UP);
    assert_eq!(rig.scheduler.run_pending(), 1);

    assert!(rig.reporter.reports().is_empty());
    assert!(rig
        .reporter
        .messages()
        .iter()
        .any(|message| message.starts_with("KEY_UP: line state query failed")));
    assert!(module.last_report().is_none());
    assert_eq!(module.deferred_unit().state(), UnitState::Idle);

    rig.irqs.fire(DOWN);
    rig.scheduler.run_pending();
    assert_eq!(rig.reporter.reports().len(), 1);
}

#[test]
fn source_with_failed_acquire_does_not_disturb_working_source() {
    let rig = Rig::new();
    rig.lines.claim_externally(LineId(1), "other_driver");
    let module = rig.started();

    assert_eq!(rig.irqs.fire(DOWN), None);
    rig.lines.set_level(LineId(0), LineLevel::Low);
    assert_eq!(rig.irqs.fire(UP), Some(IrqReturn::Handled));
    rig.scheduler.run_pending();

    let report = module.last_report().expect("KEY_UP still reports");
    assert_eq!(report.source, "KEY_UP");
    assert_eq!(report.state, ButtonState::Pressed);
}

#[test]
fn run_outstanding_at_stop_is_skipped() {
    let rig = Rig::new();
    let mut module = rig.started();

    rig.irqs.fire(UP);
    module.stop();
    assert_eq!(rig.scheduler.run_pending(), 0);
    assert!(rig.reporter.reports().is_empty());
    assert_eq!(module.deferred_unit().stats().completed_runs, 0);
}

#[test]
fn request_left_queued_across_restart_runs_once() {
    let rig = Rig::new();
    let mut module = rig.started();

    rig.irqs.fire(UP);
    module.stop();
    module.start().expect("restart");
    rig.lines.set_level(LineId(1), LineLevel::Low);
    rig.irqs.fire(DOWN);
    assert_eq!(rig.scheduler.pending_len(), 1);

    assert_eq!(rig.scheduler.run_pending(), 1);
    let reports = rig.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].contains("source=KEY_DOWN state=pressed"));
    assert_eq!(rig.scheduler.run_pending(), 0);

    let stats = module.deferred_unit().stats();
    assert_eq!(stats.accepted_requests, 1);
    assert_eq!(stats.completed_runs, 1);
    assert_eq!(stats.state, UnitState::Idle);
}

/// Interrupt controller whose line is already bouncing when the handler is bound.
struct FiresOnRegister {
    inner: SimInterrupts,
}

impl InterruptController for FiresOnRegister {
    fn register_handler(
        &self,
        trigger: TriggerId,
        handler: Arc<dyn IrqHandler>,
        source: SourceId,
        policy: TriggerPolicy,
    ) -> Result<(), IrqError> {
        self.inner
            .register_handler(trigger, Arc::clone(&handler), source, policy)?;
        handler.handle(source);
        Ok(())
    }

    fn unregister_handler(&self, trigger: TriggerId, source: SourceId) {
        self.inner.unregister_handler(trigger, source);
    }
}

#[test]
fn top_half_may_fire_before_start_returns() {
    let rig = Rig::new();
    rig.lines.set_level(LineId(0), LineLevel::Low);
    let mut platform = rig.platform();
    platform.interrupts = Arc::new(FiresOnRegister {
        inner: SimInterrupts::new(),
    });
    let mut module = ButtonModule::with_defaults(platform);

    let summary = module.start().expect("start");
    assert!(summary.is_complete());
    assert_eq!(rig.scheduler.pending_len(), 1);

    rig.scheduler.run_pending();
    let report = module.last_report().expect("report");
    assert_eq!(report.source, "KEY_DOWN");
    assert_eq!(report.folded_events, 2);
}
