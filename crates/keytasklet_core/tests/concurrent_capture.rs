use keytasklet_core::platform::sim::{ManualScheduler, RecordingReporter, SimInterrupts, SimLines};
use keytasklet_core::{ButtonModule, Platform, TriggerId, UnitState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_top_halves_coalesce_without_losing_requests() {
    let lines = Arc::new(SimLines::with_lines(2));
    let irqs = Arc::new(SimInterrupts::new());
    let scheduler = Arc::new(ManualScheduler::new());
    let reporter = Arc::new(RecordingReporter::new());
    let mut module = ButtonModule::with_defaults(Platform {
        lines: lines.clone(),
        interrupts: irqs.clone(),
        scheduler: scheduler.clone(),
        reporter: reporter.clone(),
    });
    module.start().expect("start");

    let fires_per_source = 500u64;
    let done = Arc::new(AtomicBool::new(false));

    let drainer = {
        let scheduler = Arc::clone(&scheduler);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut completed = 0;
            while !done.load(Ordering::Acquire) {
                completed += scheduler.run_pending();
                thread::yield_now();
            }
            completed + scheduler.run_pending()
        })
    };

    let firers: Vec<_> = [TriggerId(0), TriggerId(1)]
        .into_iter()
        .map(|trigger| {
            let irqs = Arc::clone(&irqs);
            thread::spawn(move || {
                for _ in 0..fires_per_source {
                    irqs.fire(trigger);
                }
            })
        })
        .collect();
    for firer in firers {
        firer.join().expect("firing thread");
    }
    done.store(true, Ordering::Release);
    let completed = drainer.join().expect("drain thread") as u64;

    let stats = module.deferred_unit().stats();
    let total = fires_per_source * 2;
    assert_eq!(stats.accepted_requests + stats.coalesced_requests, total);
    assert_eq!(stats.completed_runs, stats.accepted_requests);
    assert_eq!(completed, stats.completed_runs);
    assert!(completed >= 1 && completed <= total);
    assert_eq!(stats.state, UnitState::Idle);

    let reports = reporter.reports();
    assert_eq!(reports.len() as u64, completed);
    let last = module.last_report().expect("at least one report");
    assert!(last.source == "KEY_UP" || last.source == "KEY_DOWN");

    assert_eq!(module.stop(), 2);
}
