//! CLI smoke entry point.
//!
//! # Responsibility
//! - Start the button module against the simulated platform, drive a fixed
//!   transition script through it and stop it again.
//! - Print deterministic JSON lines for quick local sanity checks.
//!
//! Usage: `keytasklet_cli [ABSOLUTE_LOG_DIR]`

use keytasklet_core::platform::sim::{ManualScheduler, RecordingReporter, SimInterrupts, SimLines};
use keytasklet_core::{
    core_version, default_log_level, init_logging, ButtonModule, LineId, LineLevel, Platform,
    TriggerId,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    if let Some(log_dir) = std::env::args().nth(1) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("keytasklet: {err}");
            return ExitCode::FAILURE;
        }
    }
    println!("keytasklet_core version={}", core_version());

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

    let summary = match module.start() {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("keytasklet: {err}");
            return ExitCode::FAILURE;
        }
    };
    println!("start wired={:?} failed={}", summary.wired, summary.failures.len());

    // Press KEY_UP, let the deferred half run, then bounce both keys before it runs again.
    lines.set_level(LineId(0), LineLevel::Low);
    irqs.fire(TriggerId(0));
    scheduler.run_pending();
    lines.set_level(LineId(0), LineLevel::High);
    irqs.fire(TriggerId(0));
    lines.set_level(LineId(1), LineLevel::Low);
    irqs.fire(TriggerId(1));
    scheduler.run_pending();

    for message in reporter.messages() {
        println!("{message}");
    }
    match serde_json::to_string(&module.status()) {
        Ok(json) => println!("{json}"),
        Err(err) => log::warn!("event=status_dump module=cli status=error detail={err}"),
    }

    println!("stop released={}", module.stop());
    ExitCode::SUCCESS
}
