use keytasklet_core::{default_log_level, init_logging, logging_status};

#[test]
fn init_logging_is_idempotent_and_rejects_conflicts() {
    let first = tempfile::tempdir().expect("temp dir");
    let second = tempfile::tempdir().expect("temp dir");
    let first_dir = first.path().to_str().expect("utf-8 temp dir").to_string();
    let second_dir = second.path().to_str().expect("utf-8 temp dir").to_string();

    assert!(logging_status().is_none());
    init_logging("info", &first_dir).expect("first init");
    init_logging(" INFO ", &first_dir).expect("same config is idempotent");

    let level_error = init_logging("debug", &first_dir).expect_err("level conflict");
    assert!(level_error.contains("refusing to switch"));
    let dir_error = init_logging("info", &second_dir).expect_err("directory conflict");
    assert!(dir_error.contains("refusing to switch"));

    let (level, dir) = logging_status().expect("logging active");
    assert_eq!(level, "info");
    assert_eq!(dir, first.path());

    log::info!("event=test_probe module=tests status=ok");
    assert!(first.path().is_dir());
}

#[test]
fn default_level_tracks_build_mode() {
    let expected = if cfg!(debug_assertions) { "debug" } else { "info" };
    assert_eq!(default_log_level(), expected);
}
