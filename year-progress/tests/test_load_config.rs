use serial_test::serial;
use std::env;
use std::path::PathBuf;

use year_progress::load_config::{load_config, DEFAULT_SERVICE};

fn clear_env() {
    for var in ["HANDLE", "PASSWORD", "BSKY_SERVICE", "FONT_PATH"] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_load_config_uses_defaults_for_optional_settings() {
    clear_env();
    env::set_var("HANDLE", "progress.bsky.social");
    env::set_var("PASSWORD", "app-password");

    let config = load_config().expect("Config should load from env");

    assert_eq!(config.handle, "progress.bsky.social");
    assert_eq!(config.password, "app-password");
    assert_eq!(config.service, DEFAULT_SERVICE);
    assert_eq!(config.font_path.file_name().unwrap(), "pacifico.ttf");
    let exe = env::current_exe().unwrap();
    assert_eq!(config.font_path.parent(), exe.parent());
}

#[test]
#[serial]
fn test_load_config_reads_overrides() {
    clear_env();
    env::set_var("HANDLE", "progress.bsky.social");
    env::set_var("PASSWORD", "app-password");
    env::set_var("BSKY_SERVICE", "https://pds.example.com/");
    env::set_var("FONT_PATH", "/opt/fonts/display.ttf");

    let config = load_config().expect("Config should load from env");

    assert_eq!(config.service, "https://pds.example.com");
    assert_eq!(config.font_path, PathBuf::from("/opt/fonts/display.ttf"));
    clear_env();
}

#[test]
#[serial]
fn test_load_config_errors_on_missing_password() {
    clear_env();
    env::set_var("HANDLE", "progress.bsky.social");

    let err = load_config().unwrap_err();
    assert!(
        err.to_string().contains("PASSWORD"),
        "Missing PASSWORD should be reported, got: {err}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_on_empty_handle() {
    clear_env();
    env::set_var("HANDLE", "");
    env::set_var("PASSWORD", "app-password");

    let err = load_config().unwrap_err();
    assert!(err.to_string().contains("HANDLE"), "got: {err}");
    clear_env();
}

#[test]
#[serial]
fn test_config_debug_output_redacts_password() {
    clear_env();
    env::set_var("HANDLE", "progress.bsky.social");
    env::set_var("PASSWORD", "super-secret");

    let config = load_config().unwrap();
    let debug = format!("{config:?}");
    assert!(debug.contains("progress.bsky.social"));
    assert!(!debug.contains("super-secret"));
    clear_env();
}
