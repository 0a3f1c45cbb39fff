use std::time::Duration;

use payslip_rs::config::{ENV_API_URL, ENV_REQUEST_TIMEOUT_SECS};
use payslip_rs::{Config, Error};
use serial_test::serial;

fn clear_env() {
    // SAFETY: every test touching these variables is `#[serial]`.
    unsafe {
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_REQUEST_TIMEOUT_SECS);
    }
}

fn set_env(key: &str, value: &str) {
    // SAFETY: see `clear_env`.
    unsafe { std::env::set_var(key, value) }
}

#[test]
#[serial]
fn from_env_reads_url_and_timeout() {
    clear_env();
    set_env(ENV_API_URL, "http://payroll.internal:8001/api");
    set_env(ENV_REQUEST_TIMEOUT_SECS, "12");

    let config = Config::from_env().unwrap();
    assert_eq!(config.base_url().as_str(), "http://payroll.internal:8001/api/");
    assert_eq!(config.request_timeout(), Duration::from_secs(12));
    clear_env();
}

#[test]
#[serial]
fn missing_url_is_a_configuration_error() {
    clear_env();
    match Config::from_env() {
        Err(Error::Configuration { message }) => assert!(message.contains(ENV_API_URL)),
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
#[serial]
fn malformed_timeout_is_a_configuration_error() {
    clear_env();
    set_env(ENV_API_URL, "http://localhost:8001/api/");
    set_env(ENV_REQUEST_TIMEOUT_SECS, "soon");

    assert!(matches!(Config::from_env(), Err(Error::Configuration { .. })));
    clear_env();
}
