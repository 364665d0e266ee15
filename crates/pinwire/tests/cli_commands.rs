#![cfg(feature = "cli")]

use std::process::Command;

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_pinwire"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_lists_features() {
    let output = Command::new(env!("CARGO_BIN_EXE_pinwire"))
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("features: board="));
}

#[test]
fn ports_emits_json_listing() {
    let output = Command::new(env!("CARGO_BIN_EXE_pinwire"))
        .arg("--format")
        .arg("json")
        .arg("ports")
        .output()
        .expect("ports should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ports.schema.json"));
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("ports should emit json");
    assert!(payload.get("ports").is_some_and(|p| p.is_array()));
}

#[test]
fn watch_without_pins_is_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_pinwire"))
        .arg("watch")
        .arg("/dev/ttyACM0")
        .output()
        .expect("watch should run");

    // Clap reports missing required arguments itself with exit code 2.
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--pins"));
}

#[test]
fn bad_hold_duration_returns_usage_before_touching_the_device() {
    let output = Command::new(env!("CARGO_BIN_EXE_pinwire"))
        .arg("write")
        .arg("/dev/pinwire-test-missing")
        .arg("d13o")
        .arg("1")
        .arg("--hold")
        .arg("soon")
        .output()
        .expect("write should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn bad_settle_duration_returns_usage_before_touching_the_device() {
    let output = Command::new(env!("CARGO_BIN_EXE_pinwire"))
        .arg("info")
        .arg("/dev/pinwire-test-missing")
        .arg("--settle")
        .arg("whenever")
        .output()
        .expect("info should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_device_fails_with_open_context() {
    let output = Command::new(env!("CARGO_BIN_EXE_pinwire"))
        .arg("write")
        .arg("/dev/pinwire-test-missing")
        .arg("d13o")
        .arg("1")
        .arg("--settle")
        .arg("0s")
        .output()
        .expect("write should run");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open failed"));
}
