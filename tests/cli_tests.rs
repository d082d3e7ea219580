use std::process::Command;

fn uartline() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_uartline"));
    cmd.env("UARTLINE_LOG_FILE", std::env::temp_dir().join("uartline_cli_tests.log"));
    cmd
}

#[test]
fn help_lists_every_option() {
    let output = uartline().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--serial",
        "--baudrate",
        "--databits",
        "--stopbits",
        "--parity",
        "--flowcontrol",
        "--read",
        "--history",
        "--version",
    ] {
        assert!(stdout.contains(flag), "help is missing {flag}");
    }
}

#[test]
fn version_reports_libraries() {
    let output = uartline().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("uartline {}", env!("CARGO_PKG_VERSION"))));
    assert!(stdout.contains("serialport"));
}

#[test]
fn validation_failure_exits_before_opening() {
    let output = uartline()
        .args(["--port", "/dev/uartline-missing", "--parity", "mark", "-b", "12"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid baudrate '12'"));
    assert!(stderr.contains("Invalid parity 'mark'. Valid: none/odd/even"));
    assert!(!stderr.contains("Cannot find port"));
}

#[test]
fn unknown_parameter_is_rejected() {
    let output = uartline().args(["--port", "COM1", "--fast"]).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown parameter: --fast"));
}

#[test]
fn missing_port_fails_to_connect() {
    let output = uartline()
        .args(["--port", "/dev/uartline-missing"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot find port /dev/uartline-missing"));
}
