//! Runs the built binary against piped standard input

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::NamedTempFile;

fn run_binary(extra_args: &[&str], input: &str) -> Output {
    // An empty config file keeps a user's default config out of the test
    let config = NamedTempFile::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_msgbroker"))
        .arg("--config-file")
        .arg(config.path())
        .args(["--log-level", "off"])
        .args(extra_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_binary_relays_stdin_to_stderr() {
    let output = run_binary(
        &[
            "--verbosity",
            "major-steps",
            "--source",
            "Noisy=errors",
            "--shutdown-timeout-ms",
            "2000",
        ],
        "hello\n@errors Net connect failed\n@major-steps Noisy hidden\n",
    );
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.starts_with("hello\n["));
    assert!(stderr.contains("] Error: Net - connect failed\n"));
    assert!(!stderr.contains("hidden"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_binary_everything_shows_broker_diagnostics() {
    let output = run_binary(
        &["--verbosity", "everything", "--shutdown-timeout-ms", "2000"],
        "@minor-steps Job step\n",
    );
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Debug: MessageBroker::init - started message broker\n"));
    assert!(stderr.contains("Info:  Job - step\n"));
    assert!(stderr.contains("Info:  MessageBroker::shutdown - shutting down message broker\n"));
    assert!(stderr.contains("Debug: MessageBroker::shutdown - consumer stopped\n"));
}

#[test]
fn test_binary_rejects_missing_config_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_msgbroker"))
        .args(["--config-file", "/nonexistent/msgbroker.toml", "--log-level", "off"])
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error reading configuration file"));
}
