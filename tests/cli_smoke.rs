use std::process::Command;

#[test]
fn help_displays_overview() {
    let binary = env!("CARGO_BIN_EXE_sector-pulse");
    let output = Command::new(binary)
        .arg("--help")
        .output()
        .expect("invoke sector-pulse --help");

    assert!(output.status.success(), "help command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Sector basket relative-strength reporter"),
        "expected overview text in help output"
    );
}

#[test]
fn notify_without_webhook_aborts_before_sending() {
    let binary = env!("CARGO_BIN_EXE_sector-pulse");
    let workdir = tempfile::tempdir().expect("temp dir");
    let output = Command::new(binary)
        .args(["notify", "discord"])
        .env_remove("DISCORD_WEBHOOK_URL")
        .current_dir(workdir.path())
        .output()
        .expect("invoke sector-pulse notify discord");

    assert!(!output.status.success(), "missing webhook should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("DISCORD_WEBHOOK_URL"),
        "expected the missing variable to be named, got {stderr}"
    );
}

#[test]
fn notify_without_report_file_aborts() {
    let binary = env!("CARGO_BIN_EXE_sector-pulse");
    let workdir = tempfile::tempdir().expect("temp dir");
    let output = Command::new(binary)
        .args(["notify", "line"])
        .env("LINE_CHANNEL_ACCESS_TOKEN", "token")
        .env("LINE_USER_ID", "U0000")
        .current_dir(workdir.path())
        .output()
        .expect("invoke sector-pulse notify line");

    assert!(!output.status.success(), "missing report should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("analysis_output.txt"),
        "expected the report path to be named, got {stderr}"
    );
}
