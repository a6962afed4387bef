//! Command-line surface: argument handling and exit statuses

use assert_cmd::Command;

fn bug_report() -> Command {
    let mut cmd = Command::cargo_bin("bug-report").unwrap();
    cmd.env("RUST_LOG", "warn")
        .env_remove("BUG_REPORT_INSTALL")
        .env_remove("BUG_REPORT_REGISTRY")
        .write_stdin("");
    cmd
}

#[test]
fn test_help_lists_install_policy() {
    let assert = bug_report().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("--install"), "{stdout}");
    assert!(stdout.contains("check"), "{stdout}");
}

#[test]
fn test_malformed_registry_exits_with_registry_status() {
    let dir = tempfile::tempdir().unwrap();
    let registry = dir.path().join("tools.toml");
    std::fs::write(&registry, "[[tool]]\nexecutable = \n").unwrap();

    let assert = bug_report()
        .arg("check")
        .env("BUG_REPORT_REGISTRY", &registry)
        .assert()
        .code(2);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("Malformed tool registry"), "{stderr}");
}

#[test]
fn test_duplicate_registry_entry_is_rejected_before_collection() {
    let dir = tempfile::tempdir().unwrap();
    let registry = dir.path().join("tools.toml");
    std::fs::write(
        &registry,
        "[[tool]]\nexecutable = \"lshw\"\npackage = \"lshw\"\nvm_useful = true\n\n\
         [[tool]]\nexecutable = \"lshw\"\npackage = \"lshw\"\nvm_useful = false\n",
    )
    .unwrap();

    bug_report()
        .args(["--install", "never", "--registry"])
        .arg(&registry)
        .args(["--output-dir"])
        .arg(dir.path())
        .arg("--work-dir")
        .arg(dir.path().join("work"))
        .assert()
        .code(2);
    assert!(!dir.path().join("bug-report.tar.gz").exists());
}

#[test]
fn test_unknown_install_policy_is_a_usage_error() {
    let assert = bug_report().args(["--install", "maybe", "check"]).assert().code(64);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("maybe"), "{stderr}");
}

#[test]
fn test_unknown_flag_exit_differs_from_registry_failure() {
    bug_report().arg("--no-such-flag").assert().code(64);
}

#[test]
fn test_version_exits_successfully() {
    bug_report().arg("--version").assert().success();
}
