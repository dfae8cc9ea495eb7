//! CLI tests for `stategraph validate`, `plan`, and `run`.
//!
//! Spawns the stategraph binary against manifests whose actions are shell
//! commands operating on files in a scratch directory, and verifies exit codes
//! and the persisted report.

use std::process::Command;

use stategraph::exit_codes;
use stategraph::io::report_store::load_report;
use stategraph::test_support::{scratch_dir, write_manifest};

const LOGIN_FLOW: &str = r#"
[environment]
setup = ["sh", "-c", "mkdir -p app && echo started > app/setup.log"]

[[state]]
name = "home"
transition = ["sh", "-c", "echo home >> app/trail"]
checks = ["sh", "-c", "tail -n 1 app/trail | grep -qx home"]

[[state]]
name = "login"
parent = "home"
transition = ["sh", "-c", "echo login >> app/trail"]
checks = ["sh", "-c", "tail -n 1 app/trail | grep -qx login"]

[[preserving]]
state = "home"
name = "refresh-keeps-home"
action = ["sh", "-c", "echo refreshed >> app/refreshes"]
"#;

fn stategraph() -> Command {
    Command::new(env!("CARGO_BIN_EXE_stategraph"))
}

#[test]
fn run_passing_manifest_exits_ok_and_writes_report() {
    let temp = scratch_dir().expect("tempdir");
    let manifest = write_manifest(temp.path(), LOGIN_FLOW).expect("manifest");

    let status = stategraph()
        .arg("run")
        .arg(&manifest)
        .status()
        .expect("stategraph run");
    assert_eq!(status.code(), Some(exit_codes::OK));

    let report = load_report(&temp.path().join("stategraph-report.json")).expect("report");
    assert_eq!(report.summary().passed, 3);
    let trail = std::fs::read_to_string(temp.path().join("app/trail")).expect("trail");
    assert_eq!(trail, "home\nlogin\n");
    let refreshes = std::fs::read_to_string(temp.path().join("app/refreshes")).expect("refreshes");
    assert_eq!(refreshes, "refreshed\n");
}

#[test]
fn run_with_failing_check_exits_failed() {
    let temp = scratch_dir().expect("tempdir");
    let manifest = write_manifest(
        temp.path(),
        r#"
[[state]]
name = "home"
transition = ["true"]
checks = ["false"]
"#,
    )
    .expect("manifest");
    let report_path = temp.path().join("out").join("report.json");

    let status = stategraph()
        .arg("run")
        .arg(&manifest)
        .arg("--report")
        .arg(&report_path)
        .status()
        .expect("stategraph run");
    assert_eq!(status.code(), Some(exit_codes::FAILED));

    let report = load_report(&report_path).expect("report");
    assert_eq!(report.summary().failed, 1);
}

#[test]
fn unknown_parent_exits_invalid() {
    let temp = scratch_dir().expect("tempdir");
    let manifest = write_manifest(
        temp.path(),
        r#"
[[state]]
name = "login"
parent = "home"
transition = ["true"]
checks = ["true"]
"#,
    )
    .expect("manifest");

    for command in ["validate", "plan", "run"] {
        let output = stategraph()
            .arg(command)
            .arg(&manifest)
            .output()
            .expect("stategraph");
        assert_eq!(output.status.code(), Some(exit_codes::INVALID), "{command}");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("unknown state 'home'"), "{command}: {stderr}");
    }
}

#[test]
fn plan_prints_nested_tree_without_running() {
    let temp = scratch_dir().expect("tempdir");
    let manifest = write_manifest(temp.path(), LOGIN_FLOW).expect("manifest");

    let output = stategraph()
        .arg("plan")
        .arg(&manifest)
        .output()
        .expect("stategraph plan");
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "login");
    assert_eq!(lines[1], "  home");
    assert!(lines[2].starts_with("    - can be reached (reachability:"));
    assert!(lines[3].starts_with("    - refresh-keeps-home (preserving:"));
    assert!(lines[4].starts_with("  - can be reached (reachability:"));
    assert!(!temp.path().join("app").exists(), "plan must not run actions");
}
