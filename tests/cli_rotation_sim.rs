use serde_json::Value;
use std::process::Command;

fn run_sim(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_rotation_sim"))
        .args(args)
        .output()
        .expect("run rotation_sim");
    (
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        output.status.success(),
    )
}

#[test]
fn json_report_carries_the_requested_run_parameters() {
    let (stdout, stderr, ok) = run_sim(&[
        "--iterations",
        "3",
        "--seed",
        "7",
        "--duration-ms",
        "5000",
        "--json",
    ]);
    assert!(ok, "rotation_sim failed: stderr={stderr}");

    let report: Value = serde_json::from_str(&stdout).expect("parse report json");
    assert_eq!(report.get("iterations").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(report.get("seed").and_then(|v| v.as_u64()), Some(7));
    assert_eq!(report.get("duration_ms").and_then(|v| v.as_i64()), Some(5000));

    let units = report
        .get("units")
        .and_then(|v| v.as_array())
        .expect("units array");
    assert!(units.iter().any(|u| {
        u.get("unit").and_then(|v| v.as_str()) == Some("duelist")
    }));
}

#[test]
fn same_seed_runs_print_bit_identical_reports() {
    let args = [
        "--iterations",
        "2",
        "--seed",
        "42",
        "--duration-ms",
        "8000",
        "--json",
    ];
    let (first, stderr, ok) = run_sim(&args);
    assert!(ok, "rotation_sim failed: stderr={stderr}");
    let (second, _, ok) = run_sim(&args);
    assert!(ok);

    assert_eq!(first, second);
}

#[test]
fn scenario_file_configures_the_run() {
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("rotsim-scenario-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("scenario.json");
    fs::write(
        &path,
        r#"{ "iterations": 4, "seed": 99, "duration_ms": 3000, "prepull_ms": 1000 }"#,
    )
    .expect("write scenario");

    let (stdout, stderr, ok) = run_sim(&["--scenario", path.to_str().unwrap(), "--json"]);
    assert!(ok, "rotation_sim failed: stderr={stderr}");

    let report: Value = serde_json::from_str(&stdout).expect("parse report json");
    assert_eq!(report.get("iterations").and_then(|v| v.as_u64()), Some(4));
    assert_eq!(report.get("seed").and_then(|v| v.as_u64()), Some(99));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_scenario_file_exits_with_an_error() {
    let (_, stderr, ok) = run_sim(&["--scenario", "/nonexistent/scenario.json"]);
    assert!(!ok);
    assert!(stderr.contains("scenario error"), "stderr={stderr}");
}
