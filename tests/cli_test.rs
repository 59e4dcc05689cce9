use std::path::Path;
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_city_traffic"))
        .args(args)
        .env("RUST_LOG", "warn,city_traffic=info")
        .output()
        .expect("Failed to execute simulation")
}

fn stat(stderr: &str, label: &str) -> Option<u64> {
    stderr.lines().find_map(|line| {
        let (_, value) = line.split_once(label)?;
        value.trim().parse().ok()
    })
}

/// Test that a headless run completes and logs its statistics
#[test]
fn test_headless_run_logs_summary() {
    let output = run_cli(&["--ticks", "60", "--seed", "7"]);

    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
    for label in ["Total cars arrived:", "Active cars:", "Success rate:"] {
        assert!(stderr.contains(label), "Missing '{}' statistic", label);
    }

    let spawned = stat(&stderr, "Total cars spawned:").expect("spawn count should be logged");
    assert!(spawned > 0, "No cars were spawned");
    assert_eq!(stat(&stderr, "Ticks:"), Some(60));
}

/// Test that the final snapshot is printed as JSON
#[test]
fn test_json_snapshot_output() {
    let output = run_cli(&["--ticks", "20", "--json"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let snapshot: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("stdout should be a JSON snapshot");
    assert_eq!(snapshot["tick"], 20);
    assert_eq!(snapshot["width"], 12);
}

#[test]
fn test_map_files_load() {
    let maps = Path::new(env!("CARGO_MANIFEST_DIR")).join("maps");
    let map = maps.join("demo.txt");
    let dictionary = maps.join("dictionary.json");

    let output = run_cli(&[
        "--map",
        map.to_str().unwrap(),
        "--dictionary",
        dictionary.to_str().unwrap(),
        "--ticks",
        "15",
        "--draw",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("=== Final Map ==="));
}

#[test]
fn test_bad_map_fails() {
    let missing = Path::new(env!("CARGO_MANIFEST_DIR")).join("maps/missing.txt");
    let dictionary = Path::new(env!("CARGO_MANIFEST_DIR")).join("maps/dictionary.json");

    let output = run_cli(&[
        "--map",
        missing.to_str().unwrap(),
        "--dictionary",
        dictionary.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
}
