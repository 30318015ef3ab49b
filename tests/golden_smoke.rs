// tests/golden_smoke.rs
use std::process::Command;

#[test]
fn golden_smoke_aggregates_raw_file() {
    let tmp = tempfile::tempdir().unwrap();
    let in_path = tmp.path().join("raw.json");
    let out_path = tmp.path().join("depth.json");

    std::fs::write(
        &in_path,
        r#"{
  "bids": [
    {"price": "100", "quantity": "2"},
    {"price": "101", "quantity": "1"}
  ],
  "asks": [
    {"price": "102", "quantity": "3"}
  ]
}"#,
    )
    .unwrap();

    let exe = env!("CARGO_BIN_EXE_depthline");
    let status = Command::new(exe)
        .args([
            "aggregate",
            "--file",
            in_path.to_str().unwrap(),
            "--out",
            out_path.to_str().unwrap(),
            "--depth",
            "0",
        ])
        .status()
        .unwrap();

    assert!(status.success());
    let out = std::fs::read_to_string(&out_path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(v["type"], "final");

    // bids sorted best-first with independent cumulative sums
    assert_eq!(v["bids"][0]["price"], "101");
    assert_eq!(v["bids"][0]["cumulative"], "1");
    assert_eq!(v["bids"][1]["price"], "100");
    assert_eq!(v["bids"][1]["cumulative"], "3");
    assert_eq!(v["asks"][0]["cumulative"], "3");

    // spread = 102 - 101, percentage ~ 0.99%
    assert_eq!(v["spread"]["value"], "1");
    assert!(v["spread"]["percentage"]
        .as_str()
        .unwrap()
        .starts_with("0.99"));

    // vwap over all six units of quantity
    assert!(v["vwap"].as_str().unwrap().starts_with("101"));
}

#[test]
fn golden_smoke_rejects_malformed_input() {
    let tmp = tempfile::tempdir().unwrap();
    let in_path = tmp.path().join("raw.json");
    let out_path = tmp.path().join("depth.json");

    std::fs::write(
        &in_path,
        r#"{"bids": [{"price": "oops", "quantity": "1"}], "asks": []}"#,
    )
    .unwrap();

    let exe = env!("CARGO_BIN_EXE_depthline");
    let output = Command::new(exe)
        .args([
            "aggregate",
            "--file",
            in_path.to_str().unwrap(),
            "--out",
            out_path.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!out_path.exists(), "no output should be written on failure");
}
