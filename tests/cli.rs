use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const SALES_CSV: &str = "month,units\njan,3\njan,4\nfeb,5\n";

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("dashchart").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("dashchart"))
        .stdout(predicate::str::contains("chart"));
}

#[test]
fn chart_writes_a_figure() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    let options = dir.path().join("options.json");
    let out = dir.path().join("figure.json");
    fs::write(&data, SALES_CSV).unwrap();
    fs::write(
        &options,
        r#"{"globalSeriesType": "column", "columnMapping": {"month": "x", "units": "y"}}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("dashchart").unwrap();
    cmd.args(["chart", "--stats", "--data"])
        .arg(&data)
        .arg("--options")
        .arg(&options)
        .arg("--out")
        .arg(&out);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("units  count=3"));

    let figure: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(figure["data"][0]["type"], "bar");
    assert_eq!(figure["data"][0]["y"], serde_json::json!([5.0, 7.0]));
    assert_eq!(figure["layout"]["autosize"], false);
}

#[test]
fn counter_prints_json() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("count.json");
    fs::write(&data, r#"{"rows": [{"counter": 1500}]}"#).unwrap();

    let mut cmd = Command::cargo_bin("dashchart").unwrap();
    cmd.args(["counter", "--name", "Orders", "--data"]).arg(&data);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""counterValue": "1,500""#))
        .stdout(predicate::str::contains(r#""counterLabel": "Orders""#));
}

#[test]
fn table_exports_csv() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("sales.csv");
    let out = dir.path().join("table.csv");
    fs::write(&data, SALES_CSV).unwrap();

    let mut cmd = Command::cargo_bin("dashchart").unwrap();
    cmd.args(["table", "--data"]).arg(&data).arg("--out").arg(&out);
    cmd.assert().success();
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().next(), Some("month,units"));
    assert_eq!(text.lines().count(), 4);
}

#[test]
fn missing_input_fails() {
    let mut cmd = Command::cargo_bin("dashchart").unwrap();
    cmd.args(["funnel", "--data", "/nonexistent/input.json"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("reading"));
}
