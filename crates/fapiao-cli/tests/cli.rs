use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn electronic_tokens() -> Value {
    json!([
        {"text": "电子发票（增值税专用发票）", "bbox": [350, 40, 650, 70]},
        {"text": "发票号码：24312000000098765432", "bbox": [720, 40, 980, 60]},
        {"text": "开票日期：2024年05月20日", "bbox": [720, 70, 980, 90]},
        {"text": "名称：上海某某信息技术有限公司", "bbox": [40, 140, 480, 160]},
        {"text": "统一社会信用代码/纳税人识别号：91310000MA1FL0ABCD", "bbox": [40, 180, 480, 200]},
        {"text": "名称：杭州某某软件有限公司", "bbox": [540, 140, 960, 160]},
        {"text": "统一社会信用代码/纳税人识别号：91330100MA2H0WXYZ1", "bbox": [540, 180, 960, 200]},
        {"text": "项目名称", "bbox": [40, 260, 200, 280]},
        {"text": "金额", "bbox": [500, 260, 600, 280]},
        {"text": "税额", "bbox": [800, 260, 900, 280]},
        {"text": "*信息技术服务*软件开发", "bbox": [40, 310, 280, 330]},
        {"text": "10000.00", "bbox": [500, 310, 600, 330]},
        {"text": "600.00", "bbox": [800, 310, 900, 330]},
        {"text": "价税合计（大写）", "bbox": [20, 510, 200, 530]},
        {"text": "（小写）¥10,600.00", "bbox": [700, 510, 980, 530]}
    ])
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
}

fn fapiao() -> Command {
    Command::cargo_bin("fapiao").unwrap()
}

#[test]
fn test_process_outputs_json() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("invoice.json");
    write_json(&input, &electronic_tokens());

    let output = fapiao().arg("process").arg(&input).output().unwrap();
    assert!(output.status.success());

    let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["layout"], "electronic");
    assert_eq!(doc["title"], "vat_special");
    assert_eq!(doc["fields"]["invoice_number"], "24312000000098765432");
    assert_eq!(doc["fields"]["issue_date"], "2024-05-20");
    assert_eq!(doc["table"]["rows"][0]["税额"], "600.00");
    assert_eq!(doc["segments"].as_object().unwrap().len(), 6);
}

#[test]
fn test_process_accepts_wrapped_dump() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ser.json");
    write_json(&input, &json!({"ocr_info": [
        {"transcription": "开户行及账号：工商银行", "bbox": [40, 200, 560, 220]},
        {"transcription": "增值税普通发票", "bbox": [300, 20, 700, 60]}
    ]}));

    fapiao()
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"layout\": \"legacy_vat\""));
}

#[test]
fn test_process_text_format() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("invoice.json");
    write_json(&input, &electronic_tokens());

    fapiao()
        .args(["process", "-f", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Layout: electronic"))
        .stdout(predicate::str::contains("电子发票（增值税专用发票）"))
        .stdout(predicate::str::contains("Total: ¥10600.00"));
}

#[test]
fn test_process_csv_to_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("invoice.json");
    let output = dir.path().join("invoice.csv");
    write_json(&input, &electronic_tokens());

    fapiao()
        .args(["process", "-f", "csv", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let csv = fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("layout,invoice_number,issue_date,buyer_name,seller_name,seller_tax_id,total_amount,项目名称,金额,税额")
    );
    assert!(lines.next().unwrap().ends_with("*信息技术服务*软件开发,10000.00,600.00"));
}

fn process_csv(dir: &TempDir, tokens: &Value, config: Option<&Value>) -> String {
    let input = dir.path().join("invoice.json");
    write_json(&input, tokens);

    let mut cmd = fapiao();
    if let Some(config) = config {
        let path = dir.path().join("config.json");
        write_json(&path, config);
        cmd.arg("--config").arg(path);
    }
    let output = cmd.args(["process", "-f", "csv"]).arg(&input).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    String::from_utf8(output.stdout).unwrap()
}

const CSV_PREFIX: &str = "layout,invoice_number,issue_date,buyer_name,seller_name,seller_tax_id,total_amount";

#[test]
fn test_process_csv_header_only_table() {
    let dir = TempDir::new().unwrap();
    let values = ["*信息技术服务*软件开发", "10000.00", "600.00"];
    let tokens: Vec<Value> = electronic_tokens()
        .as_array()
        .unwrap()
        .iter()
        .filter(|tok| !values.contains(&tok["text"].as_str().unwrap()))
        .cloned()
        .collect();

    let csv = process_csv(&dir, &Value::Array(tokens), None);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], format!("{},项目名称,金额,税额", CSV_PREFIX));
    assert!(lines[1].starts_with("electronic,24312000000098765432,2024-05-20,"));
    assert!(lines[1].ends_with(",10600.00,,,"));
    assert_eq!(lines.iter().filter(|l| !l.is_empty()).count(), 2);
}

#[test]
fn test_process_csv_unrecognized_layout() {
    let dir = TempDir::new().unwrap();
    let tokens = json!([{"text": "RECEIPT", "bbox": [0, 0, 100, 20]}]);

    let csv = process_csv(&dir, &tokens, None);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], CSV_PREFIX);
    assert_eq!(lines[1], ",,,,,,");
}

#[test]
fn test_process_csv_malformed_table() {
    let dir = TempDir::new().unwrap();
    let config = json!({"parser": {"pivot_column": "税金"}});

    let csv = process_csv(&dir, &electronic_tokens(), Some(&config));
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], CSV_PREFIX);
    assert!(lines[1].starts_with("electronic,"));
    assert!(lines[1].ends_with(",10600.00"));
}

#[test]
fn test_batch_csv_header_only_table() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let tokens: Vec<Value> = electronic_tokens()
        .as_array()
        .unwrap()
        .iter()
        .filter(|tok| tok["text"] != "10000.00" && tok["text"] != "600.00")
        .filter(|tok| tok["text"] != "*信息技术服务*软件开发")
        .cloned()
        .collect();
    write_json(&dir.path().join("a.json"), &Value::Array(tokens));

    fapiao()
        .arg("batch")
        .arg(dir.path().join("*.json").to_str().unwrap())
        .arg("-o")
        .arg(&out)
        .args(["-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 0 failed"));

    let csv = fs::read_to_string(out.join("a.csv")).unwrap();
    assert_eq!(csv.lines().count(), 2);
}

#[test]
fn test_process_unrecognized_layout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("receipt.json");
    write_json(&input, &json!([{"text": "RECEIPT", "bbox": [0, 0, 100, 20]}]));

    fapiao()
        .args(["process", "--show-issues"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"layout\": null"))
        .stdout(predicate::str::contains("unrecognized_layout"))
        .stderr(predicate::str::contains("No known invoice layout"));
}

#[test]
fn test_process_empty_dump_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.json");
    fs::write(&input, "[]").unwrap();

    fapiao()
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no tokens to parse"));
}

#[test]
fn test_process_missing_file() {
    fapiao()
        .args(["process", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_with_config_pivot() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("invoice.json");
    let config = dir.path().join("config.json");
    write_json(&input, &electronic_tokens());
    write_json(&config, &json!({"parser": {"pivot_column": "税金"}}));

    let output = fapiao()
        .arg("--config")
        .arg(&config)
        .arg("process")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["issues"][0]["kind"], "malformed_table");
    assert_eq!(doc["table"]["rows"].as_array().unwrap().len(), 0);
}

#[test]
fn test_batch_with_summary() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    write_json(&dir.path().join("a.json"), &electronic_tokens());
    write_json(&dir.path().join("b.json"), &electronic_tokens());
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    fapiao()
        .arg("batch")
        .arg(dir.path().join("*.json").to_str().unwrap())
        .arg("-o")
        .arg(&out)
        .args(["--summary", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"))
        .stdout(predicate::str::contains("2 successful, 0 failed"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.contains("a.json,success,electronic"));
}

#[test]
fn test_batch_continue_on_error() {
    let dir = TempDir::new().unwrap();
    write_json(&dir.path().join("good.json"), &electronic_tokens());
    fs::write(dir.path().join("broken.json"), "{not json").unwrap();
    let pattern = dir.path().join("*.json");

    fapiao()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));

    fapiao()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .arg("--continue-on-error")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 1 failed"))
        .stdout(predicate::str::contains("broken.json"));
}

#[test]
fn test_batch_no_matches() {
    let dir = TempDir::new().unwrap();

    fapiao()
        .arg("batch")
        .arg(dir.path().join("*.json").to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_layouts_lists_builtin_catalog() {
    fapiao()
        .arg("layouts")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. electronic"))
        .stdout(predicate::str::contains("2. legacy_vat"));
}

#[test]
fn test_layouts_json() {
    let output = fapiao().args(["layouts", "--json"]).output().unwrap();
    assert!(output.status.success());

    let catalog: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(catalog["variants"][0]["keyword"], "社会信用代码");
    assert_eq!(catalog["variants"][1]["keyword"], "开户行及账号");
}

#[test]
fn test_config_init_set_get() {
    let home = TempDir::new().unwrap();
    let config = |args: &[&str]| {
        let mut cmd = fapiao();
        cmd.env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path().join(".config"))
            .arg("config")
            .args(args);
        cmd
    };

    config(&["init"]).assert().success();
    config(&["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    config(&["set", "parser.bounds_margin", "30"]).assert().success();
    config(&["get", "parser.bounds_margin"])
        .assert()
        .success()
        .stdout(predicate::str::diff("30\n"));

    config(&["get", "parser.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_config_honours_global_path() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("fapiao.json");
    let config = |args: &[&str]| {
        let mut cmd = fapiao();
        cmd.env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path().join(".config"))
            .arg("--config")
            .arg(&path)
            .arg("config")
            .args(args);
        cmd
    };

    config(&["init"]).assert().success();
    assert!(path.exists());
    assert!(!home.path().join(".config").join("fapiao").exists());

    config(&["set", "parser.pivot_column", "金额"]).assert().success();
    config(&["get", "parser.pivot_column"])
        .assert()
        .success()
        .stdout(predicate::str::diff("\"金额\"\n"));
    config(&["path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fapiao.json"))
        .stdout(predicate::str::contains("exists"));
}

#[test]
fn test_config_show_lists_layouts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    fapiao()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No config file found"))
        .stderr(predicate::str::contains("Layouts (built-in): electronic, legacy_vat"));
}

#[test]
fn test_config_validate_reports_every_problem() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    fapiao()
        .arg("--config")
        .arg(&path)
        .args(["config", "init", "--with-layouts"])
        .assert()
        .success();
    fapiao()
        .arg("--config")
        .arg(&path)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid (2 layouts)"));

    let mut config: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    config["layouts"]["variants"][0]["keyword"] = json!("");
    config["layouts"]["variants"][1]["name"] = json!("electronic");
    config["parser"]["bounds_margin"] = json!(-5);
    write_json(&path, &config);

    fapiao()
        .arg("--config")
        .arg(&path)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bounds_margin must not be negative"))
        .stderr(predicate::str::contains("empty keyword matches every invoice"))
        .stderr(predicate::str::contains("layout electronic: duplicate name"))
        .stderr(predicate::str::contains("3 problem(s)"));
}
