use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};

mod stubs;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn decode_output(driver: &str, dump: &str) -> Value {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write(tempdir.path(), "driver.json", driver);
    let dump = write(tempdir.path(), "dump.txt", dump);

    let output = Command::cargo_bin("regcache")
        .unwrap()
        .arg("decode")
        .arg(&driver)
        .arg(&dump)
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn decode_sample_meter() {
    let values = decode_output(stubs::drivers::SAMPLE_METER, stubs::dumps::SAMPLE_METER);
    assert_eq!(
        values,
        json!({
            "InfoModel": 4051,
            "InfoName": "METER1",
            "InfoSerialNumber": 12345,
            "MeterEnergy": "655.36",
            "MeterFrequency": "60.0",
            "MeterPower": null,
            "StatusFlags": null,
        })
    );
}

#[test]
fn decode_least_significant_word_first() {
    let values = decode_output(stubs::drivers::LSR_METER, stubs::dumps::LSR_METER);
    assert_eq!(values["Energy"], json!(0x0001_2345));
    assert_eq!(values["Power"], json!(325218.8125));
}

#[test]
fn decode_reports_dump_line() {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write(tempdir.path(), "driver.json", stubs::drivers::SAMPLE_METER);
    let dump = write(tempdir.path(), "dump.txt", stubs::dumps::MALFORMED);

    Command::cargo_bin("regcache")
        .unwrap()
        .arg("decode")
        .arg(&driver)
        .arg(&dump)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Line 2: expected 'ADDRESS: WORDS'"));
}

#[test]
fn decode_missing_dump_file() {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write(tempdir.path(), "driver.json", stubs::drivers::SAMPLE_METER);

    Command::cargo_bin("regcache")
        .unwrap()
        .arg("decode")
        .arg(&driver)
        .arg(tempdir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read dump"));
}
