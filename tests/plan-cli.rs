use std::path::Path;

use assert_cmd::{assert::Assert, Command};
use predicates::prelude::*;

mod stubs;

fn write_driver(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("driver.json");
    std::fs::write(&path, content).unwrap();
    path
}

fn cmd_plan_assert(args: &[&str], env: &[(&str, &str)]) -> Assert {
    let mut cmd = Command::cargo_bin("regcache").unwrap();
    cmd.env_remove("REGCACHE_MAX_READ_WORDS");
    for (k, v) in env {
        cmd.env(k, v);
    }
    cmd.arg("plan").args(args).assert()
}

#[test]
fn plan_all_fields() {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write_driver(tempdir.path(), stubs::drivers::SAMPLE_METER);

    cmd_plan_assert(&[driver.to_str().unwrap()], &[])
        .success()
        .stdout("input_register 0-41 (42 words)\ninput_register 100-120 (21 words)\n");
}

#[test]
fn plan_config_group() {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write_driver(tempdir.path(), stubs::drivers::SAMPLE_METER);

    cmd_plan_assert(&["--group", "config", driver.to_str().unwrap()], &[])
        .success()
        .stdout("input_register 0-17 (18 words)\n");
}

#[test]
fn plan_runtime_with_small_reads() {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write_driver(tempdir.path(), stubs::drivers::SAMPLE_METER);
    let expected = "input_register 29-30 (2 words)\n\
                    input_register 40-41 (2 words)\n\
                    input_register 100-100 (1 word)\n\
                    input_register 120-120 (1 word)\n";

    cmd_plan_assert(
        &["--group", "runtime", "--max-words", "8", driver.to_str().unwrap()],
        &[],
    )
    .success()
    .stdout(expected);

    // same limit from the environment
    cmd_plan_assert(
        &["--group", "runtime", driver.to_str().unwrap()],
        &[("REGCACHE_MAX_READ_WORDS", "8")],
    )
    .success()
    .stdout(expected);
}

#[test]
fn plan_ignores_non_positive_max_words() {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write_driver(tempdir.path(), stubs::drivers::SAMPLE_METER);

    cmd_plan_assert(&["--max-words", "0", driver.to_str().unwrap()], &[])
        .success()
        .stdout(predicate::str::contains("input_register 0-41 (42 words)"));
}

#[test]
fn plan_rejects_bad_driver() {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write_driver(tempdir.path(), stubs::drivers::BAD_FNCODE);

    cmd_plan_assert(&[driver.to_str().unwrap()], &[])
        .failure()
        .stderr(predicate::str::contains("unsupported function code 9"));
}

#[test]
fn plan_rejects_bad_group() {
    let tempdir = tempfile::tempdir().unwrap();
    let driver = write_driver(tempdir.path(), stubs::drivers::SAMPLE_METER);

    cmd_plan_assert(&["--group", "hourly", driver.to_str().unwrap()], &[])
        .failure()
        .stderr(predicate::str::contains("Unknown read group 'hourly'"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("regcache")
        .unwrap()
        .arg("poll")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Subcommand must be one of 'plan', 'decode'",
        ));
}
