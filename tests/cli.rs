mod common;

use std::fs;

use assert_cmd::Command;
use common::{Scratch, fixture};
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;

fn flatload() -> Command {
    Command::cargo_bin("flatload").expect("binary exists")
}

fn path_arg(path: &std::path::Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn profile_reports_inferred_types() {
    let input = fixture("customers.csv");
    flatload()
        .args([
            "profile",
            "-i",
            path_arg(&input),
            "--delimiter",
            "comma",
            "--header-line",
            "1",
        ])
        .assert()
        .success()
        .stdout(contains("balance"))
        .stdout(contains("numeric(6,2)"))
        .stdout(contains("datetime"))
        .stdout(contains("varchar(13)"));
}

#[test]
fn profile_prints_aligned_ddl() {
    let input = fixture("customers.csv");
    flatload()
        .args([
            "profile",
            "-i",
            path_arg(&input),
            "--delimiter",
            ",",
            "--header-line",
            "1",
            "--ddl",
            "--table",
            "stage.customers",
        ])
        .assert()
        .success()
        .stdout(contains("create table stage.customers\n(\n"))
        .stdout(contains("     id      int\n"))
        .stdout(contains("    ,name    varchar(50)\n"))
        .stdout(contains("    ,balance numeric(6,2)\n"))
        .stdout(contains("    ,notes   varchar(20)\n);"));
}

#[test]
fn profile_writes_report_and_frequency_file() {
    let scratch = Scratch::new();
    let report = scratch.path("profile.json");
    let freq = scratch.path("freq.txt");
    let config = scratch.file(
        "load.yaml",
        "delimiter: pipe\nheader_line: 1\nsplits:\n  state: ':'\nprofile:\n  frequencies: true\n",
    );
    let input = fixture("zips.psv");
    flatload()
        .args([
            "profile",
            "-i",
            path_arg(&input),
            "--config",
            path_arg(&config),
            "--report",
            path_arg(&report),
            "--freq-file",
            path_arg(&freq),
        ])
        .assert()
        .success();

    let parsed: Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("read report")).expect("json");
    assert_eq!(parsed["records"], 3);
    let columns = parsed["columns"].as_array().expect("columns");
    let names = columns
        .iter()
        .map(|c| c["name"].as_str().expect("name"))
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["code", "state", "state_descr", "population"]);
    assert_eq!(columns[0]["sql_type"], "int");
    assert_eq!(columns[2]["sql_type"], "varchar(8)");
    assert!(columns[1]["frequencies"].is_array());

    let frequencies = fs::read_to_string(&freq).expect("read freq file");
    assert!(frequencies.starts_with("FLD: code (3)\n=============\nValue\tCount\n=====\t=====\n"));
    assert!(frequencies.contains("FLD: state_descr (3)"));
    assert!(frequencies.contains("new york\t1\n"));
}

#[test]
fn auto_delimiter_failure_is_fatal() {
    let input = fixture("customers.csv");
    flatload()
        .args(["profile", "-i", path_arg(&input)])
        .assert()
        .failure()
        .stderr(contains("unable to determine the delimiter"));
}

#[test]
fn detect_prints_delimiter_name() {
    let input = fixture("zips.psv");
    flatload()
        .args(["detect", "-i", path_arg(&input)])
        .assert()
        .success()
        .stdout("pipe\n");
}

#[test]
fn detect_rejects_stdin() {
    flatload()
        .args(["detect", "-i", "-"])
        .write_stdin("a,b\n")
        .assert()
        .failure()
        .stderr(contains("stdin can only be read once"));
}

#[test]
fn preview_limits_rows() {
    let input = fixture("customers.csv");
    flatload()
        .args([
            "preview",
            "-i",
            path_arg(&input),
            "--delimiter",
            "comma",
            "--header-line",
            "1",
            "--rows",
            "1",
        ])
        .assert()
        .success()
        .stdout(contains("Ada Lovelace"))
        .stdout(contains("likes \"math\""))
        .stdout(contains("Alan Turing").not());
}

#[test]
fn preview_reads_stdin_with_explicit_delimiter() {
    flatload()
        .args(["preview", "-i", "-", "--delimiter", "tab"])
        .write_stdin("x\ty\n1\t2\n")
        .assert()
        .success()
        .stdout(contains("col0  col1"))
        .stdout(contains("x     y"));
}

#[test]
fn prep_writes_tab_delimited_records() {
    let scratch = Scratch::new();
    let output = scratch.path("customers.prep");
    let input = fixture("customers.csv");
    flatload()
        .args([
            "prep",
            "-i",
            path_arg(&input),
            "--delimiter",
            "comma",
            "--skip-lines",
            "1",
            "-o",
            path_arg(&output),
        ])
        .assert()
        .success();

    let written = fs::read_to_string(&output).expect("read prep");
    assert_eq!(
        written,
        "1\tAda Lovelace\t1200.50\t2021-03-04\tlikes \"math\"\n\
         2\tHopper, Grace\t-35.25\t2020-12-31\t\n\
         3\tAlan Turing\t0.75\t1999-07-15\tmulti line\n"
    );
}

#[test]
fn prep_to_stdout_honours_max_rows_and_splits() {
    let input = fixture("zips.psv");
    flatload()
        .args([
            "prep",
            "-i",
            path_arg(&input),
            "--delimiter",
            "pipe",
            "--header-line",
            "1",
            "--split",
            "state",
            "--max-rows",
            "2",
        ])
        .assert()
        .success()
        .stdout("21201\tMD\tMaryland\t620961\n22301\tVA\tVirginia\t159467\n");
}

#[test]
fn unmatched_split_is_an_error() {
    let input = fixture("zips.psv");
    flatload()
        .args([
            "prep",
            "-i",
            path_arg(&input),
            "--delimiter",
            "pipe",
            "--header-line",
            "1",
            "--split",
            "county=:",
        ])
        .assert()
        .failure()
        .stderr(contains("matched no columns: county"));
}

#[test]
fn fixed_width_layout_is_derived() {
    let input = fixture("layout.txt");
    flatload()
        .args(["preview", "-i", path_arg(&input), "--fixed", "auto"])
        .assert()
        .success()
        .stdout(contains("col0  col1  col2"))
        .stdout(contains("abc   d     e"));
}

#[test]
fn inconsistent_fixed_width_file_is_not_parseable() {
    let scratch = Scratch::new();
    let input = scratch.file("ragged.txt", "AAAA BBBBB CCCCCCCC DDD\nAA BBBBB CCCCCCCC DDD\n");
    flatload()
        .args(["profile", "-i", path_arg(&input), "--fixed", "auto"])
        .assert()
        .failure()
        .stderr(contains("does not exhibit a consistent fixed-width format"));
}

#[test]
fn explicit_widths_and_column_file() {
    let scratch = Scratch::new();
    let columns = scratch.file("cols.txt", "first\nsecond\nthird\n");
    let input = fixture("layout.txt");
    flatload()
        .args([
            "preview",
            "-i",
            path_arg(&input),
            "--fixed",
            "5,5,4",
            "--col-file",
            path_arg(&columns),
        ])
        .assert()
        .success()
        .stdout(contains("first  second  third"))
        .stdout(contains("x      yy      zzzz"));
}
