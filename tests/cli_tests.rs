//! CLI integration tests using assert_cmd.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = "fullName,email,belt,evaluatedOn,homeworkCombinedScore,attendanceDiligenceScore,characterGratitudeNotesScore,characterLeadershipScore,physicalSquatsScore,physicalJumpingJacksScore,technicalPoomsaeScore,technicalSparringScore,technicalKicksScore,technicalBreakingScore,overallComment,sourceKey";

fn dojang() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("dojang-evaluation").unwrap();
    cmd.env_remove("DATABASE_URL");
    cmd
}

fn sheet(dir: &TempDir, rows: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join("sheet.csv");
    let mut content = format!("{HEADER}\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn grade_prints_total_and_letter() {
    let dir = TempDir::new().unwrap();
    let csv = sheet(
        &dir,
        &[
            "Mina Park,mina@example.com,blue,2026-03-14,8,9,7,8,6,7,8,7,8,6,Sharp kicks,",
            "Joon Kim,joon@example.com,green,2026-03-14,5,5,5,5,5,5,5,5,5,5,,",
        ],
    );

    dojang()
        .arg("grade")
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Mina Park (mina@example.com, blue belt) total 79 grade B PASS [complete]",
        ))
        .stdout(predicate::str::contains("total 50 grade F FAIL"));
}

#[test]
fn grade_marks_partial_sheets_in_progress() {
    let dir = TempDir::new().unwrap();
    let csv = sheet(
        &dir,
        &["Sora Lee,sora@example.com,blue,2026-03-15,6,7,5,6,7,6,0,5,6,0,,"],
    );

    dojang()
        .args(["grade", "--csv"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("total 48 grade F FAIL [in progress]"));
}

#[test]
fn grade_json_exposes_calculation() {
    let dir = TempDir::new().unwrap();
    let csv = sheet(
        &dir,
        &["Mina Park,mina@example.com,blue,2026-03-14,8,9,7,8,6,7,8,7,8,6,,"],
    );

    let output = dojang()
        .args(["grade", "--format", "json", "--csv"])
        .arg(&csv)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &value[0];
    assert_eq!(first["evaluation"]["totalScore"], 79);
    assert_eq!(first["evaluation"]["grade"], "B");
    assert_eq!(first["evaluation"]["passed"], true);
    assert_eq!(first["evaluation"]["categoryAverages"]["technical"], 7.25);
    assert_eq!(first["evaluation"]["radarData"]["체력"], 6.5);
    assert_eq!(first["scores"]["technicalBreakingScore"], 6);
    assert_eq!(first["status"], "complete");
}

#[test]
fn grade_rejects_out_of_range_scores() {
    let dir = TempDir::new().unwrap();
    let csv = sheet(
        &dir,
        &["Mina Park,mina@example.com,blue,2026-03-14,8,9,7,8,6,7,8,7,12,6,,"],
    );

    dojang()
        .args(["grade", "--csv"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"))
        .stderr(predicate::str::contains("technicalKicksScore out of range: 12"));
}

#[test]
fn grade_rejects_missing_scores() {
    let dir = TempDir::new().unwrap();
    let csv = sheet(
        &dir,
        &["Mina Park,mina@example.com,blue,2026-03-14,,9,7,8,6,7,8,7,8,6,,"],
    );

    dojang()
        .args(["grade", "--csv"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing score for homeworkCombinedScore"));
}

#[test]
fn grade_nonexistent_file() {
    dojang()
        .args(["grade", "--csv", "nonexistent.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn report_requires_database_url() {
    let dir = TempDir::new().unwrap();

    dojang()
        .current_dir(dir.path())
        .arg("report")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL must be set"));
}

#[test]
fn report_scope_is_exclusive() {
    dojang()
        .args(["report", "--belt", "blue", "--email", "mina@example.com"])
        .assert()
        .failure();
}
