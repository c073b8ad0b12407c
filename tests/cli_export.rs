use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// `shiftx` isolated under `home`, always in JSON mode.
fn shiftx(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("shiftx").unwrap();
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("SHIFTX_CONFIG", home.join("config.json"))
        .env("SHIFTX_ACTOR", "tester")
        .env_remove("SHIFTX_DB")
        .env_remove("SHIFTX_EXPORT_DIR")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(home.join("shiftx.db"))
        .arg("--export-dir")
        .arg(home.join("exports"))
        .arg("--json");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn setup(home: &Path) {
    shiftx(home).arg("init").assert().success();
    shiftx(home)
        .args(["employee", "add", "E001", "Aiko", "--department", "Hall"])
        .assert()
        .success();
    shiftx(home)
        .args(["employee", "add", "E002", "Ben"])
        .assert()
        .success();
}

#[test]
fn commands_require_init() {
    let home = TempDir::new().unwrap();

    let assert = shiftx(home.path())
        .args(["export", "--month", "2026-03"])
        .assert()
        .failure()
        .code(2);
    let err: Value = serde_json::from_slice(&assert.get_output().stderr).unwrap();
    assert_eq!(err["error"]["code"], "NOT_INITIALIZED");
}

#[test]
fn submission_triggers_versioned_export() {
    let home = TempDir::new().unwrap();
    setup(home.path());

    let first = stdout_json(shiftx(home.path()).args([
        "submission",
        "add",
        "--month",
        "2026-03",
        "--employee",
        "E001",
        "--entry",
        "2026-03-02=ok",
        "--entry",
        r#"2026-03-14=maybe@Mon, "AM" only"#,
    ]));
    let export = &first["export"];
    assert_eq!(export["run"]["status"], "success");
    assert_eq!(export["run"]["trigger"], "automatic");
    assert_eq!(export["run"]["actor"], "tester");
    assert_eq!(export["submissions"]["artifact"]["version"], 1);
    assert_eq!(export["submissions"]["diff"]["inserted"], 2);
    assert_eq!(export["roster"]["artifact"]["version"], 1);

    let csv_path = export["submissions"]["artifact"]["filePath"].as_str().unwrap();
    let csv = fs::read_to_string(csv_path).unwrap();
    assert_eq!(
        csv.lines().next().unwrap(),
        "submission_id,year_month,employee_id,employee_name,target_date,availability,time_range"
    );
    assert!(csv.contains(r#"2026-03-14,tentative,"Mon, ""AM"" only""#));

    // Nothing changed: same artifacts, no new version
    let manual = stdout_json(shiftx(home.path()).args(["export", "--month", "2026-03"]));
    assert_eq!(manual["changed"], false);
    assert_eq!(manual["run"]["trigger"], "manual");
    assert_eq!(manual["submissions"]["artifact"]["filePath"], csv_path);

    // A second employee's submission bumps only the submissions dataset
    let second = stdout_json(shiftx(home.path()).args([
        "submission",
        "add",
        "--month",
        "2026-03",
        "--employee",
        "E002",
        "--entry",
        "2026-03-03=ng",
    ]));
    assert_eq!(second["export"]["submissions"]["artifact"]["version"], 2);
    assert_eq!(second["export"]["submissions"]["diff"]["inserted"], 1);
    assert_eq!(second["export"]["roster"]["changed"], false);
    assert_eq!(second["export"]["roster"]["artifact"]["version"], 1);

    let dataset_dir = home.path().join("exports/submissions/202603");
    let csv_files = fs::read_dir(&dataset_dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|x| x == "csv"))
        .count();
    assert_eq!(csv_files, 2);
    assert!(dataset_dir.join("index.json").exists());

    let status = stdout_json(shiftx(home.path()).args(["status", "--month", "2026-03"]));
    assert_eq!(status["datasets"][0]["dataset"], "submissions/202603");
    assert_eq!(status["datasets"][0]["latest_version"], 2);
    assert_eq!(status["datasets"][0]["tracked_rows"], 3);
    assert_eq!(status["datasets"][1]["dataset"], "employees");

    let runs = stdout_json(shiftx(home.path()).args(["runs", "list", "--month", "2026-03"]));
    assert_eq!(runs["count"], 3);

    let run_id = runs["runs"][0]["id"].as_str().unwrap();
    let shown = stdout_json(shiftx(home.path()).args(["runs", "show", run_id]));
    assert_eq!(shown["run"]["status"], "success");
    assert_eq!(shown["items"].as_array().unwrap().len(), 2);
}

#[test]
fn export_of_empty_month_is_rejected() {
    let home = TempDir::new().unwrap();
    setup(home.path());

    let assert = shiftx(home.path())
        .args(["export", "--month", "2026-05"])
        .assert()
        .failure()
        .code(4);
    let err: Value = serde_json::from_slice(&assert.get_output().stderr).unwrap();
    assert_eq!(err["error"]["code"], "NO_RECORDS");
    assert!(!home.path().join("exports/submissions/202605").exists());

    let runs = stdout_json(shiftx(home.path()).args(["runs", "list"]));
    assert_eq!(runs["count"], 0);
}

#[test]
fn invalid_entry_is_rejected_with_suggestion() {
    let home = TempDir::new().unwrap();
    setup(home.path());

    let assert = shiftx(home.path())
        .args([
            "submission",
            "add",
            "--month",
            "2026-03",
            "--employee",
            "E001",
            "--entry",
            "2026-03-02=availble",
        ])
        .assert()
        .failure()
        .code(4);
    let err: Value = serde_json::from_slice(&assert.get_output().stderr).unwrap();
    assert!(
        err["error"]["message"]
            .as_str()
            .unwrap()
            .contains("did you mean 'available'")
    );
}
