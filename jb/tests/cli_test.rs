//! CLI tests for the jb binary

mod common;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use common::{FakeApi, Route, job_json};

fn jb(data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_jb"));
    cmd.env("XDG_DATA_HOME", data_dir.path())
        .env("XDG_CONFIG_HOME", data_dir.path())
        .env_remove("JOBBOARD_TOKEN")
        .current_dir(data_dir.path());
    cmd
}

fn write_config(dir: &TempDir, base_url: &str) -> std::path::PathBuf {
    let path = dir.path().join("jobboard.yml");
    let yaml = format!(
        "log-level: DEBUG\napi:\n  base-url: {}\n  user-id: u1\nfetch:\n  min-interval-ms: 500\n",
        base_url
    );
    fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    jb(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("my-jobs"))
        .stdout(predicate::str::contains("applicants"))
        .stdout(predicate::str::contains("review"));
}

#[test]
fn test_invalid_base_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "ftp://example.com");
    jb(&dir)
        .args(["--config", config.to_str().unwrap(), "jobs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_jobs_json_against_fake_api() {
    let api = FakeApi::start(vec![(
        "GET",
        "/api/jobs",
        Route::json(200, json!({"jobs": [job_json("j1", "Rust Engineer")], "total": 1})),
    )])
    .await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &api.base_url);

    let output = tokio::task::spawn_blocking(move || {
        let output = jb(&dir)
            .args(["--config", config.to_str().unwrap(), "jobs", "--format", "json"])
            .output()
            .unwrap();
        (output, dir)
    })
    .await
    .unwrap()
    .0;

    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["_id"], "j1");
    assert_eq!(records[0]["type"], "full-time");
    assert_eq!(api.hits("GET", "/api/jobs"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_applications_uses_configured_user() {
    let api = FakeApi::start(vec![(
        "GET",
        "/api/applications/user/u1",
        Route::json(
            200,
            json!([{
                "_id": "a1",
                "jobId": {"_id": "j1", "title": "Rust Engineer", "company": "Acme"},
                "userId": "u1",
                "status": "shortlisted"
            }]),
        ),
    )])
    .await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &api.base_url);

    let output = tokio::task::spawn_blocking(move || {
        let output = jb(&dir)
            .args(["--config", config.to_str().unwrap(), "applications"])
            .env("NO_COLOR", "1")
            .output()
            .unwrap();
        (output, dir)
    })
    .await
    .unwrap()
    .0;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shortlisted"));
    assert!(stdout.contains("Rust Engineer at Acme"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_delete_reports_server_message() {
    let api = FakeApi::start(vec![(
        "DELETE",
        "/api/jobs/j9",
        Route::json(404, json!({"message": "Job not found"})),
    )])
    .await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &api.base_url);

    let output = tokio::task::spawn_blocking(move || {
        let output = jb(&dir)
            .args(["--config", config.to_str().unwrap(), "delete", "j9"])
            .output()
            .unwrap();
        (output, dir)
    })
    .await
    .unwrap()
    .0;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Job not found"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_jobs_search_filters_locally() {
    let mut design = job_json("j2", "Product Designer");
    design["skills"] = json!(["figma"]);
    let api = FakeApi::start(vec![(
        "GET",
        "/api/jobs",
        Route::json(200, json!({"jobs": [job_json("j1", "Rust Engineer"), design], "total": 2})),
    )])
    .await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &api.base_url);

    let output = tokio::task::spawn_blocking(move || {
        let output = jb(&dir)
            .args(["--config", config.to_str().unwrap(), "jobs", "--search", "RUST", "--format", "json"])
            .output()
            .unwrap();
        (output, dir)
    })
    .await
    .unwrap()
    .0;

    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["j1"]);
    assert_eq!(api.hits("GET", "/api/jobs"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_applicant_dashboard_loads_both_lists() {
    let api = FakeApi::start(vec![
        (
            "GET",
            "/api/jobs",
            Route::json(200, json!({"jobs": [job_json("j1", "Rust Engineer")], "total": 1})),
        ),
        (
            "GET",
            "/api/applications/user/u1",
            Route::json(
                200,
                json!([
                    {"_id": "a1", "jobId": {"_id": "j1", "title": "Rust Engineer", "company": "Acme"}, "userId": "u1", "status": "hired"},
                    {"_id": "a2", "jobId": {"_id": "j3", "title": "SRE", "company": "Initech"}, "userId": "u1"}
                ]),
            ),
        ),
    ])
    .await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &api.base_url);

    let output = tokio::task::spawn_blocking(move || {
        let output = jb(&dir)
            .args(["--config", config.to_str().unwrap(), "dashboard"])
            .env("NO_COLOR", "1")
            .output()
            .unwrap();
        (output, dir)
    })
    .await
    .unwrap()
    .0;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("My applications (2)"));
    assert!(stdout.contains("applied 1  shortlisted 0  rejected 0  hired 1"));
    assert!(stdout.contains("SRE at Initech"));
    assert!(stdout.contains("Recent job openings"));
    assert_eq!(api.hits("GET", "/api/jobs"), 1);
    assert_eq!(api.hits("GET", "/api/applications/user/u1"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_employer_dashboard_reads_my_jobs() {
    let api = FakeApi::start(vec![
        ("GET", "/api/jobs", Route::json(200, json!({"jobs": [], "total": 0}))),
        (
            "GET",
            "/api/jobs/employer/my-jobs",
            Route::json(200, json!([job_json("j5", "Platform Lead")])),
        ),
    ])
    .await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &api.base_url);

    let output = tokio::task::spawn_blocking(move || {
        let output = jb(&dir)
            .args(["--config", config.to_str().unwrap(), "dashboard", "--employer"])
            .env("NO_COLOR", "1")
            .output()
            .unwrap();
        (output, dir)
    })
    .await
    .unwrap()
    .0;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Your jobs (1 posted, 3 applications)"));
    assert!(stdout.contains("Platform Lead"));
    assert_eq!(api.hits("GET", "/api/applications/user/u1"), 0);
}
