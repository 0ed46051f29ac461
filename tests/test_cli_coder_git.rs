// tests/test_cli_coder_git.rs
// End-to-end: HTTP routes -> handlers -> CliCoder -> engine process -> git
#![cfg(unix)]


use axum::http::StatusCode;
use git2::{Repository, Signature};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use coder_api::coder::{CliCoder, EngineSettings};
use coder_api::server::{AppState, create_router};
use coder_api::shared;
use test_helpers::{body_json, empty_request, json_request};

/// Engine that appends the message to notes.txt and commits it
const COMMITTING_ENGINE: &str = r#"
printf '%s\n' "$2" >> notes.txt
git add notes.txt
git -c user.name=engine -c user.email=engine@example.com commit -q -m "engine: $2"
echo "Updated notes.txt"
"#;

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn init_repo_with_commit(dir: &Path) {
    let repo = Repository::init(dir).unwrap();
    fs::write(dir.join("notes.txt"), "start\n").unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("notes.txt")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
}

/// Engine that commits its edit and then exits with an error
const FAILING_AFTER_COMMIT_ENGINE: &str = r#"
printf '%s\n' "$2" >> notes.txt
git add notes.txt
git -c user.name=engine -c user.email=engine@example.com commit -q -m "engine: $2"
echo "lost connection" >&2
exit 1
"#;

fn create_app(dir: &TempDir) -> axum::Router {
    create_app_with_engine(dir, COMMITTING_ENGINE)
}

fn create_app_with_engine(dir: &TempDir, script: &str) -> axum::Router {
    let settings = EngineSettings {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string(), "engine".to_string()],
        model: None,
        timeout: Duration::from_secs(30),
    };
    let coder = CliCoder::new(dir.path(), settings).unwrap();
    create_router(AppState::new(shared(coder)))
}

#[tokio::test]
async fn test_chat_diff_undo_against_real_repo() {
    if !git_available() {
        println!("git not installed, skipping");
        return;
    }

    let dir = TempDir::new().unwrap();
    init_repo_with_commit(dir.path());
    let app = create_app(&dir);

    // Nothing committed by the engine yet
    let response = app
        .clone()
        .oneshot(empty_request("GET", "/api/diff"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({ "diff": "" }));

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/files/add", json!({ "file": "notes.txt" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/chat", json!({ "message": "remember milk" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["messages"][0]["content"], "Updated notes.txt");
    assert_eq!(body["edits"][0]["commit_message"], "engine: remember milk");
    assert_eq!(body["edits"][0]["fnames"], json!(["notes.txt"]));

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/api/diff"))
        .await
        .unwrap();
    let diff = body_json(response).await["diff"].as_str().unwrap().to_string();
    assert!(diff.contains("+remember milk"));

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/api/undo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
        "start\n"
    );

    // A second undo has nothing left to remove
    let response = app
        .oneshot(empty_request("POST", "/api/undo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_commit_before_engine_failure_can_be_undone() {
    if !git_available() {
        println!("git not installed, skipping");
        return;
    }

    let dir = TempDir::new().unwrap();
    init_repo_with_commit(dir.path());
    let app = create_app_with_engine(&dir, FAILING_AFTER_COMMIT_ENGINE);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/chat", json!({ "message": "buy eggs" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(
        body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("lost connection")
    );
    assert_eq!(body["edits"][0]["commit_message"], "engine: buy eggs");

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/api/diff"))
        .await
        .unwrap();
    let diff = body_json(response).await["diff"].as_str().unwrap().to_string();
    assert!(diff.contains("+buy eggs"));

    let response = app
        .oneshot(empty_request("POST", "/api/undo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
        "start\n"
    );
}

#[tokio::test]
async fn test_undo_without_repository_is_500() {
    let dir = TempDir::new().unwrap();
    if Repository::discover(dir.path()).is_ok() {
        return;
    }
    let app = create_app(&dir);

    let response = app
        .oneshot(empty_request("POST", "/api/undo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("no git repository")
    );
}
