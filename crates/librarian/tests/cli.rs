//! Runs the `librarian` binary against mock backends.

use std::process::Output;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::process::Command;

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn unreachable_backend() -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    format!("http://{addr}")
}

/// Run the binary with an isolated config directory
async fn librarian(config_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_librarian"))
        .args(args)
        .env("LIBRARIAN_CONFIG_DIR", config_dir.path())
        .env_remove("LIBRARIAN_API_BASE")
        .env_remove("LIBRARIAN_DEFAULT_K")
        .env_remove("LIBRARIAN_LOG")
        .output()
        .await
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn health_router(ok: bool) -> Router {
    Router::new().route("/api/health", get(move || async move { Json(json!({ "ok": ok })) }))
}

async fn echo_chat(Json(request): Json<Value>) -> Json<Value> {
    Json(json!({
        "answer": format!("k={} {}", request["k"], request["question"].as_str().unwrap_or(""))
    }))
}

#[tokio::test]
async fn test_ask_prints_answer() {
    let base = spawn_backend(Router::new().route("/api/chat", post(echo_chat))).await;
    let config = TempDir::new().unwrap();

    let output = librarian(
        &config,
        &["ask", "  Ce este 1984?  ", "--k", "5", "--api-base", &base],
    )
    .await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "k=5 Ce este 1984?\n");
}

#[tokio::test]
async fn test_ask_uses_default_k() {
    let base = spawn_backend(Router::new().route("/api/chat", post(echo_chat))).await;
    let config = TempDir::new().unwrap();

    let output = librarian(&config, &["ask", "q", "--api-base", &base]).await;

    assert_eq!(stdout(&output), "k=3 q\n");
}

#[tokio::test]
async fn test_ask_reports_http_error() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "internal error") }),
    );
    let base = spawn_backend(app).await;
    let config = TempDir::new().unwrap();

    let output = librarian(&config, &["ask", "q", "--api-base", &base]).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("500 internal error"));
}

#[tokio::test]
async fn test_ask_rejects_k_out_of_range() {
    let config = TempDir::new().unwrap();
    let output = librarian(&config, &["ask", "q", "--k", "9"]).await;

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
}

#[tokio::test]
async fn test_health_ok() {
    let base = spawn_backend(health_router(true)).await;
    let config = TempDir::new().unwrap();

    let output = librarian(&config, &["health", "--api-base", &base]).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Health: OK\n");
}

#[tokio::test]
async fn test_health_degraded_fails() {
    let base = spawn_backend(health_router(false)).await;
    let config = TempDir::new().unwrap();

    let output = librarian(&config, &["health", "--api-base", &base]).await;

    assert!(!output.status.success());
    assert_eq!(stdout(&output), "Health: Probleme\n");
}

#[tokio::test]
async fn test_health_unreachable() {
    let base = unreachable_backend().await;
    let config = TempDir::new().unwrap();

    let output = librarian(&config, &["health", "--api-base", &base]).await;

    assert!(!output.status.success());
    assert_eq!(stdout(&output), "Health: Eroare\n");
}

#[tokio::test]
async fn test_config_file_supplies_api_base() {
    let base = spawn_backend(health_router(true)).await;
    let config = TempDir::new().unwrap();
    std::fs::write(
        config.path().join("config.toml"),
        format!("api_base = \"{base}/\"\n"),
    )
    .unwrap();

    let output = librarian(&config, &["health"]).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Health: OK\n");
}

#[tokio::test]
async fn test_flag_overrides_config_file() {
    let base = spawn_backend(health_router(true)).await;
    let config = TempDir::new().unwrap();
    let unreachable = unreachable_backend().await;
    std::fs::write(
        config.path().join("config.toml"),
        format!("api_base = \"{unreachable}\"\n"),
    )
    .unwrap();

    let output = librarian(&config, &["health", "--api-base", &base]).await;

    assert_eq!(stdout(&output), "Health: OK\n");
}
