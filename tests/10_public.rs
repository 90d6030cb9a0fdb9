mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn ping_returns_pong() -> Result<()> {
    let server = common::ensure_server().await?;
    let resp = reqwest::get(server.url("/ping")).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "pong");
    assert!(body.get("data").is_none());
    Ok(())
}

#[tokio::test]
async fn health_reports_database_state() -> Result<()> {
    let server = common::ensure_server().await?;
    let resp = reqwest::get(server.url("/health")).await?;
    let status = resp.status();
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status {}",
        status
    );

    let body: Value = resp.json().await?;
    assert_eq!(body["success"], status == StatusCode::OK);
    assert!(body["data"]["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_404() -> Result<()> {
    let server = common::ensure_server().await?;
    let resp = reqwest::get(server.url("/api/v1/does-not-exist")).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = resp.json().await?;
    assert_eq!(body, serde_json::json!({ "success": false, "message": "Route not found" }));
    Ok(())
}

#[tokio::test]
async fn responses_carry_security_headers() -> Result<()> {
    let server = common::ensure_server().await?;
    let resp = reqwest::get(server.url("/ping")).await?;
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "SAMEORIGIN");
    Ok(())
}

#[tokio::test]
async fn cors_allows_configured_origin() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let resp = client
        .request(reqwest::Method::OPTIONS, server.url("/api/v1/products/all"))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .send()
        .await?;
    assert!(resp.status().is_success());
    assert_eq!(resp.headers()["access-control-allow-origin"], "http://localhost:5173");
    assert_eq!(resp.headers()["access-control-allow-credentials"], "true");

    let resp = client
        .get(server.url("/ping"))
        .header("Origin", "http://evil.example")
        .send()
        .await?;
    assert!(resp.headers().get("access-control-allow-origin").is_none());
    Ok(())
}
