mod common;

use anyhow::Result;
use common::API;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_with_empty_body_lists_field_errors() -> Result<()> {
    let server = common::ensure_server().await?;
    let resp = reqwest::Client::new()
        .post(server.url(&format!("{}/auth/register", API)))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await?;
    assert_eq!(body["success"], false);
    for field in ["firstName", "lastName", "email", "password"] {
        assert!(body["errors"][field].is_string(), "missing error for {}", field);
    }
    Ok(())
}

#[tokio::test]
async fn register_rejects_weak_password() -> Result<()> {
    let server = common::ensure_server().await?;
    let resp = reqwest::Client::new()
        .post(server.url(&format!("{}/auth/register", API)))
        .json(&json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "password": "short",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await?;
    assert!(body["errors"]["password"].is_string());
    assert!(body["errors"].get("email").is_none());
    Ok(())
}

#[tokio::test]
async fn login_requires_credentials() -> Result<()> {
    let server = common::ensure_server().await?;
    let resp = reqwest::Client::new()
        .post(server.url(&format!("{}/auth/login", API)))
        .json(&json!({ "email": "" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let resp = reqwest::Client::new()
        .post(server.url(&format!("{}/auth/login", API)))
        .header("Content-Type", "application/json")
        .body("{\"email\":")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await?;
    assert_eq!(body["success"], false);
    Ok(())
}
