mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_login_and_whoami() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let email = format!("{}@example.com", uuid::Uuid::new_v4().simple());

    let res = client
        .post(server.url("/auth/register"))
        .json(&json!({ "username": &email[..20], "email": email, "password": "long-enough-pw" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(server.url("/auth/login"))
        .json(&json!({ "email": email, "password": "long-enough-pw" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let token = body["token"].as_str().unwrap_or_default().to_string();

    let res = client
        .get(server.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await?;
    assert_eq!(me["user"]["email"], email);
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let name = format!("dup_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
    let body = json!({
        "username": name,
        "email": format!("{}@example.com", name),
        "password": "long-enough-pw"
    });

    let first = client.post(server.url("/auth/register")).json(&body).send().await?;
    let second = client.post(server.url("/auth/register")).json(&body).send().await?;

    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let missing = client.get(server.url("/records")).send().await?;
    let bogus = client
        .get(server.url("/records"))
        .bearer_auth("definitely.not.valid")
        .send()
        .await?;

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
    let body: Value = bogus.json().await?;
    assert!(body["message"].is_string());
    Ok(())
}
