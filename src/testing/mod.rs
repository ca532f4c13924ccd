//! Helpers for driving the router in-process against the memory store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::app::{app, AppState};
use crate::auth::{generate_jwt, Claims, PasswordHash};
use crate::config::AppConfig;
use crate::database::models::{NewUser, User};
use crate::database::MemoryStore;
use crate::services::WebhookForwarder;

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "correct horse battery";

/// An application over a fresh memory store with cheap password hashing
pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::development();
        config.security.jwt_secret = TEST_JWT_SECRET.to_string();
        config.security.bcrypt_cost = 4;
        customize(&mut config);

        Self {
            state: AppState::new(
                Arc::new(MemoryStore::new()),
                config,
                WebhookForwarder::disabled(),
            ),
        }
    }

    pub fn router(&self) -> Router {
        app(self.state.clone())
    }

    /// Store a user with [TEST_PASSWORD] and mint a token for it
    pub async fn user(&self, username: &str) -> (User, String) {
        let password_hash = PasswordHash::from_raw_password(TEST_PASSWORD, 4).unwrap();
        let user = self
            .state
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash,
            })
            .await
            .unwrap();

        let token = generate_jwt(&Claims::new(user.id, &user.username, 1), TEST_JWT_SECRET).unwrap();
        (user, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }
}
