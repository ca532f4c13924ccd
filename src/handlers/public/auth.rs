// handlers/public/auth.rs - POST /auth/register and POST /auth/login

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::{generate_jwt, Claims, PasswordError, PasswordHash};
use crate::database::models::{NewUser, User, UserView};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::{ApiResponse, ApiResult};

const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=50;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token plus the public view of the user it was issued for
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserView,
}

/**
 * POST /auth/register - Create an account and receive a JWT
 *
 * Expected Input:
 * ```json
 * { "username": "alice", "email": "alice@example.com", "password": "at least 8 chars" }
 * ```
 *
 * Responds 201 with `{message, token, user}`; 409 when the email or
 * username is already registered.
 */
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
    let Json(payload) = payload?;

    let username = non_empty(payload.username);
    let email = non_empty(payload.email).map(|e| e.to_lowercase());
    let password = payload.password.filter(|p| !p.is_empty());

    let (username, email, password) = match (username, email, password) {
        (Some(username), Some(email), Some(password)) => (username, email, password),
        (username, email, password) => {
            let missing = missing_of(&[
                ("username", username.is_some()),
                ("email", email.is_some()),
                ("password", password.is_some()),
            ]);
            return Err(ApiError::missing_fields(
                "Please provide username, email and password",
                &missing,
            ));
        }
    };

    let mut field_errors = FieldErrors::new();
    if !USERNAME_LENGTH.contains(&username.chars().count()) {
        field_errors.insert(
            "username".to_string(),
            format!(
                "Username must be between {} and {} characters",
                USERNAME_LENGTH.start(),
                USERNAME_LENGTH.end()
            ),
        );
    }
    if !is_plausible_email(&email) {
        field_errors.insert("email".to_string(), "Please provide a valid email".to_string());
    }
    if password.chars().count() < crate::auth::password::MIN_PASSWORD_LENGTH {
        field_errors.insert("password".to_string(), PasswordError::TooShort.to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Invalid registration details", Some(field_errors)));
    }

    let cost = state.config.security.bcrypt_cost;
    let password_hash =
        tokio::task::spawn_blocking(move || PasswordHash::from_raw_password(&password, cost)).await??;

    let user = state
        .store
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    tracing::info!("Registered user {}", user.username);

    Ok(ApiResponse::created(AuthResponse {
        message: "User registered successfully",
        token: issue_token(&state, &user)?,
        user: UserView::from(&user),
    }))
}

/**
 * POST /auth/login - Exchange credentials for a JWT
 *
 * Expected Input:
 * ```json
 * { "email": "alice@example.com", "password": "..." }
 * ```
 *
 * Unknown emails and wrong passwords get the same 401 response.
 */
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
    let Json(payload) = payload?;

    let email = non_empty(payload.email).map(|e| e.to_lowercase());
    let password = payload.password.filter(|p| !p.is_empty());
    let (email, password) = match (email, password) {
        (Some(email), Some(password)) => (email, password),
        (email, password) => {
            let missing = missing_of(&[("email", email.is_some()), ("password", password.is_some())]);
            return Err(ApiError::missing_fields("Please provide email and password", &missing));
        }
    };

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || stored_hash.verify(&password))
        .await?
        .map_err(PasswordError::from)?;
    if !matches {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    tracing::info!("User {} logged in", user.username);

    Ok(ApiResponse::success(AuthResponse {
        message: "Login successful",
        token: issue_token(&state, &user)?,
        user: UserView::from(&user),
    }))
}

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    let claims = Claims::new(user.id, &user.username, state.config.security.jwt_expiry_hours);
    Ok(generate_jwt(&claims, &state.config.security.jwt_secret)?)
}

fn missing_of<'a>(fields: &[(&'a str, bool)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `local@domain.tld` with no whitespace; deliverability is not checked.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestApp, TEST_PASSWORD};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn register_login_and_me_round_trip() {
        let app = TestApp::new();

        let (status, registered) = app
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "username": "alice",
                    "email": " Alice@Example.com ",
                    "password": "s3cret-enough"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(registered["user"]["email"], "alice@example.com");
        assert!(registered["user"].get("passwordHash").is_none());
        assert!(registered["token"].is_string());

        let (status, logged_in) = app
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "alice@example.com", "password": "s3cret-enough" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = logged_in["token"].as_str().unwrap();

        let (status, me) = app.get("/auth/me", token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["user"]["username"], "alice");
        assert_eq!(me["user"]["id"], registered["user"]["id"]);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = TestApp::new();
        app.user("alice").await;

        let (status, body) = app
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "username": "alice",
                    "email": "alice@example.com",
                    "password": "another-password"
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn registration_details_are_validated() {
        let app = TestApp::new();

        let (status, body) = app
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "username": "al", "email": "nope", "password": "short" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = body["fieldErrors"].as_object().unwrap();
        assert!(errors.contains_key("username"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));

        let (status, body) = app
            .request(Method::POST, "/auth/register", None, Some(json!({ "username": "alice" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fieldErrors"]["email"], "This field is required");
        assert!(body["fieldErrors"].get("username").is_none());
    }

    #[tokio::test]
    async fn wrong_credentials_get_the_same_answer() {
        let app = TestApp::new();
        app.user("alice").await;

        let (wrong_password, body) = app
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "alice@example.com", "password": "not the password" })),
            )
            .await;
        let (unknown_email, other) = app
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "nobody@example.com", "password": TEST_PASSWORD })),
            )
            .await;

        assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
        assert_eq!(body, other);
    }

    #[tokio::test]
    async fn seeded_user_can_log_in() {
        let app = TestApp::new();
        app.user("alice").await;

        let (status, body) = app
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "alice@example.com", "password": TEST_PASSWORD })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
    }

    #[tokio::test]
    async fn token_for_a_deleted_or_unknown_user_is_rejected() {
        let app = TestApp::new();
        let token = generate_jwt(
            &Claims::new(uuid::Uuid::new_v4(), "ghost", 1),
            crate::testing::TEST_JWT_SECRET,
        )
        .unwrap();

        let (status, _) = app.get("/auth/me", &token).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(is_plausible_email("alice@example.com"));
        assert!(!is_plausible_email("alice"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("alice@localhost"));
        assert!(!is_plausible_email("alice@example."));
        assert!(!is_plausible_email("al ice@example.com"));
    }

    #[test]
    fn blank_values_count_as_missing() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(" bob ".to_string())), Some("bob".to_string()));
    }
}
