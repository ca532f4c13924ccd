use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::Store;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::WebhookForwarder;

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub webhook: WebhookForwarder,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig, webhook: WebhookForwarder) -> Self {
        Self {
            store,
            config: Arc::new(config),
            webhook,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = DefaultBodyLimit::max(state.config.api.max_request_size_bytes);

    Router::new()
        // Public
        .route("/", get(public::health::root))
        .route("/health", get(public::health::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        .fallback(route_not_found)
        // Global middleware
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, records};

    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/records", get(records::list))
        .route("/records/summary", get(records::summary))
        .route("/records/invoice", post(records::invoice))
        .route("/records/statement", post(records::statement))
        .route("/records/balance", post(records::balance))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if config.security.cors_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
