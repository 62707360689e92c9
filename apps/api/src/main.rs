//! Identra API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod router;
mod state;

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use identra_application::{AccessControlGuard, UserService};
use identra_core::AppError;
use identra_infrastructure::KeycloakGateway;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::auth::TokenVerifier;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let token_verifier = Arc::new(TokenVerifier::from_config(&config.token_verification)?);

    let gateway = Arc::new(KeycloakGateway::new(
        reqwest::Client::new(),
        config.keycloak.clone(),
    ));
    let guard = AccessControlGuard::new(config.privileged_role.clone());
    let user_service = UserService::new(gateway, guard);

    let app_state = AppState {
        user_service,
        token_verifier,
    };

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&config.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = router::build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "identra-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
