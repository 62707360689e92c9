use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use crate::state::AppState;
use crate::{handlers, middleware};

/// Builds the API router: a public health probe plus the
/// bearer-authenticated user routes.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/users", post(handlers::create_user_handler))
        .route("/api/users/hello", get(handlers::hello_handler))
        .route("/api/users/{id}", get(handlers::get_user_handler))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_caller,
        ));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .merge(protected)
        .with_state(state)
}
