use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use identra_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the caller identity from the bearer token and stores it in
/// the request extensions for the handlers.
pub async fn require_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("bearer token required".to_owned()))?;

    let caller = state.token_verifier.verify(token)?;

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
