use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use identra_core::AppError;
use serde::Serialize;
use tracing::{debug, error};

/// Generic API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            // Field-tagged map so the client sees every violation at once.
            AppError::Validation(violations) => {
                let fields: BTreeMap<String, String> = violations
                    .into_iter()
                    .map(|violation| (violation.field, violation.message))
                    .collect();
                (StatusCode::BAD_REQUEST, Json(fields)).into_response()
            }
            AppError::NotFound(detail) => {
                debug!(%detail, "resource not found");
                generic(StatusCode::NOT_FOUND, "not found")
            }
            AppError::Unauthorized(detail) => {
                debug!(%detail, "request not authenticated");
                generic(StatusCode::UNAUTHORIZED, "authentication required")
            }
            AppError::Forbidden(detail) => {
                debug!(%detail, "request denied");
                generic(StatusCode::FORBIDDEN, "access denied")
            }
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse { message }),
            )
                .into_response(),
            gateway @ AppError::Gateway { .. } => {
                error!(error = %gateway, "identity provider call failed");
                generic(StatusCode::BAD_GATEWAY, "identity provider request failed")
            }
            consistency @ AppError::Consistency { .. } => {
                error!(error = %consistency, "account left in inconsistent state");
                generic(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                generic(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

fn generic(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            message: message.to_owned(),
        }),
    )
        .into_response()
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
