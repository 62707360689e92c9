//! Shared primitives for all Rust crates in Identra.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::CallerIdentity;

/// Result type used across Identra crates.
pub type AppResult<T> = Result<T, AppError>;

/// One field-level violation detected while validating a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Name of the request field that failed validation.
    pub field: String,
    /// Human-readable message describing the violation.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation for the given field.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for FieldViolation {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}: {}", self.field, self.message)
    }
}

/// Remote identity-provider operation that a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStep {
    /// Service-account authentication against the provider.
    Authenticate,
    /// Account creation.
    CreateAccount,
    /// Initial credential assignment.
    AssignCredential,
    /// Compensating account deletion.
    DeleteAccount,
    /// Basic profile lookup.
    FetchProfile,
    /// Realm role-mapping lookup.
    FetchRoles,
    /// Group-membership lookup.
    FetchGroups,
}

impl GatewayStep {
    /// Returns the stable diagnostic name for this step.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::CreateAccount => "create_account",
            Self::AssignCredential => "assign_credential",
            Self::DeleteAccount => "delete_account",
            Self::FetchProfile => "fetch_profile",
            Self::FetchRoles => "fetch_roles",
            Self::FetchGroups => "fetch_groups",
        }
    }
}

impl Display for GatewayStep {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more request fields violated validation rules.
    #[error("validation failed: {}", describe_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Write operation conflicts with existing identity-provider state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A remote identity-provider call failed.
    #[error("identity provider call '{step}' failed: {message}")]
    Gateway {
        /// The remote operation that failed.
        step: GatewayStep,
        /// Diagnostic detail for server-side logs.
        message: String,
    },

    /// A partially completed mutation could not be rolled back.
    #[error(
        "account left inconsistent after failed '{step}': {message}; rollback failed: {rollback_message}"
    )]
    Consistency {
        /// The remote operation whose failure triggered the rollback.
        step: GatewayStep,
        /// Diagnostic detail for the original failure.
        message: String,
        /// Diagnostic detail for the failed compensating action.
        rollback_message: String,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Creates a validation error carrying a single field violation.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }
}

fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
