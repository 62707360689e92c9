//! User identifiers and new-account validation rules.
//!
//! Validation collects every violated field instead of failing fast so
//! one response tells the client everything that needs fixing.

use identra_core::{AppError, AppResult, FieldViolation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier assigned by the identity provider when an account
/// is created. Never generated locally; only parsed from provider output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a user identifier from its textual UUID form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::validation("id", "Id must be a valid UUID"))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Immutable new-account request, built once from the wire payload and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    /// Desired login name; uniqueness is enforced by the identity provider.
    pub username: String,
    /// Contact email address.
    pub email: String,
    /// Initial plaintext password, handed to the provider once.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Minimum accepted password length.
pub const PASSWORD_MIN_LENGTH: usize = 4;

/// Maximum accepted password length.
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validates a new-account request before any remote call is made.
///
/// Checks run in order (username, email, password) and ALL violations are
/// collected into a single `AppError::Validation`.
pub fn validate_create_user(request: &CreateUserRequest) -> AppResult<()> {
    let mut violations = Vec::new();

    if request.username.trim().is_empty() {
        violations.push(FieldViolation::new(
            "username",
            "Username should not be blank",
        ));
    }

    if !is_valid_email(&request.email) {
        violations.push(FieldViolation::new("email", "Email should be valid"));
    }

    if let Some(violation) = password_violation(&request.password) {
        violations.push(violation);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

/// Structural email check: non-empty, exactly one `@`, non-empty local
/// part, dotted domain, at most 254 characters.
fn is_valid_email(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 254 {
        return false;
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };

    !local.is_empty() && !domain.is_empty() && domain.contains('.') && !domain.contains('@')
}

fn password_violation(password: &str) -> Option<FieldViolation> {
    let char_count = password.chars().count();

    if char_count < PASSWORD_MIN_LENGTH {
        return Some(FieldViolation::new(
            "password",
            format!("Password should be at least {PASSWORD_MIN_LENGTH} characters"),
        ));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Some(FieldViolation::new(
            "password",
            format!("Password should not exceed {PASSWORD_MAX_LENGTH} characters"),
        ));
    }

    None
}
