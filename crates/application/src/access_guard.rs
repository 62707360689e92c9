//! Role-based access control evaluated before any use case runs.

use identra_core::{AppError, AppResult, CallerIdentity};

/// Operations subject to access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create a new user account.
    CreateUser,
    /// Read an aggregated user profile.
    ViewUser,
    /// The trivial authenticated greeting endpoint.
    Hello,
}

impl Operation {
    /// Returns the stable diagnostic name for this operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateUser => "users.create",
            Self::ViewUser => "users.view",
            Self::Hello => "users.hello",
        }
    }
}

/// Outcome of an access-control evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The caller may perform the operation.
    Permit,
    /// The caller is blocked before the operation runs.
    Deny,
}

/// Pure role-based guard: a single privileged realm role gates every
/// user-management operation.
///
/// The guard is invoked explicitly at the top of each use case, so a
/// denied caller never reaches the identity gateway.
#[derive(Debug, Clone)]
pub struct AccessControlGuard {
    privileged_role: String,
}

impl AccessControlGuard {
    /// Creates a guard requiring the given realm role.
    #[must_use]
    pub fn new(privileged_role: impl Into<String>) -> Self {
        Self {
            privileged_role: privileged_role.into(),
        }
    }

    /// Evaluates whether the caller may perform the operation.
    #[must_use]
    pub fn evaluate(&self, caller: &CallerIdentity, _operation: Operation) -> AccessDecision {
        if caller.has_role(&self.privileged_role) {
            AccessDecision::Permit
        } else {
            AccessDecision::Deny
        }
    }

    /// Ensures the caller may perform the operation.
    ///
    /// Denial is always `AppError::Forbidden`, never `NotFound` or
    /// `Validation`, so clients can tell "you may not ask" apart from
    /// "the thing you asked for is invalid or missing".
    pub fn require(&self, caller: &CallerIdentity, operation: Operation) -> AppResult<()> {
        match self.evaluate(caller, operation) {
            AccessDecision::Permit => Ok(()),
            AccessDecision::Deny => Err(AppError::Forbidden(format!(
                "subject '{}' is missing the role required for '{}'",
                caller.subject(),
                operation.as_str()
            ))),
        }
    }
}
