use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Resolved identity of the requester, produced by the authentication
/// layer before any use case runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    subject: String,
    username: String,
    roles: BTreeSet<String>,
}

impl CallerIdentity {
    /// Creates a caller identity from verified token claims.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        username: impl Into<String>,
        roles: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the username the caller authenticated as.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the realm roles resolved for the caller.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Returns whether the caller holds the given realm role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
