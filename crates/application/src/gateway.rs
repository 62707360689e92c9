//! Port over the identity provider's administrative API.

use std::collections::BTreeSet;

use async_trait::async_trait;

use identra_core::AppResult;
use identra_domain::{CreateUserRequest, UserId};

/// Account attributes sent to the identity provider at creation time.
///
/// The credential is deliberately absent; it is assigned in a separate
/// step so the two-phase provisioning contract stays explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Login name, unique within the provider realm.
    pub username: String,
    /// Contact email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl From<&CreateUserRequest> for NewAccount {
    fn from(request: &CreateUserRequest) -> Self {
        Self {
            username: request.username.clone(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
        }
    }
}

/// Basic profile attributes stored on the identity provider's user
/// record, before role and group aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicProfile {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email address.
    pub email: String,
}

/// Gateway port for the identity provider's administrative API.
///
/// Every method is an independent remote round-trip; implementations
/// must not cache provider state and must be safe for concurrent use.
/// Failures are reported through the shared error taxonomy: a missing
/// user id resolves to `AppError::NotFound`, provider-side conflicts to
/// `AppError::Conflict`, and anything else to `AppError::Gateway` tagged
/// with the failing step.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Creates a new account and returns the identifier the provider
    /// assigned to it.
    async fn create_account(&self, account: &NewAccount) -> AppResult<UserId>;

    /// Assigns the initial permanent credential to an account.
    async fn assign_credential(&self, user_id: UserId, password: &str) -> AppResult<()>;

    /// Deletes an account; used as the compensating action when
    /// credential assignment fails.
    async fn delete_account(&self, user_id: UserId) -> AppResult<()>;

    /// Fetches the basic profile attributes for an account.
    async fn fetch_basic_profile(&self, user_id: UserId) -> AppResult<BasicProfile>;

    /// Fetches the realm role names assigned to an account.
    async fn fetch_roles(&self, user_id: UserId) -> AppResult<BTreeSet<String>>;

    /// Fetches the group names an account is a member of.
    async fn fetch_groups(&self, user_id: UserId) -> AppResult<BTreeSet<String>>;
}
