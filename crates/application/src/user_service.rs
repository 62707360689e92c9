//! User aggregation service.
//!
//! Orchestrates access control, request validation, and identity-gateway
//! calls into the two public use cases: create a user account and read an
//! aggregated user profile. The service is stateless across requests; one
//! fresh execution per call.

use std::sync::Arc;

use identra_core::{AppResult, CallerIdentity};
use identra_domain::{CreateUserRequest, UserId, UserProfile, validate_create_user};

use crate::{AccessControlGuard, IdentityGateway, Operation, provision_account};

/// Application service for IdP-backed user management.
#[derive(Clone)]
pub struct UserService {
    gateway: Arc<dyn IdentityGateway>,
    guard: AccessControlGuard,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(gateway: Arc<dyn IdentityGateway>, guard: AccessControlGuard) -> Self {
        Self { gateway, guard }
    }

    /// Creates a new user account on the identity provider.
    ///
    /// Order of checks: access control, then validation, then the
    /// two-step provisioning run. No remote call is made unless both
    /// local checks pass.
    pub async fn create_user(
        &self,
        caller: &CallerIdentity,
        request: CreateUserRequest,
    ) -> AppResult<UserId> {
        self.guard.require(caller, Operation::CreateUser)?;
        validate_create_user(&request)?;

        provision_account(self.gateway.as_ref(), &request)
            .await
            .into_result()
    }

    /// Returns the aggregated profile for an existing account.
    ///
    /// The role and group lookups run concurrently and BOTH must succeed;
    /// a profile is never returned with one collection silently missing.
    /// When both lookups fail, the roles error is reported (call order).
    pub async fn get_user(
        &self,
        caller: &CallerIdentity,
        user_id: UserId,
    ) -> AppResult<UserProfile> {
        self.guard.require(caller, Operation::ViewUser)?;

        let basic = self.gateway.fetch_basic_profile(user_id).await?;

        let (roles, groups) = tokio::join!(
            self.gateway.fetch_roles(user_id),
            self.gateway.fetch_groups(user_id),
        );
        let roles = roles?;
        let groups = groups?;

        Ok(UserProfile {
            first_name: basic.first_name,
            last_name: basic.last_name,
            email: basic.email,
            roles,
            groups,
        })
    }

    /// Returns the access-control guard for operations handled outside
    /// this service.
    #[must_use]
    pub fn guard(&self) -> &AccessControlGuard {
        &self.guard
    }
}
