//! Wire types for the user endpoints.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use identra_domain::{CreateUserRequest, UserProfile};

/// Health probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Payload for account creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<CreateUserPayload> for CreateUserRequest {
    fn from(payload: CreateUserPayload) -> Self {
        Self {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        }
    }
}

/// Response for a successful account creation.
#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub id: String,
}

/// Aggregated profile response.
///
/// The field names are a stable client contract; renaming any of them
/// is a breaking change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: BTreeSet<String>,
    pub groups: BTreeSet<String>,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            roles: profile.roles,
            groups: profile.groups,
        }
    }
}
