//! Keycloak administrative REST adapter for the identity gateway port.
//!
//! Owns the service-account session against the provider: a
//! client-credentials token is fetched on demand, cached until shortly
//! before expiry, and shared safely between concurrent requests.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use identra_application::{BasicProfile, IdentityGateway, NewAccount};
use identra_core::{AppError, AppResult, GatewayStep};
use identra_domain::UserId;

/// Leeway subtracted from the token lifetime before re-authentication.
const TOKEN_EXPIRY_LEEWAY: Duration = Duration::from_secs(30);

/// Connection settings for the Keycloak administrative API.
#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Provider base URL, e.g. `http://localhost:8080`.
    pub base_url: Url,
    /// Realm holding the managed user accounts.
    pub realm: String,
    /// Service-account client id used for the admin session.
    pub client_id: String,
    /// Service-account client secret.
    pub client_secret: String,
}

/// Identity gateway backed by the Keycloak admin REST API.
pub struct KeycloakGateway {
    http_client: reqwest::Client,
    config: KeycloakConfig,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRepresentation<'a> {
    username: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecordRepresentation {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedRepresentation {
    name: String,
}

#[derive(Debug, Serialize)]
struct CredentialRepresentation<'a> {
    #[serde(rename = "type")]
    credential_type: &'static str,
    value: &'a str,
    temporary: bool,
}

impl KeycloakGateway {
    /// Creates a gateway from a shared HTTP client and provider settings.
    #[must_use]
    pub fn new(http_client: reqwest::Client, config: KeycloakConfig) -> Self {
        Self {
            http_client,
            config,
            token: Mutex::new(None),
        }
    }

    fn provider_base(&self) -> &str {
        self.config.base_url.as_str().trim_end_matches('/')
    }

    fn admin_url(&self, tail: &str) -> String {
        format!(
            "{}/admin/realms/{}/{tail}",
            self.provider_base(),
            self.config.realm
        )
    }

    /// Returns a valid admin access token, re-authenticating when the
    /// cached one is missing or about to expire.
    async fn admin_token(&self) -> AppResult<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref()
            && Instant::now() < token.expires_at
        {
            return Ok(token.access_token.clone());
        }

        let token_url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.provider_base(),
            self.config.realm
        );

        let response = self
            .http_client
            .post(token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|error| transport_error(GatewayStep::Authenticate, &error))?;

        if !response.status().is_success() {
            return Err(status_error(GatewayStep::Authenticate, response).await);
        }

        let token: TokenResponse = response.json().await.map_err(|error| AppError::Gateway {
            step: GatewayStep::Authenticate,
            message: format!("malformed token response: {error}"),
        })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_LEEWAY);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        debug!(expires_in = token.expires_in, "admin session refreshed");
        Ok(token.access_token)
    }
}

#[async_trait]
impl IdentityGateway for KeycloakGateway {
    async fn create_account(&self, account: &NewAccount) -> AppResult<UserId> {
        let token = self.admin_token().await?;

        let response = self
            .http_client
            .post(self.admin_url("users"))
            .bearer_auth(token)
            .json(&UserRepresentation {
                username: &account.username,
                email: &account.email,
                first_name: &account.first_name,
                last_name: &account.last_name,
                enabled: true,
            })
            .send()
            .await
            .map_err(|error| transport_error(GatewayStep::CreateAccount, &error))?;

        match response.status() {
            StatusCode::CREATED => {
                let user_id = created_id_from_location(&response)?;
                debug!(%user_id, "account created");
                Ok(user_id)
            }
            StatusCode::CONFLICT => Err(AppError::Conflict(
                "username or email is already registered".to_owned(),
            )),
            _ => Err(status_error(GatewayStep::CreateAccount, response).await),
        }
    }

    async fn assign_credential(&self, user_id: UserId, password: &str) -> AppResult<()> {
        let token = self.admin_token().await?;

        let response = self
            .http_client
            .put(self.admin_url(&format!("users/{user_id}/reset-password")))
            .bearer_auth(token)
            .json(&CredentialRepresentation {
                credential_type: "password",
                value: password,
                temporary: false,
            })
            .send()
            .await
            .map_err(|error| transport_error(GatewayStep::AssignCredential, &error))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(GatewayStep::AssignCredential, response).await)
        }
    }

    async fn delete_account(&self, user_id: UserId) -> AppResult<()> {
        let token = self.admin_token().await?;

        let response = self
            .http_client
            .delete(self.admin_url(&format!("users/{user_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| transport_error(GatewayStep::DeleteAccount, &error))?;

        if response.status().is_success() {
            debug!(%user_id, "account deleted");
            Ok(())
        } else {
            Err(status_error(GatewayStep::DeleteAccount, response).await)
        }
    }

    async fn fetch_basic_profile(&self, user_id: UserId) -> AppResult<BasicProfile> {
        let token = self.admin_token().await?;

        let response = self
            .http_client
            .get(self.admin_url(&format!("users/{user_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| transport_error(GatewayStep::FetchProfile, &error))?;

        match response.status() {
            StatusCode::OK => {
                let record: UserRecordRepresentation =
                    response.json().await.map_err(|error| AppError::Gateway {
                        step: GatewayStep::FetchProfile,
                        message: format!("malformed user record: {error}"),
                    })?;

                Ok(BasicProfile {
                    first_name: record.first_name.unwrap_or_default(),
                    last_name: record.last_name.unwrap_or_default(),
                    email: record.email.unwrap_or_default(),
                })
            }
            StatusCode::NOT_FOUND => {
                Err(AppError::NotFound(format!("user '{user_id}' does not exist")))
            }
            _ => Err(status_error(GatewayStep::FetchProfile, response).await),
        }
    }

    async fn fetch_roles(&self, user_id: UserId) -> AppResult<BTreeSet<String>> {
        let token = self.admin_token().await?;

        let response = self
            .http_client
            .get(self.admin_url(&format!("users/{user_id}/role-mappings/realm")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| transport_error(GatewayStep::FetchRoles, &error))?;

        collect_names(GatewayStep::FetchRoles, user_id, response).await
    }

    async fn fetch_groups(&self, user_id: UserId) -> AppResult<BTreeSet<String>> {
        let token = self.admin_token().await?;

        let response = self
            .http_client
            .get(self.admin_url(&format!("users/{user_id}/groups")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| transport_error(GatewayStep::FetchGroups, &error))?;

        collect_names(GatewayStep::FetchGroups, user_id, response).await
    }
}

fn created_id_from_location(response: &reqwest::Response) -> AppResult<UserId> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Gateway {
            step: GatewayStep::CreateAccount,
            message: "created response carried no Location header".to_owned(),
        })?;

    let id_segment = location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    Uuid::parse_str(id_segment)
        .map(UserId::from_uuid)
        .map_err(|error| AppError::Gateway {
            step: GatewayStep::CreateAccount,
            message: format!("unparsable account id in Location header: {error}"),
        })
}

async fn collect_names(
    step: GatewayStep,
    user_id: UserId,
    response: reqwest::Response,
) -> AppResult<BTreeSet<String>> {
    match response.status() {
        StatusCode::OK => {
            let entries: Vec<NamedRepresentation> =
                response.json().await.map_err(|error| AppError::Gateway {
                    step,
                    message: format!("malformed listing: {error}"),
                })?;

            Ok(entries.into_iter().map(|entry| entry.name).collect())
        }
        StatusCode::NOT_FOUND => Err(AppError::NotFound(format!(
            "user '{user_id}' does not exist"
        ))),
        _ => Err(status_error(step, response).await),
    }
}

fn transport_error(step: GatewayStep, error: &reqwest::Error) -> AppError {
    AppError::Gateway {
        step,
        message: format!("transport error: {error}"),
    }
}

async fn status_error(step: GatewayStep, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<response body unavailable>".to_owned());

    warn!(%status, step = step.as_str(), "identity provider returned an error response");

    AppError::Gateway {
        step,
        message: format!("status {status}: {body}"),
    }
}
