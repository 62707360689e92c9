use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use identra_core::AppError;
use identra_infrastructure::KeycloakConfig;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Bearer-token verification material.
#[derive(Debug, Clone)]
pub enum TokenVerificationConfig {
    /// RS256 with the identity provider's realm public key (PEM).
    Rs256PublicKeyPem(String),
    /// HS256 with a shared secret; intended for local development.
    Hs256Secret(String),
}

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub privileged_role: String,
    pub keycloak: KeycloakConfig,
    pub token_verification: TokenVerificationConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let privileged_role =
            env::var("PRIVILEGED_ROLE").unwrap_or_else(|_| "MODERATOR".to_owned());

        let idp_base_url = required_env("IDP_BASE_URL")?;
        let base_url = Url::parse(&idp_base_url)
            .map_err(|error| AppError::Internal(format!("invalid IDP_BASE_URL: {error}")))?;

        let keycloak = KeycloakConfig {
            base_url,
            realm: required_non_empty_env("IDP_REALM")?,
            client_id: required_non_empty_env("IDP_CLIENT_ID")?,
            client_secret: required_non_empty_env("IDP_CLIENT_SECRET")?,
        };

        let token_verification = match env::var("AUTH_JWT_ALGORITHM")
            .unwrap_or_else(|_| "RS256".to_owned())
            .to_uppercase()
            .as_str()
        {
            "RS256" => TokenVerificationConfig::Rs256PublicKeyPem(required_non_empty_env(
                "AUTH_JWT_PUBLIC_KEY_PEM",
            )?),
            "HS256" => {
                TokenVerificationConfig::Hs256Secret(required_non_empty_env("AUTH_JWT_SECRET")?)
            }
            other => {
                return Err(AppError::Internal(format!(
                    "AUTH_JWT_ALGORITHM must be either 'RS256' or 'HS256', got '{other}'"
                )));
            }
        };

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            privileged_role,
            keycloak,
            token_verification,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Internal(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Internal(format!("{name} must not be empty")));
    }

    Ok(value)
}
