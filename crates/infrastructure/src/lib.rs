//! Infrastructure adapters for the identity gateway port.

#![forbid(unsafe_code)]

mod keycloak_gateway;

pub use keycloak_gateway::{KeycloakConfig, KeycloakGateway};
