use std::sync::Arc;

use identra_application::UserService;

use crate::auth::TokenVerifier;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub token_verifier: Arc<TokenVerifier>,
}
