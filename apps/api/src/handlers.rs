//! HTTP handlers for the user endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use identra_application::Operation;
use identra_core::CallerIdentity;
use identra_domain::UserId;

use crate::dto::{CreateUserPayload, CreateUserResponse, HealthResponse, UserProfileResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<CreateUserPayload>,
) -> ApiResult<Json<CreateUserResponse>> {
    let user_id = state
        .user_service
        .create_user(&caller, payload.into())
        .await?;

    Ok(Json(CreateUserResponse {
        id: user_id.to_string(),
    }))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserProfileResponse>> {
    let user_id = UserId::parse(&id)?;
    let profile = state.user_service.get_user(&caller, user_id).await?;

    Ok(Json(UserProfileResponse::from(profile)))
}

pub async fn hello_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<String> {
    state
        .user_service
        .guard()
        .require(&caller, Operation::Hello)?;

    Ok("user".to_owned())
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;
    use serde_json::{Value, json};
    use tokio::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    use identra_application::{
        AccessControlGuard, BasicProfile, IdentityGateway, NewAccount, UserService,
    };
    use identra_core::{AppError, AppResult, GatewayStep};
    use identra_domain::UserId;

    use crate::api_config::TokenVerificationConfig;
    use crate::auth::TokenVerifier;
    use crate::router::build_router;
    use crate::state::AppState;

    const TEST_SECRET: &str = "test-secret";

    #[derive(Default)]
    struct FakeGateway {
        fail_assign_credential: bool,
        state: Mutex<FakeState>,
    }

    #[derive(Default)]
    struct FakeState {
        accounts: HashMap<UserId, NewAccount>,
        calls: Vec<&'static str>,
    }

    impl FakeGateway {
        async fn call_count(&self) -> usize {
            self.state.lock().await.calls.len()
        }
    }

    #[async_trait]
    impl IdentityGateway for FakeGateway {
        async fn create_account(&self, account: &NewAccount) -> AppResult<UserId> {
            let mut state = self.state.lock().await;
            state.calls.push("create_account");

            let user_id = UserId::from_uuid(Uuid::new_v4());
            state.accounts.insert(user_id, account.clone());
            Ok(user_id)
        }

        async fn assign_credential(&self, _user_id: UserId, _password: &str) -> AppResult<()> {
            let mut state = self.state.lock().await;
            state.calls.push("assign_credential");

            if self.fail_assign_credential {
                return Err(AppError::Gateway {
                    step: GatewayStep::AssignCredential,
                    message: "status 500".to_owned(),
                });
            }
            Ok(())
        }

        async fn delete_account(&self, user_id: UserId) -> AppResult<()> {
            let mut state = self.state.lock().await;
            state.calls.push("delete_account");
            state.accounts.remove(&user_id);
            Ok(())
        }

        async fn fetch_basic_profile(&self, user_id: UserId) -> AppResult<BasicProfile> {
            let mut state = self.state.lock().await;
            state.calls.push("fetch_basic_profile");

            state
                .accounts
                .get(&user_id)
                .map(|account| BasicProfile {
                    first_name: account.first_name.clone(),
                    last_name: account.last_name.clone(),
                    email: account.email.clone(),
                })
                .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
        }

        async fn fetch_roles(&self, _user_id: UserId) -> AppResult<BTreeSet<String>> {
            self.state.lock().await.calls.push("fetch_roles");
            Ok(BTreeSet::new())
        }

        async fn fetch_groups(&self, _user_id: UserId) -> AppResult<BTreeSet<String>> {
            self.state.lock().await.calls.push("fetch_groups");
            Ok(BTreeSet::new())
        }
    }

    fn test_app(gateway: Arc<FakeGateway>) -> Router {
        let verifier = match TokenVerifier::from_config(&TokenVerificationConfig::Hs256Secret(
            TEST_SECRET.to_owned(),
        )) {
            Ok(verifier) => verifier,
            Err(error) => panic!("verifier setup failed: {error}"),
        };

        build_router(AppState {
            user_service: UserService::new(gateway, AccessControlGuard::new("MODERATOR")),
            token_verifier: Arc::new(verifier),
        })
    }

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        preferred_username: String,
        realm_access: Value,
        exp: u64,
    }

    fn bearer(roles: &[&str]) -> String {
        use std::time::{SystemTime, UNIX_EPOCH};

        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() + 3600)
            .unwrap_or(u64::MAX);

        let claims = TestClaims {
            sub: "sub-1".to_owned(),
            preferred_username: "alice".to_owned(),
            realm_access: json!({ "roles": roles }),
            exp,
        };

        match encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        ) {
            Ok(token) => format!("Bearer {token}"),
            Err(error) => panic!("failed to sign test token: {error}"),
        }
    }

    fn valid_payload() -> Value {
        json!({
            "username": "testuser",
            "email": "test@example.com",
            "password": "password",
            "firstName": "John",
            "lastName": "Doe",
        })
    }

    fn post_users(auth: Option<&str>, payload: &Value) -> Request<Body> {
        let builder = Request::builder()
            .method("POST")
            .uri("/api/users")
            .header(header::CONTENT_TYPE, "application/json");
        let builder = match auth {
            Some(value) => builder.header(header::AUTHORIZATION, value),
            None => builder,
        };

        match builder.body(Body::from(payload.to_string())) {
            Ok(request) => request,
            Err(error) => panic!("failed to build request: {error}"),
        }
    }

    fn get_path(auth: &str, path: &str) -> Request<Body> {
        match Request::builder()
            .method("GET")
            .uri(path)
            .header(header::AUTHORIZATION, auth)
            .body(Body::empty())
        {
            Ok(request) => request,
            Err(error) => panic!("failed to build request: {error}"),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = match axum::body::to_bytes(response.into_body(), usize::MAX).await {
            Ok(bytes) => bytes,
            Err(error) => panic!("failed to read body: {error}"),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(error) => panic!("body is not JSON: {error}"),
        }
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway.clone());

        let response = match app.oneshot(post_users(None, &valid_payload())).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(gateway.call_count().await, 0);
    }

    #[tokio::test]
    async fn unprivileged_caller_is_denied_before_the_gateway() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway.clone());
        let auth = bearer(&["USER"]);

        let response = match app
            .clone()
            .oneshot(post_users(Some(&auth), &valid_payload()))
            .await
        {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let id = Uuid::new_v4();
        let response = match app.oneshot(get_path(&auth, &format!("/api/users/{id}"))).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        assert_eq!(gateway.call_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_password_returns_a_field_tagged_response() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway.clone());
        let auth = bearer(&["MODERATOR"]);

        let mut payload = valid_payload();
        payload["password"] = json!("123");

        let response = match app.oneshot(post_users(Some(&auth), &payload)).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body.get("password").is_some());
        assert_eq!(gateway.call_count().await, 0);
    }

    #[tokio::test]
    async fn multiple_violations_are_reported_in_one_response() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway);
        let auth = bearer(&["MODERATOR"]);

        let mut payload = valid_payload();
        payload["username"] = json!("");
        payload["email"] = json!("invalid_email");

        let response = match app.oneshot(post_users(Some(&auth), &payload)).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["email"], json!("Email should be valid"));
        assert!(body.get("username").is_some());
    }

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway);
        let auth = bearer(&["MODERATOR"]);

        let response = match app
            .clone()
            .oneshot(post_users(Some(&auth), &valid_payload()))
            .await
        {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };
        assert_eq!(response.status(), StatusCode::OK);

        let created = body_json(response).await;
        let id = match created["id"].as_str() {
            Some(id) => id.to_owned(),
            None => panic!("create response carried no id: {created}"),
        };

        let response = match app.oneshot(get_path(&auth, &format!("/api/users/{id}"))).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };
        assert_eq!(response.status(), StatusCode::OK);

        let profile = body_json(response).await;
        assert_eq!(profile["firstName"], json!("John"));
        assert_eq!(profile["lastName"], json!("Doe"));
        assert_eq!(profile["email"], json!("test@example.com"));
        assert_eq!(profile["roles"], json!([]));
        assert_eq!(profile["groups"], json!([]));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway);
        let auth = bearer(&["MODERATOR"]);

        let id = Uuid::new_v4();
        let response = match app.oneshot(get_path(&auth, &format!("/api/users/{id}"))).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_failure() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway);
        let auth = bearer(&["MODERATOR"]);

        let response = match app.oneshot(get_path(&auth, "/api/users/not-a-uuid")).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_credential_assignment_surfaces_as_bad_gateway() {
        let gateway = Arc::new(FakeGateway {
            fail_assign_credential: true,
            ..FakeGateway::default()
        });
        let app = test_app(gateway.clone());
        let auth = bearer(&["MODERATOR"]);

        let response = match app.oneshot(post_users(Some(&auth), &valid_payload())).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        // The generic body must not leak provider detail.
        let body = body_json(response).await;
        assert_eq!(body["message"], json!("identity provider request failed"));

        // Rollback ran: the partially created account is gone.
        assert!(gateway.state.lock().await.accounts.is_empty());
    }

    #[tokio::test]
    async fn hello_greets_privileged_callers() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway);
        let auth = bearer(&["MODERATOR"]);

        let response = match app.oneshot(get_path(&auth, "/api/users/hello")).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = match axum::body::to_bytes(response.into_body(), usize::MAX).await {
            Ok(bytes) => bytes,
            Err(error) => panic!("failed to read body: {error}"),
        };
        assert_eq!(&bytes[..], b"user");
    }

    #[tokio::test]
    async fn health_probe_is_public() {
        let gateway = Arc::new(FakeGateway::default());
        let app = test_app(gateway);

        let request = match Request::builder().uri("/health").body(Body::empty()) {
            Ok(request) => request,
            Err(error) => panic!("failed to build request: {error}"),
        };

        let response = match app.oneshot(request).await {
            Ok(response) => response,
            Err(error) => panic!("request failed: {error}"),
        };

        assert_eq!(response.status(), StatusCode::OK);
    }
}
