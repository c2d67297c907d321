// REST API guarded by the configured authenticator

use axum::{
    Extension, Form, Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::auth::{Accounts, AppAuth, AuthError, User, UserStore, build_authenticator, require_auth};
use crate::config::AuthConfig;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    auth: Arc<AppAuth>,
    accounts: Accounts,
    excluded_paths: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(auth: AppAuth, users: Arc<dyn UserStore>, excluded_paths: Vec<String>) -> Self {
        Self {
            auth: Arc::new(auth),
            accounts: Accounts::new(users),
            excluded_paths: Arc::new(excluded_paths),
        }
    }

    /// Build the configured strategy and wrap it in API state.
    pub fn from_config(config: &AuthConfig, users: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let auth = build_authenticator(config, users.clone())?;
        Ok(Self::new(auth, users, config.excluded_paths.clone()))
    }

    pub fn auth(&self) -> &AppAuth {
        &self.auth
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/unauthorized", get(unauthorized))
        .route("/api/v1/forbidden", get(forbidden))
        .route("/api/v1/users", post(register))
        .route("/api/v1/users/me", get(me))
        .route("/api/v1/auth_session/login", post(login))
        .route("/api/v1/auth_session/logout", delete(logout))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(state.clone(), authenticate)),
        )
        .with_state(state)
}

/// Gate every request: 401 without credentials, 403 with bad ones.
async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !require_auth(Some(path), &state.excluded_paths) {
        return next.run(request).await;
    }

    let authenticator = state.auth.authenticator();
    let headers = request.headers();
    let has_cookie = state
        .auth
        .sessions()
        .and_then(|s| s.session_cookie(Some(headers)))
        .is_some();
    if authenticator.authorization_header(Some(headers)).is_none() && !has_cookie {
        debug!("No credentials on {}", path);
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let Some(user) = authenticator.current_user(Some(headers)) else {
        debug!("Credentials rejected on {}", path);
        return error_response(StatusCode::FORBIDDEN, "Forbidden");
    };
    request.extensions_mut().insert(user);
    next.run(request).await
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingField(_) | Self::EmailAlreadyRegistered(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::SessionsUnavailable => StatusCode::NOT_FOUND,
            Self::Internal(msg) => {
                error!("Request failed: {}", msg);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal error");
            }
        };
        error_response(status, &self.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsForm {
    email: Option<String>,
    password: Option<String>,
}

impl CredentialsForm {
    fn fields(&self) -> (&str, &str) {
        (
            self.email.as_deref().unwrap_or_default(),
            self.password.as_deref().unwrap_or_default(),
        )
    }
}

async fn status() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK" }))
}

async fn unauthorized() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "Unauthorized")
}

async fn forbidden() -> Response {
    error_response(StatusCode::FORBIDDEN, "Forbidden")
}

async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let (email, password) = form.fields();
    let user = state.accounts.register_user(email, password)?;
    Ok(Json(json!({ "email": user.email, "message": "user created" })))
}

async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AuthError> {
    let sessions = state.auth.sessions().ok_or(AuthError::SessionsUnavailable)?;
    let (email, password) = form.fields();
    let user = state.accounts.authenticate(email, password)?;

    let session_id = sessions
        .create_session(Some(&user.id))
        .ok_or_else(|| AuthError::Internal("could not create session".to_string()))?;
    info!("User {} logged in", user.id);

    let cookie = Cookie::build((sessions.session_name().to_string(), session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(([(header::SET_COOKIE, cookie.to_string())], Json(user)).into_response())
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AuthError> {
    let sessions = state.auth.sessions().ok_or(AuthError::SessionsUnavailable)?;
    if !sessions.destroy_session(Some(&headers)) {
        return Ok(error_response(StatusCode::NOT_FOUND, "Not found"));
    }

    let cookie = Cookie::build((sessions.session_name().to_string(), ""))
        .path("/")
        .max_age(CookieDuration::ZERO)
        .build();
    Ok(([(header::SET_COOKIE, cookie.to_string())], Json(json!({}))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryUserStore;
    use axum::body::{Body, to_bytes};
    use axum::http::Request as HttpRequest;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tower::ServiceExt;

    fn app(config: &AuthConfig) -> (Router, AppState) {
        let users = Arc::new(MemoryUserStore::new());
        let state = AppState::from_config(config, users).unwrap();
        (create_router(state.clone()), state)
    }

    fn form_request(method: &str, uri: &str, body: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str, header_pair: Option<(header::HeaderName, String)>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some((name, value)) = header_pair {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(router: &Router, request: HttpRequest<Body>) -> Response {
        router.clone().oneshot(request).await.unwrap()
    }

    fn set_cookie(response: &Response) -> Cookie<'static> {
        let raw = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        Cookie::parse(raw.to_string()).unwrap()
    }

    fn session_cookie(response: &Response) -> String {
        set_cookie(response).stripped().to_string()
    }

    #[tokio::test]
    async fn test_status_is_public() {
        let (router, _) = app(&AuthConfig::default());
        let response = send(&router, get_request("/api/v1/status", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "OK");
    }

    #[tokio::test]
    async fn test_protected_route_without_credentials() {
        let (router, _) = app(&AuthConfig::default());
        let response = send(&router, get_request("/api/v1/users/me", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_protected_route_with_unknown_session() {
        let (router, _) = app(&AuthConfig::default());
        let response = send(
            &router,
            get_request(
                "/api/v1/users/me",
                Some((header::COOKIE, "_my_session_id=bogus".to_string())),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_login_me_logout() {
        let (router, _) = app(&AuthConfig::default());

        let response = send(
            &router,
            form_request("POST", "/api/v1/users", "email=bob%40example.com&password=pw"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "user created");

        let response = send(
            &router,
            form_request(
                "POST",
                "/api/v1/auth_session/login",
                "email=bob%40example.com&password=pw",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let issued = set_cookie(&response);
        assert_eq!(issued.name(), "_my_session_id");
        assert!(!issued.value().is_empty());
        assert_eq!(issued.path(), Some("/"));
        assert_eq!(issued.http_only(), Some(true));
        assert_eq!(issued.same_site(), Some(SameSite::Lax));
        let cookie = session_cookie(&response);
        let body = json_body(response).await;
        assert_eq!(body["email"], "bob@example.com");
        assert!(body.get("hashed_password").is_none());

        let response = send(
            &router,
            get_request("/api/v1/users/me", Some((header::COOKIE, cookie.clone()))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "bob@example.com");

        let logout = HttpRequest::builder()
            .method("DELETE")
            .uri("/api/v1/auth_session/logout")
            .header(header::COOKIE, cookie.clone())
            .body(Body::empty())
            .unwrap();
        let response = send(&router, logout).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cleared = set_cookie(&response);
        assert_eq!(cleared.name(), "_my_session_id");
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(CookieDuration::ZERO));

        let response = send(
            &router,
            get_request("/api/v1/users/me", Some((header::COOKIE, cookie))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_duplicate_and_missing_fields() {
        let (router, _) = app(&AuthConfig::default());
        let body = "email=bob%40example.com&password=pw";
        send(&router, form_request("POST", "/api/v1/users", body)).await;

        let response = send(&router, form_request("POST", "/api/v1/users", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "email already registered");

        let response = send(&router, form_request("POST", "/api/v1/users", "password=pw")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "email missing");
    }

    #[tokio::test]
    async fn test_login_failures_share_one_response() {
        let (router, state) = app(&AuthConfig::default());
        state
            .accounts()
            .register_user("bob@example.com", "right")
            .unwrap();

        let unknown = send(
            &router,
            form_request(
                "POST",
                "/api/v1/auth_session/login",
                "email=alice%40example.com&password=right",
            ),
        )
        .await;
        let wrong = send(
            &router,
            form_request(
                "POST",
                "/api/v1/auth_session/login",
                "email=bob%40example.com&password=wrong",
            ),
        )
        .await;

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert!(unknown.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(json_body(unknown).await, json_body(wrong).await);

        let missing = send(
            &router,
            form_request("POST", "/api/v1/auth_session/login", "email=bob%40example.com"),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(missing).await["error"], "password missing");
    }

    #[tokio::test]
    async fn test_logout_with_unknown_session_is_forbidden() {
        let (router, _) = app(&AuthConfig::default());
        let logout = HttpRequest::builder()
            .method("DELETE")
            .uri("/api/v1/auth_session/logout")
            .header(header::COOKIE, "_my_session_id=bogus")
            .body(Body::empty())
            .unwrap();
        // The gate rejects an unknown session before the handler runs.
        assert_eq!(send(&router, logout).await.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_basic_auth_strategy() {
        let (router, state) = app(&AuthConfig::basic());
        state
            .accounts()
            .register_user("bob@example.com", "H0lberton:School")
            .unwrap();

        let good = format!("Basic {}", STANDARD.encode("bob@example.com:H0lberton:School"));
        let response = send(
            &router,
            get_request("/api/v1/users/me", Some((header::AUTHORIZATION, good))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["email"], "bob@example.com");

        let bad = format!("Basic {}", STANDARD.encode("bob@example.com:nope"));
        let response = send(
            &router,
            get_request("/api/v1/users/me", Some((header::AUTHORIZATION, bad))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Session login is not offered under Basic auth.
        let response = send(
            &router,
            form_request(
                "POST",
                "/api/v1/auth_session/login",
                "email=bob%40example.com&password=H0lberton%3ASchool",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
