//! Integration tests for the payment voucher console.
//!
//! The tests run the real transport and session against [`FakeApi`], an
//! in-process axum server bound to an ephemeral localhost port. Nothing
//! external is required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p payment-voucher-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session_lifecycle` - initialize, login, logout
//! - `transport` - credential injection, error normalization, timeouts
//! - `account_recovery` - password reset flows
//! - `navigation` - route guard driven by a live session

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use payment_voucher_console::{ApiClient, ConsoleConfig, CredentialStore, Session};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Endpoints served by [`FakeApi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Me,
    Login,
    RequestPasswordChange,
    ResetPassword,
}

/// A forced reply, bypassing the endpoint's normal behaviour.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Account the fake server knows about.
#[derive(Debug, Clone)]
pub struct FakeUser {
    pub username: String,
    pub password: String,
    pub token: String,
    pub role: String,
}

impl FakeUser {
    #[must_use]
    pub fn new(username: &str, password: &str, role: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            token: format!("token-{username}"),
            role: role.to_string(),
        }
    }

    /// Identity document as the server returns it.
    #[must_use]
    pub fn identity(&self) -> Value {
        json!({
            "_id": format!("id-{}", self.username),
            "username": self.username,
            "email": format!("{}@example.com", self.username),
            "role": self.role,
            "fullName": format!("{} Example", self.username),
            "department": "Finance",
        })
    }
}

/// One request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub authorization: Option<String>,
    pub body: Value,
    pub path_token: Option<String>,
}

#[derive(Default)]
struct FakeState {
    users: Mutex<Vec<FakeUser>>,
    overrides: Mutex<HashMap<Endpoint, Reply>>,
    hits: Mutex<HashMap<Endpoint, usize>>,
    requests: Mutex<HashMap<Endpoint, Vec<Recorded>>>,
    me_delay: Mutex<Option<Duration>>,
}

impl FakeState {
    fn record(&self, endpoint: Endpoint, headers: &HeaderMap, body: Value, path_token: Option<String>) {
        *lock(&self.hits).entry(endpoint).or_default() += 1;
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        lock(&self.requests).entry(endpoint).or_default().push(Recorded {
            authorization,
            body,
            path_token,
        });
    }

    fn forced(&self, endpoint: Endpoint) -> Option<(StatusCode, Json<Value>)> {
        lock(&self.overrides).get(&endpoint).map(|reply| {
            (
                StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(reply.body.clone()),
            )
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Response = (StatusCode, Json<Value>);

/// In-process stand-in for the voucher API.
pub struct FakeApi {
    addr: SocketAddr,
    state: Arc<FakeState>,
    task: JoinHandle<()>,
}

impl FakeApi {
    /// Bind to an ephemeral localhost port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(FakeState::default());

        let app = Router::new()
            .route("/auth/me", get(me))
            .route("/api/auth/login", post(login))
            .route(
                "/api/auth/request-password-change",
                post(request_password_change),
            )
            .route("/api/auth/reset-password/{token}", post(reset_password))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state, task })
    }

    /// Base URL of the server.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Console configuration pointing at this server.
    ///
    /// # Panics
    ///
    /// Never in practice; the server URL is always a valid http URL.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn config(&self, credential_path: &Path) -> ConsoleConfig {
        ConsoleConfig::for_api(&self.url(), credential_path).unwrap()
    }

    /// Transport bound to this server and `store`.
    ///
    /// # Panics
    ///
    /// If the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn client(&self, store: Arc<dyn CredentialStore>) -> ApiClient {
        let config = self.config(Path::new("unused.json"));
        ApiClient::new(&config, store).unwrap()
    }

    /// Fresh, uninitialized session bound to this server and `store`.
    #[must_use]
    pub fn session(&self, store: Arc<dyn CredentialStore>) -> Session {
        Session::new(self.client(store))
    }

    /// Register an account.
    pub fn add_user(&self, user: FakeUser) {
        lock(&self.state.users).push(user);
    }

    /// Answer every request to `endpoint` with `reply`.
    pub fn force(&self, endpoint: Endpoint, reply: Reply) {
        lock(&self.state.overrides).insert(endpoint, reply);
    }

    /// Delay `/auth/me` replies by `delay`.
    pub fn delay_me(&self, delay: Duration) {
        *lock(&self.state.me_delay) = Some(delay);
    }

    /// Number of requests `endpoint` received.
    #[must_use]
    pub fn hits(&self, endpoint: Endpoint) -> usize {
        lock(&self.state.hits).get(&endpoint).copied().unwrap_or(0)
    }

    /// Requests `endpoint` received, oldest first.
    #[must_use]
    pub fn requests(&self, endpoint: Endpoint) -> Vec<Recorded> {
        lock(&self.state.requests)
            .get(&endpoint)
            .cloned()
            .unwrap_or_default()
    }

    /// Most recent request to `endpoint`.
    #[must_use]
    pub fn last_request(&self, endpoint: Endpoint) -> Option<Recorded> {
        self.requests(endpoint).pop()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn me(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.record(Endpoint::Me, &headers, Value::Null, None);

    let delay = *lock(&state.me_delay);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(forced) = state.forced(Endpoint::Me) {
        return forced;
    }

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let user = presented.and_then(|token| {
        lock(&state.users)
            .iter()
            .find(|user| user.token == token)
            .cloned()
    });

    match user {
        Some(user) => (StatusCode::OK, Json(user.identity())),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Token is not valid"})),
        ),
    }
}

async fn login(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Endpoint::Login, &headers, body.clone(), None);
    if let Some(forced) = state.forced(Endpoint::Login) {
        return forced;
    }

    let user = lock(&state.users)
        .iter()
        .find(|user| body["username"] == user.username.as_str() && body["password"] == user.password.as_str())
        .cloned();

    match user {
        Some(user) => (
            StatusCode::OK,
            Json(json!({"token": user.token, "user": user.identity()})),
        ),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        ),
    }
}

async fn request_password_change(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Endpoint::RequestPasswordChange, &headers, body, None);
    state.forced(Endpoint::RequestPasswordChange).unwrap_or_else(|| {
        (
            StatusCode::OK,
            Json(json!({"message": "Password reset email sent"})),
        )
    })
}

async fn reset_password(
    State(state): State<Arc<FakeState>>,
    UrlPath(token): UrlPath<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Endpoint::ResetPassword, &headers, body, Some(token));
    state.forced(Endpoint::ResetPassword).unwrap_or_else(|| {
        (
            StatusCode::OK,
            Json(json!({"message": "Password has been reset"})),
        )
    })
}
