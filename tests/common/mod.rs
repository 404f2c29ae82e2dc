//! Shared fakes for integration tests: an in-process Twitch API plus
//! scripted identity and tab hosts.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use pollbridge::config::{Config, FlowVariant};
use pollbridge::host::{HostError, IdentityHost, InjectionResult, Tab, TabHost};
use pollbridge::session::Session;
use pollbridge::store::MemoryStore;
use pollbridge::twitch::HelixClient;

/// What the fake Twitch answers and what it saw
#[derive(Default)]
pub struct TwitchState {
    /// Tokens `/oauth2/validate` accepts
    pub valid_tokens: Vec<String>,
    /// `data` array of `/helix/users`; `None` answers 401
    pub users: Option<Value>,
    /// Raw body returned by `/helix/polls`
    pub poll_response: String,
    pub validate_calls: usize,
    pub users_calls: usize,
    pub poll_bodies: Vec<Value>,
    pub poll_headers: Vec<HeaderMap>,
}

impl TwitchState {
    pub fn total_calls(&self) -> usize {
        self.validate_calls + self.users_calls + self.poll_bodies.len()
    }
}

pub type SharedTwitch = Arc<Mutex<TwitchState>>;

pub fn twitch_dev_user() -> Value {
    json!([{
        "id": "141981764",
        "login": "twitchdev",
        "display_name": "TwitchDev",
        "profile_image_url": "https://static-cdn.jtvnw.net/user-default-pictures/avatar.png"
    }])
}

async fn validate(State(state): State<SharedTwitch>, headers: HeaderMap) -> StatusCode {
    let mut state = state.lock();
    state.validate_calls += 1;
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("OAuth "))
        .unwrap_or_default()
        .to_string();
    if state.valid_tokens.contains(&token) {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn users(State(state): State<SharedTwitch>) -> Response {
    let mut state = state.lock();
    state.users_calls += 1;
    match &state.users {
        Some(data) => Json(json!({ "data": data })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Unauthorized", "status": 401, "message": "Invalid OAuth token"})),
        )
            .into_response(),
    }
}

async fn polls(
    State(state): State<SharedTwitch>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock();
    state.poll_bodies.push(body);
    state.poll_headers.push(headers);
    (
        [("content-type", "application/json")],
        state.poll_response.clone(),
    )
        .into_response()
}

/// Start the fake Twitch API and return its base URL.
pub async fn spawn_twitch(state: SharedTwitch) -> String {
    let router = Router::new()
        .route("/oauth2/validate", get(validate))
        .route("/helix/users", get(users))
        .route("/helix/polls", post(polls))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn config_for(base: &str, flow: FlowVariant) -> Config {
    let mut config = Config::default();
    config.twitch.client_id = "test-client".to_string();
    config.twitch.auth_base_url = base.to_string();
    config.twitch.api_base_url = base.to_string();
    config.flow = flow;
    config
}

pub fn helix_for(config: &Config) -> HelixClient {
    HelixClient::new(&config.twitch).unwrap()
}

pub fn memory_session() -> Session {
    Session::new(Arc::new(MemoryStore::new()))
}

/// How the fake identity host answers an authorization flow
#[derive(Clone)]
pub enum Redirect {
    /// Echo the request state back with this token
    Grant(String),
    /// Return this token with a different state
    Tampered(String),
    /// Echo the state but omit the token
    NoToken,
    /// Fail the flow
    Fail,
}

pub struct FakeIdentity {
    pub behavior: Redirect,
    pub launched: Mutex<Vec<String>>,
}

impl FakeIdentity {
    pub fn new(behavior: Redirect) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            launched: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl IdentityHost for FakeIdentity {
    fn redirect_url(&self, provider: &str) -> String {
        format!("https://ext-id.chromiumapp.org/{provider}")
    }

    async fn launch_web_auth_flow(
        &self,
        url: &str,
        interactive: bool,
    ) -> Result<String, HostError> {
        assert!(interactive);
        self.launched.lock().push(url.to_string());

        let request = url::Url::parse(url).unwrap();
        let state = request
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        let state = urlencoding::encode(&state).into_owned();

        let base = self.redirect_url("twitch");
        match &self.behavior {
            Redirect::Grant(token) => Ok(format!(
                "{base}#access_token={token}&scope=channel%3Amanage%3Apolls&state={state}&token_type=bearer"
            )),
            Redirect::Tampered(token) => Ok(format!(
                "{base}#access_token={token}&state=forged&token_type=bearer"
            )),
            Redirect::NoToken => Ok(format!("{base}#state={state}")),
            Redirect::Fail => Err(HostError::Cancelled),
        }
    }
}

/// Tab host with one active tab and scripted frame results
pub struct FakeTabs {
    pub tab: Option<Tab>,
    pub frames: Vec<Value>,
    pub injections: Mutex<usize>,
}

impl FakeTabs {
    pub fn new(url: Option<&str>, frames: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            tab: url.map(|url| Tab {
                id: "7".to_string(),
                url: url.to_string(),
                title: "TalesUp".to_string(),
            }),
            frames,
            injections: Mutex::new(0),
        })
    }

    pub fn injection_count(&self) -> usize {
        *self.injections.lock()
    }
}

#[async_trait]
impl TabHost for FakeTabs {
    async fn active_tab(&self) -> Result<Option<Tab>, HostError> {
        Ok(self.tab.clone())
    }

    async fn execute_script(
        &self,
        _tab: &Tab,
        _function_source: &str,
    ) -> Result<Vec<InjectionResult>, HostError> {
        *self.injections.lock() += 1;
        Ok(self
            .frames
            .iter()
            .enumerate()
            .map(|(i, result)| InjectionResult {
                frame_id: i.to_string(),
                result: result.clone(),
            })
            .collect())
    }
}
