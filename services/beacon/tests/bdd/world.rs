//! BDD test world for beacon gateway

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, Request};
use cucumber::World;
use serde_json::Value;
use tower::ServiceExt;

use beacon::config::Config;
use beacon::gateway::{build_router, GatewayState};
use beacon::io::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use beacon::token::{current_epoch_ms, TokenGrant, TokenRecord, UserIdentity};

pub const BACKEND_URL: &str = "http://backend.test/api";

/// A backend double answering from a script and recording every request
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    responses: Mutex<HashMap<String, (u16, String)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedBackend {
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), (status, body.into()));
    }

    /// Requests whose path (relative to the backend base URL) is `path`
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| relative_path(&r.url) == path)
            .cloned()
            .collect()
    }
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
}

fn relative_path(url: &str) -> &str {
    url.strip_prefix(BACKEND_URL).unwrap_or(url)
}

#[async_trait::async_trait]
impl HttpClient for ScriptedBackend {
    async fn send(&self, request: HttpRequest) -> beacon::Result<HttpResponse> {
        let key = format!("{} {}", request.method, relative_path(&request.url));
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().get(&key) {
            Some((status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            None => Err(beacon::BeaconError::Http(format!(
                "no scripted response for {}",
                key
            ))),
        }
    }
}

/// What the browser saw for the last request
#[derive(Debug, Default)]
pub struct LastResponse {
    pub status: u16,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: String,
}

impl LastResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Default, World)]
pub struct BeaconWorld {
    pub backend: Option<Arc<ScriptedBackend>>,
    pub gateway: Option<GatewayState>,
    pub session_id: Option<String>,
    pub response: Option<LastResponse>,
}

impl BeaconWorld {
    pub fn start(&mut self, config: Config) {
        let backend = Arc::new(ScriptedBackend::default());
        let http: Arc<dyn HttpClient> = backend.clone();
        self.gateway = Some(GatewayState::new(&config, http));
        self.backend = Some(backend);
    }

    pub fn config() -> Config {
        let mut config = Config::default();
        config.backend.base_url = BACKEND_URL.to_string();
        config
    }

    pub fn gateway(&self) -> &GatewayState {
        self.gateway.as_ref().expect("gateway not started")
    }

    pub fn backend(&self) -> &ScriptedBackend {
        self.backend.as_ref().expect("gateway not started")
    }

    pub fn response(&self) -> &LastResponse {
        self.response.as_ref().expect("no request sent")
    }

    /// Put a session straight into the store, as a completed sign-in would
    pub async fn sign_in_directly(&mut self, name: &str, expires_in: u64) {
        let now = current_epoch_ms();
        let record = TokenRecord::issue(
            UserIdentity {
                id: "u1".to_string(),
                name: name.to_string(),
                email: "ada@example.com".to_string(),
            },
            TokenGrant {
                access_token: "at".to_string(),
                refresh_token: Some("rt".to_string()),
                expires_in,
            },
            now,
        );
        let id = self.gateway().sessions.create(record, now).await;
        self.session_id = Some(id);
    }

    pub async fn stored_record(&self) -> Option<TokenRecord> {
        let id = self.session_id.as_ref()?;
        self.gateway().sessions.get(id, current_epoch_ms()).await
    }

    /// Send a request carrying the current session cookie, if any
    pub async fn send(&mut self, method: &str, uri: &str, body: Option<Value>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = &self.session_id {
            let cookie_name = &self.gateway().session_config.cookie_name;
            builder = builder.header(COOKIE, format!("{}={}", cookie_name, id));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = build_router(self.gateway().clone())
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status().as_u16();
        let location = header_value(response.headers(), LOCATION);
        let set_cookie = header_value(response.headers(), SET_COOKIE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        self.response = Some(LastResponse {
            status,
            location,
            set_cookie,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        });
    }
}
