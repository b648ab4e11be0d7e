//! Typed client for the monitoring backend's REST surface
//!
//! Response bodies are opaque JSON and are handed back unchanged. Only the
//! status code and the backend's `message` field are interpreted.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::io::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::monitor::MonitorPayload;

/// Join the backend base URL and an endpoint path
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Backend path for one monitor, with the id encoded as a single segment.
///
/// Ids that would walk out of `/monitor` (`.` and `..`) are rejected.
pub fn monitor_path(id: &str, action: Option<&str>) -> crate::Result<String> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(crate::BeaconError::Validation(format!(
            "Invalid monitor id: {:?}",
            id
        )));
    }
    let mut path = format!("/monitor/{}", urlencoding::encode(id));
    if let Some(action) = action {
        path.push('/');
        path.push_str(action);
    }
    Ok(path)
}

/// The backend's `message` field, if the body carries one
pub fn backend_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Client for the monitoring backend
#[derive(Clone)]
pub struct BackendClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl BackendClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &dyn HttpClient {
        self.http.as_ref()
    }

    async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        bearer: Option<&str>,
        body: Option<Value>,
        fallback: &str,
    ) -> crate::Result<Value> {
        let mut request = HttpRequest::new(method, endpoint_url(&self.base_url, path));
        if let Some(token) = bearer {
            request = request.bearer(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self.http.send(request).await?;
        parse_response(response, fallback)
    }

    // --- Registration and OTP utilities (no session) ---

    pub async fn register(&self, form: Value) -> crate::Result<Value> {
        self.call(
            HttpMethod::Post,
            "/auth/register",
            None,
            Some(form),
            "Registration failed",
        )
        .await
    }

    pub async fn forgot_password(&self, email: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Post,
            "/auth/forgot-password",
            None,
            Some(json!({ "email": email })),
            "Something went wrong. Please try again.",
        )
        .await
    }

    pub async fn resend_otp(&self, email: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Post,
            "/auth/resend-otp",
            None,
            Some(json!({ "email": email })),
            "Failed to resend",
        )
        .await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        password: &str,
    ) -> crate::Result<Value> {
        self.call(
            HttpMethod::Post,
            "/auth/reset-password",
            None,
            Some(json!({ "email": email, "otp": otp, "password": password })),
            "Failed to reset password",
        )
        .await
    }

    // --- Account ---

    /// Change the display name, returning the name the backend stored
    pub async fn update_profile(&self, token: &str, name: &str) -> crate::Result<String> {
        let response = self
            .call(
                HttpMethod::Patch,
                "/auth/profile",
                Some(token),
                Some(json!({ "name": name })),
                "Failed to update profile. Please try again.",
            )
            .await?;
        Ok(response
            .pointer("/data/name")
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string())
    }

    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> crate::Result<Value> {
        self.call(
            HttpMethod::Patch,
            "/auth/password",
            Some(token),
            Some(json!({
                "currentPassword": current_password,
                "newPassword": new_password,
            })),
            "Failed to update password.",
        )
        .await
    }

    // --- Monitors ---

    pub async fn list_monitors(&self, token: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Get,
            "/monitor",
            Some(token),
            None,
            "Failed to load monitors",
        )
        .await
    }

    pub async fn monitor_stats(&self, token: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Get,
            "/monitor/stats",
            Some(token),
            None,
            "Failed to load stats",
        )
        .await
    }

    pub async fn get_monitor(&self, token: &str, id: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Get,
            &monitor_path(id, None)?,
            Some(token),
            None,
            "Failed to load monitor details.",
        )
        .await
    }

    pub async fn create_monitor(
        &self,
        token: &str,
        payload: &MonitorPayload,
    ) -> crate::Result<Value> {
        self.call(
            HttpMethod::Post,
            "/monitor",
            Some(token),
            Some(serde_json::to_value(payload)?),
            "Failed to create monitor",
        )
        .await
    }

    pub async fn update_monitor(
        &self,
        token: &str,
        id: &str,
        payload: &MonitorPayload,
    ) -> crate::Result<Value> {
        self.call(
            HttpMethod::Put,
            &monitor_path(id, None)?,
            Some(token),
            Some(serde_json::to_value(payload)?),
            "Failed to update monitor",
        )
        .await
    }

    pub async fn toggle_monitor(&self, token: &str, id: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Patch,
            &monitor_path(id, Some("toggle"))?,
            Some(token),
            Some(json!({})),
            "Failed to toggle monitor",
        )
        .await
    }

    pub async fn delete_monitor(&self, token: &str, id: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Delete,
            &monitor_path(id, None)?,
            Some(token),
            None,
            "Failed to delete monitor",
        )
        .await
    }

    pub async fn monitor_pings(&self, token: &str, id: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Get,
            &monitor_path(id, Some("pings"))?,
            Some(token),
            None,
            "Failed to load pings",
        )
        .await
    }

    pub async fn monitor_graph(&self, token: &str, id: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Get,
            &monitor_path(id, Some("graph"))?,
            Some(token),
            None,
            "Failed to fetch graph data",
        )
        .await
    }

    // --- Incidents and analytics ---

    pub async fn list_incidents(
        &self,
        token: &str,
        monitor_id: Option<&str>,
    ) -> crate::Result<Value> {
        let path = match monitor_id {
            Some(id) => format!("/incidents?monitorId={}", urlencoding::encode(id)),
            None => "/incidents".to_string(),
        };
        self.call(
            HttpMethod::Get,
            &path,
            Some(token),
            None,
            "Failed to load incidents",
        )
        .await
    }

    pub async fn recent_incidents(&self, token: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Get,
            "/incidents/recent",
            Some(token),
            None,
            "Failed to load incidents",
        )
        .await
    }

    pub async fn insights(&self, token: &str) -> crate::Result<Value> {
        self.call(
            HttpMethod::Get,
            "/insights",
            Some(token),
            None,
            "Failed to load insights",
        )
        .await
    }
}

fn parse_response(response: HttpResponse, fallback: &str) -> crate::Result<Value> {
    if !response.is_success() {
        let message = backend_message(&response.body).unwrap_or_else(|| fallback.to_string());
        tracing::debug!("Backend rejected request: {} {}", response.status, message);
        return Err(crate::BeaconError::Backend {
            status: response.status,
            message,
        });
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&response.body)?)
}
