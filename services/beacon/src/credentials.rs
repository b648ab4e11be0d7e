//! Credential exchange: password or one-time-code sign-in

use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::{backend_message, endpoint_url};
use crate::io::{HttpClient, HttpMethod, HttpRequest};
use crate::token::{TokenGrant, TokenRecord, UserIdentity};
use crate::validation::validate_email;
use crate::BeaconError;

/// Message used when the backend gives no reason for a failed sign-in
pub const DEFAULT_AUTH_FAILURE: &str = "Authentication failed";

/// Sign-in form as posted by the browser
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub otp: Option<String>,
    /// `"otp"` selects the one-time-code flow, anything else the password flow
    #[serde(default)]
    pub login_type: Option<String>,
}

impl LoginForm {
    pub fn into_credentials(self) -> crate::Result<Credentials> {
        validate_email(&self.email)?;
        if self.login_type.as_deref() == Some("otp") {
            Ok(Credentials::Otp {
                email: self.email,
                otp: self.otp.unwrap_or_default(),
            })
        } else {
            Ok(Credentials::Password {
                email: self.email,
                password: self.password.unwrap_or_default(),
            })
        }
    }
}

/// Exactly one of the two sign-in payload shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Password { email: String, password: String },
    Otp { email: String, otp: String },
}

impl Credentials {
    pub fn email(&self) -> &str {
        match self {
            Credentials::Password { email, .. } | Credentials::Otp { email, .. } => email,
        }
    }

    /// Backend endpoint for this flow
    pub fn endpoint(&self) -> &'static str {
        match self {
            Credentials::Password { .. } => "/auth/login",
            Credentials::Otp { .. } => "/auth/verify-otp",
        }
    }

    /// Request body for this flow
    pub fn payload(&self) -> Value {
        match self {
            Credentials::Password { email, password } => {
                json!({ "email": email, "password": password })
            }
            Credentials::Otp { email, otp } => json!({ "email": email, "otp": otp }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInData {
    user: UserIdentity,
    #[serde(flatten)]
    grant: TokenGrant,
}

/// Exchange credentials for a freshly issued token record
pub async fn exchange(
    http: &dyn HttpClient,
    backend_url: &str,
    credentials: &Credentials,
    now_ms: u64,
) -> crate::Result<TokenRecord> {
    let url = endpoint_url(backend_url, credentials.endpoint());
    tracing::debug!("Exchanging credentials for {} at {}", credentials.email(), url);

    let request = HttpRequest::new(HttpMethod::Post, url).json(credentials.payload());
    let response = http.send(request).await?;

    let body: Value = serde_json::from_str(&response.body).unwrap_or(Value::Null);
    if !response.is_success() || !is_truthy(body.get("status")) {
        let message =
            backend_message(&response.body).unwrap_or_else(|| DEFAULT_AUTH_FAILURE.to_string());
        tracing::debug!(
            "Sign-in for {} rejected ({}): {}",
            credentials.email(),
            response.status,
            message
        );
        return Err(BeaconError::Authentication(message));
    }

    let data = body.get("data").cloned().unwrap_or(Value::Null);
    let data: SignInData = serde_json::from_value(data).map_err(|e| {
        tracing::warn!("Malformed sign-in response: {}", e);
        BeaconError::Authentication(DEFAULT_AUTH_FAILURE.to_string())
    })?;

    tracing::info!("User {} signed in", data.user.id);
    Ok(TokenRecord::issue(data.user, data.grant, now_ms))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}
