//! Token record and its expiry states
//!
//! A [`TokenRecord`] is the server-held credential set for one browser
//! session. The access token and its absolute expiry are private so they can
//! only change together: [`TokenRecord::issue`] and [`TokenRecord::refreshed`]
//! both take the backend's `expiresIn` and a clock reading.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Error flag set on a record whose refresh failed
pub const REFRESH_ERROR: &str = "RefreshAccessTokenError";

/// User identity as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Access token grant as returned by login, OTP verification and refresh
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: u64,
}

/// Credentials and identity for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    access_token: String,
    refresh_token: String,
    access_token_expires: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TokenRecord {
    /// Build a record from a fresh grant
    pub fn issue(user: UserIdentity, grant: TokenGrant, now_ms: u64) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.unwrap_or_default(),
            access_token_expires: expiry_from(now_ms, grant.expires_in),
            error: None,
        }
    }

    /// Apply a refresh grant. The refresh token is only replaced when the
    /// backend rotated it.
    pub fn refreshed(&self, grant: TokenGrant, now_ms: u64) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            access_token: grant.access_token,
            refresh_token: grant
                .refresh_token
                .unwrap_or_else(|| self.refresh_token.clone()),
            access_token_expires: expiry_from(now_ms, grant.expires_in),
            error: None,
        }
    }

    /// Same credentials, flagged as failed to refresh
    pub fn with_refresh_error(&self) -> Self {
        Self {
            error: Some(REFRESH_ERROR.to_string()),
            ..self.clone()
        }
    }

    /// Profile name change. Tokens and expiry are untouched.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Absolute expiry of the access token in epoch milliseconds
    pub fn access_token_expires(&self) -> u64 {
        self.access_token_expires
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while `now` is before the expiry minus the safety buffer
    pub fn is_fresh_at(&self, now_ms: u64, buffer_ms: u64) -> bool {
        now_ms < self.access_token_expires.saturating_sub(buffer_ms)
    }
}

/// Where a token record sits in its expiry lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// Just issued by credential exchange, not yet stored
    Fresh(TokenRecord),
    /// Usable as-is
    Valid(TokenRecord),
    /// Past the safety buffer, must be refreshed before use
    Expiring(TokenRecord),
    /// The last refresh attempt failed
    Error(TokenRecord),
}

impl TokenState {
    /// Classify a stored record
    pub fn classify(record: TokenRecord, now_ms: u64, buffer_ms: u64) -> Self {
        if record.error.is_some() {
            TokenState::Error(record)
        } else if record.is_fresh_at(now_ms, buffer_ms) {
            TokenState::Valid(record)
        } else {
            TokenState::Expiring(record)
        }
    }

    /// Move a freshly issued record into the stored lifecycle
    pub fn activate(self, now_ms: u64, buffer_ms: u64) -> Self {
        match self {
            TokenState::Fresh(record) => TokenState::classify(record, now_ms, buffer_ms),
            other => other,
        }
    }

    pub fn record(&self) -> &TokenRecord {
        match self {
            TokenState::Fresh(r)
            | TokenState::Valid(r)
            | TokenState::Expiring(r)
            | TokenState::Error(r) => r,
        }
    }

    pub fn into_record(self) -> TokenRecord {
        match self {
            TokenState::Fresh(r)
            | TokenState::Valid(r)
            | TokenState::Expiring(r)
            | TokenState::Error(r) => r,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TokenState::Error(_))
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenState::Fresh(_) => write!(f, "Fresh"),
            TokenState::Valid(_) => write!(f, "Valid"),
            TokenState::Expiring(_) => write!(f, "Expiring"),
            TokenState::Error(_) => write!(f, "Error"),
        }
    }
}

fn expiry_from(now_ms: u64, expires_in_secs: u64) -> u64 {
    now_ms.saturating_add(expires_in_secs.saturating_mul(1000))
}

/// Milliseconds since the Unix epoch
pub fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
