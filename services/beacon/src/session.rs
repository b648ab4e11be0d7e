//! Server-held sessions keyed by an opaque browser cookie

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cookie::{Cookie, SameSite};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::SessionConfig;
use crate::token::{TokenRecord, UserIdentity};

/// One stored session
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub record: TokenRecord,
    pub created_at_ms: u64,
}

/// Outcome of a conditional write to the store
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Applied,
    /// Another request changed the record first; this is the stored one
    Superseded(TokenRecord),
    /// The session no longer exists
    Missing,
}

/// All active sessions, shared by the middleware and handlers
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionEntry>>>,
    max_age_ms: u64,
}

impl SessionStore {
    pub fn new(max_age_seconds: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_age_ms: max_age_seconds.saturating_mul(1000),
        }
    }

    /// Store a new record under a fresh session id
    pub async fn create(&self, record: TokenRecord, now_ms: u64) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.inner.write().await.insert(
            id.clone(),
            SessionEntry {
                record,
                created_at_ms: now_ms,
            },
        );
        tracing::debug!("Created session for user");
        id
    }

    /// Copy of the record for `id`, dropping it if the session outlived its max age
    pub async fn get(&self, id: &str, now_ms: u64) -> Option<TokenRecord> {
        {
            let sessions = self.inner.read().await;
            let entry = sessions.get(id)?;
            if !self.is_expired(entry, now_ms) {
                return Some(entry.record.clone());
            }
        }
        tracing::debug!("Session expired after max age, removing");
        self.inner.write().await.remove(id);
        None
    }

    /// Replace the record only if it still equals `expected`
    pub async fn replace_if_unchanged(
        &self,
        id: &str,
        expected: &TokenRecord,
        record: TokenRecord,
    ) -> SessionUpdate {
        let mut sessions = self.inner.write().await;
        match sessions.get_mut(id) {
            Some(entry) if entry.record == *expected => {
                entry.record = record;
                SessionUpdate::Applied
            }
            Some(entry) => SessionUpdate::Superseded(entry.record.clone()),
            None => SessionUpdate::Missing,
        }
    }

    /// Sign out only if the record still equals `expected`
    pub async fn remove_if_unchanged(&self, id: &str, expected: &TokenRecord) -> SessionUpdate {
        let mut sessions = self.inner.write().await;
        match sessions.get(id) {
            Some(entry) if entry.record == *expected => {
                sessions.remove(id);
                SessionUpdate::Applied
            }
            Some(entry) => SessionUpdate::Superseded(entry.record.clone()),
            None => SessionUpdate::Missing,
        }
    }

    /// Apply the profile-name update to a stored record
    pub async fn patch_name(&self, id: &str, name: &str) -> Option<TokenRecord> {
        let mut sessions = self.inner.write().await;
        let entry = sessions.get_mut(id)?;
        entry.record = entry.record.with_name(name);
        Some(entry.record.clone())
    }

    /// Sign out
    pub async fn remove(&self, id: &str) -> bool {
        self.inner.write().await.remove(id).is_some()
    }

    /// Drop every session past its max age, returning how many were removed
    pub async fn purge_expired(&self, now_ms: u64) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now_ms < entry.created_at_ms.saturating_add(self.max_age_ms));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    fn is_expired(&self, entry: &SessionEntry, now_ms: u64) -> bool {
        now_ms >= entry.created_at_ms.saturating_add(self.max_age_ms)
    }
}

/// The session resolved for one request.
///
/// Inserted as a request extension by the session middleware and read
/// explicitly by the guard and handlers.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session_id: Option<String>,
    record: Option<TokenRecord>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(session_id: String, record: TokenRecord) -> Self {
        Self {
            session_id: Some(session_id),
            record: Some(record),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.record.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn record(&self) -> Option<&TokenRecord> {
        self.record.as_ref()
    }

    /// Session id and record, or `Unauthorized`
    pub fn require(&self) -> crate::Result<(&str, &TokenRecord)> {
        match (&self.session_id, &self.record) {
            (Some(id), Some(record)) => Ok((id, record)),
            _ => Err(crate::BeaconError::Unauthorized),
        }
    }
}

/// What the browser gets to see of its session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: UserIdentity,
    pub access_token_expires: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&TokenRecord> for SessionView {
    fn from(record: &TokenRecord) -> Self {
        Self {
            user: UserIdentity {
                id: record.id.clone(),
                name: record.name.clone(),
                email: record.email.clone(),
            },
            access_token_expires: record.access_token_expires(),
            error: record.error().map(str::to_string),
        }
    }
}

/// Session id from the request's `Cookie` headers
pub fn read_session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == cookie_name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// `Set-Cookie` value carrying the session id
pub fn session_cookie(config: &SessionConfig, session_id: &str) -> String {
    Cookie::build((config.cookie_name.clone(), session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(
            i64::try_from(config.max_age_seconds).unwrap_or(i64::MAX),
        ))
        .build()
        .to_string()
}

/// `Set-Cookie` value that makes the browser drop the session cookie
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::ZERO)
        .build()
        .to_string()
}
