//! Token lifecycle: serve valid records as-is, refresh the rest

use std::sync::Arc;

use crate::io::HttpClient;
use crate::refresh::refresh_access_token;
use crate::token::{TokenRecord, TokenState};

/// Resolves a stored token record into one that is safe to use for this access
pub struct TokenLifecycle {
    http: Arc<dyn HttpClient>,
    backend_url: String,
    buffer_ms: u64,
}

impl std::fmt::Debug for TokenLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLifecycle")
            .field("backend_url", &self.backend_url)
            .field("buffer_ms", &self.buffer_ms)
            .finish()
    }
}

impl TokenLifecycle {
    pub fn new(http: Arc<dyn HttpClient>, backend_url: impl Into<String>, buffer_ms: u64) -> Self {
        Self {
            http,
            backend_url: backend_url.into(),
            buffer_ms,
        }
    }

    pub fn buffer_ms(&self) -> u64 {
        self.buffer_ms
    }

    /// Resolve `record` for an access at `now_ms`.
    ///
    /// Valid records come back unchanged without touching the network. Records
    /// past the buffer are refreshed exactly once; the outcome is either
    /// `Valid` or `Error`. An errored record still inside the buffer is not
    /// retried.
    pub async fn resolve(&self, record: TokenRecord, now_ms: u64) -> TokenState {
        match TokenState::classify(record, now_ms, self.buffer_ms) {
            TokenState::Valid(record) => TokenState::Valid(record),
            TokenState::Error(record) if record.is_fresh_at(now_ms, self.buffer_ms) => {
                TokenState::Error(record)
            }
            state => {
                tracing::debug!(
                    "Token for user {} is {}, refreshing",
                    state.record().id,
                    state
                );
                let refreshed = refresh_access_token(
                    self.http.as_ref(),
                    &self.backend_url,
                    state.record(),
                    now_ms,
                )
                .await;
                if refreshed.error().is_some() {
                    TokenState::Error(refreshed)
                } else {
                    TokenState::Valid(refreshed)
                }
            }
        }
    }
}
