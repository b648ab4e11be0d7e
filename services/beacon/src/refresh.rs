//! Refresh procedure: mint a new access token from the refresh token

use serde::Deserialize;
use serde_json::json;

use crate::backend::endpoint_url;
use crate::io::{HttpClient, HttpMethod, HttpRequest};
use crate::token::{TokenGrant, TokenRecord};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    data: TokenGrant,
}

/// Refresh `record` against the backend.
///
/// Always returns a usable record: on any failure the original credentials
/// come back with the refresh error flag set.
pub async fn refresh_access_token(
    http: &dyn HttpClient,
    backend_url: &str,
    record: &TokenRecord,
    now_ms: u64,
) -> TokenRecord {
    match try_refresh(http, backend_url, record).await {
        Ok(grant) => {
            tracing::debug!(
                "Refreshed access token for user {} (rotated={})",
                record.id,
                grant.refresh_token.is_some()
            );
            record.refreshed(grant, now_ms)
        }
        Err(e) => {
            tracing::warn!("RefreshAccessTokenError for user {}: {}", record.id, e);
            record.with_refresh_error()
        }
    }
}

async fn try_refresh(
    http: &dyn HttpClient,
    backend_url: &str,
    record: &TokenRecord,
) -> crate::Result<TokenGrant> {
    if record.refresh_token().is_empty() {
        return Err(crate::BeaconError::Authentication(
            "No refresh token in session".to_string(),
        ));
    }

    let request = HttpRequest::new(
        HttpMethod::Post,
        endpoint_url(backend_url, "/auth/refresh-token"),
    )
    .json(json!({ "refreshToken": record.refresh_token() }));

    let response = http.send(request).await?;
    if !response.is_success() {
        return Err(crate::BeaconError::Backend {
            status: response.status,
            message: crate::backend::backend_message(&response.body)
                .unwrap_or_else(|| "refresh rejected".to_string()),
        });
    }

    let parsed: RefreshResponse = serde_json::from_str(&response.body)?;
    Ok(parsed.data)
}
