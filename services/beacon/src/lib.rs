//! Beacon - Session gateway for the uptime monitoring dashboard
//!
//! Holds user sessions server-side, keeps backend access tokens fresh, guards
//! dashboard routes and proxies dashboard calls to the monitoring backend.

pub mod backend;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod io;
pub mod lifecycle;
pub mod monitor;
pub mod pages;
pub mod refresh;
pub mod session;
pub mod token;
pub mod validation;

pub use config::{load_config, Config};
pub use error::{BeaconError, Result};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::gateway::GatewayState;
use crate::io::ReqwestHttpClient;
use crate::session::SessionStore;
use crate::token::current_epoch_ms;

/// Run the beacon gateway with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new(Duration::from_secs(
        config.backend.timeout_seconds,
    ))?);
    let cancel = CancellationToken::new();

    let state = GatewayState::new(&config, http);

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    // Drop sessions that outlived their max age
    let purge_interval = Duration::from_secs(config.session.purge_interval_seconds.max(1));
    tokio::spawn(purge_sessions(
        state.sessions.clone(),
        purge_interval,
        cancel.clone(),
    ));

    let router = gateway::build_router(state);
    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    tracing::info!("Beacon listening on http://{}", listener.local_addr()?);
    tracing::debug!("Proxying to backend at {}", config.backend.base_url);

    let cancel_for_server = cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            cancel_for_server.cancelled().await;
        })
        .await?;

    cancel.cancel();
    tracing::info!("Beacon stopped");
    Ok(())
}

async fn purge_sessions(sessions: SessionStore, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let removed = sessions.purge_expired(current_epoch_ms()).await;
                if removed > 0 {
                    tracing::debug!("Purged {} expired sessions", removed);
                }
            }
        }
    }
    tracing::debug!("Session purge task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{TokenGrant, TokenRecord, UserIdentity};

    #[tokio::test]
    async fn purge_task_stops_on_cancel() {
        let sessions = SessionStore::new(0);
        let record = TokenRecord::issue(
            UserIdentity {
                id: "u1".to_string(),
                name: "Ada".to_string(),
                email: "a@b.com".to_string(),
            },
            TokenGrant {
                access_token: "at".to_string(),
                refresh_token: None,
                expires_in: 60,
            },
            0,
        );
        sessions.create(record, 0).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(purge_sessions(
            sessions.clone(),
            Duration::from_millis(10),
            cancel.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(sessions.is_empty().await);
    }
}
