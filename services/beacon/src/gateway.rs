//! HTTP surface: session middleware, auth endpoints, backend proxies and page shells

use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::BackendClient;
use crate::config::{Config, SessionConfig};
use crate::credentials::{self, LoginForm};
use crate::guard::{guard_middleware, RouteGuard};
use crate::io::HttpClient;
use crate::lifecycle::TokenLifecycle;
use crate::monitor::MonitorForm;
use crate::pages;
use crate::session::{
    clear_session_cookie, read_session_id, session_cookie, SessionContext, SessionStore,
    SessionUpdate, SessionView,
};
use crate::token::{current_epoch_ms, TokenState};
use crate::validation::{validate_email, validate_new_password, validate_otp};
use crate::{BeaconError, Result};

/// Message returned when a profile update would not change anything
pub const NO_CHANGES_MESSAGE: &str = "No changes detected.";

/// Shared state for every handler
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub sessions: SessionStore,
    pub lifecycle: Arc<TokenLifecycle>,
    pub backend: BackendClient,
    pub guard: Arc<RouteGuard>,
    pub session_config: Arc<SessionConfig>,
}

impl GatewayState {
    pub fn new(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        Self {
            sessions: SessionStore::new(config.session.max_age_seconds),
            lifecycle: Arc::new(TokenLifecycle::new(
                Arc::clone(&http),
                config.backend.base_url.clone(),
                config.session.refresh_buffer_ms,
            )),
            backend: BackendClient::new(http, config.backend.base_url.clone()),
            guard: Arc::new(RouteGuard::new(&config.guard)),
            session_config: Arc::new(config.session.clone()),
        }
    }

    /// Load and resolve the session `id` for this access.
    ///
    /// Returns `None` when the session is unknown, expired, or signed out
    /// because its refresh failed. Write-backs only apply if the stored record
    /// is still the one this request read; otherwise the newer record wins.
    async fn resolve_session(&self, id: String, now_ms: u64) -> Option<SessionContext> {
        let stored = self.sessions.get(&id, now_ms).await?;
        let state = self.lifecycle.resolve(stored.clone(), now_ms).await;

        let user_id = state.record().id.clone();

        let outcome = if state.is_error() && self.session_config.sign_out_on_refresh_error {
            self.sessions.remove_if_unchanged(&id, &stored).await
        } else {
            let record = state.into_record();
            if record == stored {
                return Some(SessionContext::authenticated(id, record));
            }
            match self
                .sessions
                .replace_if_unchanged(&id, &stored, record.clone())
                .await
            {
                SessionUpdate::Applied => return Some(SessionContext::authenticated(id, record)),
                other => other,
            }
        };

        match outcome {
            SessionUpdate::Applied => {
                tracing::info!("Signing out user {} after failed token refresh", user_id);
                None
            }
            SessionUpdate::Superseded(newer) => {
                tracing::debug!("Session for user {} was updated concurrently", user_id);
                Some(SessionContext::authenticated(id, newer))
            }
            // signed out concurrently
            SessionUpdate::Missing => None,
        }
    }
}

/// Build the gateway router
pub fn build_router(state: GatewayState) -> Router {
    let guard = Arc::clone(&state.guard);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        // auth
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/session", get(session_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/forgot-password", post(forgot_password_handler))
        .route("/api/auth/resend-otp", post(resend_otp_handler))
        .route("/api/auth/reset-password", post(reset_password_handler))
        .route("/api/auth/profile", patch(profile_handler))
        .route("/api/auth/password", patch(password_handler))
        // monitors
        .route(
            "/api/monitors",
            get(list_monitors_handler).post(create_monitor_handler),
        )
        .route("/api/monitors/stats", get(monitor_stats_handler))
        .route(
            "/api/monitors/{id}",
            get(get_monitor_handler)
                .put(update_monitor_handler)
                .delete(delete_monitor_handler),
        )
        .route("/api/monitors/{id}/toggle", patch(toggle_monitor_handler))
        .route("/api/monitors/{id}/pings", get(monitor_pings_handler))
        .route("/api/monitors/{id}/graph", get(monitor_graph_handler))
        // incidents and analytics
        .route("/api/incidents", get(list_incidents_handler))
        .route("/api/incidents/recent", get(recent_incidents_handler))
        .route("/api/insights", get(insights_handler))
        .fallback(page_handler)
        // the session layer is added last so it runs first
        .layer(middleware::from_fn_with_state(guard, guard_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state)
}

/// Resolve the cookie's session and expose it as a [`SessionContext`] extension
async fn session_middleware(
    State(gateway): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Response {
    let now_ms = current_epoch_ms();
    let session_id = read_session_id(request.headers(), &gateway.session_config.cookie_name);

    let (context, stale_cookie) = match session_id {
        Some(id) => match gateway.resolve_session(id, now_ms).await {
            Some(context) => (context, false),
            None => (SessionContext::anonymous(), true),
        },
        None => (SessionContext::anonymous(), false),
    };
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;
    if stale_cookie && !response.headers().contains_key(SET_COOKIE) {
        if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(&gateway.session_config)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

async fn root_handler(State(gateway): State<GatewayState>) -> Redirect {
    Redirect::to(gateway.guard.landing_page())
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn page_handler(Extension(session): Extension<SessionContext>, uri: Uri) -> Response {
    let path = uri.path();
    match pages::lookup(path) {
        Some(page) => Html(pages::render(page, session.record())).into_response(),
        None if path.starts_with("/api/") => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Not found" })),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, Html("<h1>Not found</h1>")).into_response(),
    }
}

// --- Auth ---

async fn login_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Json(form): Json<LoginForm>,
) -> Result<Response> {
    let credentials = form.into_credentials()?;
    let now_ms = current_epoch_ms();
    let record = credentials::exchange(
        gateway.backend.http(),
        gateway.backend.base_url(),
        &credentials,
        now_ms,
    )
    .await?;

    let state = TokenState::Fresh(record).activate(now_ms, gateway.lifecycle.buffer_ms());
    tracing::debug!("Token for user {} is {}", state.record().id, state);

    if let Some(old) = session.session_id() {
        gateway.sessions.remove(old).await;
    }
    let record = state.into_record();
    let view = SessionView::from(&record);
    let id = gateway.sessions.create(record, now_ms).await;

    Ok((
        [(SET_COOKIE, session_cookie(&gateway.session_config, &id))],
        Json(view),
    )
        .into_response())
}

async fn logout_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
) -> Response {
    if let Some(id) = session.session_id() {
        gateway.sessions.remove(id).await;
        if let Some(record) = session.record() {
            tracing::info!("User {} signed out", record.id);
        }
    }
    (
        [(SET_COOKIE, clear_session_cookie(&gateway.session_config))],
        Redirect::to(gateway.guard.sign_in_page()),
    )
        .into_response()
}

async fn session_handler(
    Extension(session): Extension<SessionContext>,
) -> Result<Json<SessionView>> {
    let (_, record) = session.require()?;
    Ok(Json(SessionView::from(record)))
}

async fn register_handler(
    State(gateway): State<GatewayState>,
    Json(form): Json<Value>,
) -> Result<Json<Value>> {
    validate_email(form.get("email").and_then(Value::as_str).unwrap_or_default())?;
    Ok(Json(gateway.backend.register(form).await?))
}

#[derive(Debug, Deserialize)]
struct EmailForm {
    #[serde(default)]
    email: String,
}

async fn forgot_password_handler(
    State(gateway): State<GatewayState>,
    Json(form): Json<EmailForm>,
) -> Result<Json<Value>> {
    validate_email(&form.email)?;
    Ok(Json(gateway.backend.forgot_password(&form.email).await?))
}

async fn resend_otp_handler(
    State(gateway): State<GatewayState>,
    Json(form): Json<EmailForm>,
) -> Result<Json<Value>> {
    validate_email(&form.email)?;
    Ok(Json(gateway.backend.resend_otp(&form.email).await?))
}

#[derive(Debug, Deserialize)]
struct ResetPasswordForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    otp: String,
    #[serde(default)]
    password: String,
}

async fn reset_password_handler(
    State(gateway): State<GatewayState>,
    Json(form): Json<ResetPasswordForm>,
) -> Result<Json<Value>> {
    validate_email(&form.email)?;
    validate_otp(&form.otp)?;
    Ok(Json(
        gateway
            .backend
            .reset_password(&form.email, &form.otp, &form.password)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct ProfileForm {
    #[serde(default)]
    name: String,
}

async fn profile_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<Value>> {
    let (id, record) = session.require()?;
    let name = form.name.trim();
    if name.is_empty() {
        return Err(BeaconError::Validation("Name is required".to_string()));
    }
    if name == record.name {
        return Ok(Json(json!({
            "message": NO_CHANGES_MESSAGE,
            "session": SessionView::from(record),
        })));
    }

    let stored_name = gateway
        .backend
        .update_profile(record.access_token(), name)
        .await?;
    let updated = gateway
        .sessions
        .patch_name(id, &stored_name)
        .await
        .ok_or(BeaconError::Unauthorized)?;
    tracing::info!("User {} changed their display name", updated.id);

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "session": SessionView::from(&updated),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordForm {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
    #[serde(default)]
    confirm_password: String,
}

async fn password_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Json(form): Json<PasswordForm>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    validate_new_password(&form.new_password, &form.confirm_password)?;
    Ok(Json(
        gateway
            .backend
            .change_password(
                record.access_token(),
                &form.current_password,
                &form.new_password,
            )
            .await?,
    ))
}

// --- Monitors ---

async fn list_monitors_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(gateway.backend.list_monitors(record.access_token()).await?))
}

async fn monitor_stats_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(gateway.backend.monitor_stats(record.access_token()).await?))
}

async fn get_monitor_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(
        gateway.backend.get_monitor(record.access_token(), &id).await?,
    ))
}

async fn create_monitor_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Json(form): Json<MonitorForm>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    let payload = form.into_payload()?;
    Ok(Json(
        gateway
            .backend
            .create_monitor(record.access_token(), &payload)
            .await?,
    ))
}

async fn update_monitor_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(form): Json<MonitorForm>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    let payload = form.into_payload()?;
    Ok(Json(
        gateway
            .backend
            .update_monitor(record.access_token(), &id, &payload)
            .await?,
    ))
}

async fn toggle_monitor_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(
        gateway
            .backend
            .toggle_monitor(record.access_token(), &id)
            .await?,
    ))
}

async fn delete_monitor_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(
        gateway
            .backend
            .delete_monitor(record.access_token(), &id)
            .await?,
    ))
}

async fn monitor_pings_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(
        gateway
            .backend
            .monitor_pings(record.access_token(), &id)
            .await?,
    ))
}

async fn monitor_graph_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(
        gateway
            .backend
            .monitor_graph(record.access_token(), &id)
            .await?,
    ))
}

// --- Incidents and analytics ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncidentQuery {
    monitor_id: Option<String>,
}

async fn list_incidents_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<IncidentQuery>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    let monitor_id = query.monitor_id.as_deref().filter(|id| !id.is_empty());
    Ok(Json(
        gateway
            .backend
            .list_incidents(record.access_token(), monitor_id)
            .await?,
    ))
}

async fn recent_incidents_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(
        gateway.backend.recent_incidents(record.access_token()).await?,
    ))
}

async fn insights_handler(
    State(gateway): State<GatewayState>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Value>> {
    let (_, record) = session.require()?;
    Ok(Json(gateway.backend.insights(record.access_token()).await?))
}
