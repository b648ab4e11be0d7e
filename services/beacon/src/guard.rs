//! Route guard: redirects navigations by path class and session presence

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::config::GuardConfig;
use crate::session::SessionContext;

/// How a request path is treated by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Authentication-flow pages
    Public,
    /// Everything that needs a session
    Protected,
    /// Protected, but never redirected; authorization happens in the handler
    Api,
    /// Static assets and health checks
    Exempt,
}

/// Outcome for one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Path classification and redirect targets
#[derive(Debug, Clone)]
pub struct RouteGuard {
    public_paths: Vec<String>,
    exempt_paths: Vec<String>,
    api_prefix: String,
    landing_page: String,
    sign_in_page: String,
}

impl RouteGuard {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            public_paths: config.public_paths.clone(),
            exempt_paths: config.exempt_paths.clone(),
            api_prefix: config.api_prefix.clone(),
            landing_page: config.landing_page.clone(),
            sign_in_page: config.sign_in_page.clone(),
        }
    }

    pub fn landing_page(&self) -> &str {
        &self.landing_page
    }

    pub fn sign_in_page(&self) -> &str {
        &self.sign_in_page
    }

    pub fn classify(&self, path: &str) -> PathClass {
        if path.contains('.') || self.exempt_paths.iter().any(|p| path.starts_with(p.as_str())) {
            PathClass::Exempt
        } else if self.public_paths.iter().any(|p| path.starts_with(p.as_str())) {
            PathClass::Public
        } else if !self.api_prefix.is_empty() && path.starts_with(self.api_prefix.as_str()) {
            PathClass::Api
        } else {
            PathClass::Protected
        }
    }

    pub fn decide(&self, path: &str, has_token: bool) -> GuardDecision {
        match (self.classify(path), has_token) {
            (PathClass::Public, true) => GuardDecision::Redirect(self.landing_page.clone()),
            (PathClass::Protected, false) => GuardDecision::Redirect(self.sign_in_page.clone()),
            _ => GuardDecision::Allow,
        }
    }
}

/// Apply the guard using the [`SessionContext`] placed by the session middleware
pub async fn guard_middleware(
    State(guard): State<Arc<RouteGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let has_token = request
        .extensions()
        .get::<SessionContext>()
        .is_some_and(SessionContext::is_authenticated);
    let path = request.uri().path().to_string();

    match guard.decide(&path, has_token) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(target) => {
            tracing::debug!("Guard redirecting {} -> {}", path, target);
            Redirect::to(&target).into_response()
        }
    }
}
