//! Application state for the RAG server

use axum::http::HeaderMap;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::pipeline::RagPipeline;
use crate::security::SecretGate;

/// Header carrying the admin secret
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Header carrying the user-tier secret
pub const APP_PASSWORD_HEADER: &str = "x-app-password";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pipeline: Arc<RagPipeline>,
    admin: SecretGate,
    app: SecretGate,
}

impl AppState {
    /// State over an initialized pipeline; secrets come from its configuration
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        let security = &pipeline.config().security;
        let admin = SecretGate::new(security.admin_password.as_deref());
        let app = SecretGate::new(security.app_password.as_deref());

        if !admin.is_configured() {
            tracing::warn!("No admin password configured; refresh and uploads are disabled");
        }
        if !app.is_configured() {
            tracing::warn!("No app password configured; query and document endpoints are open");
        }

        Self {
            inner: Arc::new(AppStateInner { pipeline, admin, app }),
        }
    }

    /// The pipeline
    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.inner.pipeline
    }

    /// Active configuration
    pub fn config(&self) -> &RagConfig {
        self.inner.pipeline.config()
    }

    /// Require a valid admin secret
    pub fn require_admin(&self, headers: &HeaderMap) -> Result<()> {
        if !self.inner.admin.is_configured() {
            return Err(Error::Unauthorized(
                "admin operations are disabled: no admin password is configured".to_string(),
            ));
        }
        check(&self.inner.admin, headers, ADMIN_PASSWORD_HEADER)
    }

    /// Require the user-tier secret when one is configured
    pub fn require_user(&self, headers: &HeaderMap) -> Result<()> {
        if !self.inner.app.is_configured() {
            return Ok(());
        }
        check(&self.inner.app, headers, APP_PASSWORD_HEADER)
    }
}

fn check(gate: &SecretGate, headers: &HeaderMap, header: &str) -> Result<()> {
    let candidate = headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if gate.verify(candidate) {
        Ok(())
    } else {
        tracing::warn!("Rejected request with invalid {}", header);
        Err(Error::Unauthorized(format!("missing or incorrect {}", header)))
    }
}
