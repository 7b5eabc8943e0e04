use std::sync::Arc;

use axum::http::HeaderValue;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::{Router, extract::DefaultBodyLimit, routing::post};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{AppMode, Config};
use crate::error::FolioError;
use crate::handlers::contact::{contact_handler, method_not_allowed, preflight_handler};
use crate::service::mailer::{Mailer, SmtpMailer};

pub const CONTACT_PATH: &str = "/api/contact";

const CONTACT_BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
pub struct RelayState {
    /// `None` when SMTP credentials are missing; requests then fail with a
    /// configuration error.
    pub mailer: Option<Arc<dyn Mailer>>,
    pub mode: AppMode,
}

impl RelayState {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, mode: AppMode) -> Self {
        Self { mailer, mode }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, FolioError> {
        let mailer = match cfg.smtp() {
            Some(settings) => Some(Arc::new(SmtpMailer::new(&settings)?) as Arc<dyn Mailer>),
            None => None,
        };
        Ok(Self::new(mailer, cfg.app_mode))
    }
}

pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route(
            CONTACT_PATH,
            post(contact_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(CONTACT_BODY_LIMIT))
        // Permissive CORS on every response, errors included.
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .with_state(state)
}
