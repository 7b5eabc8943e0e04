use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::AppMode;
use crate::error::{ApiErrorResponse, FolioError};
use crate::router::RelayState;
use crate::service::mailer::ContactMessage;

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactReceipt {
    pub ok: bool,
    pub id: String,
}

/// Relay one contact form submission by mail.
pub async fn contact_handler(State(state): State<RelayState>, body: Bytes) -> Response {
    // A malformed body is treated like an empty one.
    let form: ContactMessage = serde_json::from_slice(&body).unwrap_or_default();

    match relay(&state, form).await {
        Ok(id) => {
            info!(message_id = %id, "contact form relayed");
            Json(ContactReceipt { ok: true, id }).into_response()
        }
        Err(e @ FolioError::Mail(_)) => {
            error!(error = %e, "contact relay failed");
            match state.mode {
                AppMode::Development => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiErrorResponse {
                        error: e.public_message(),
                        details: Some(e.to_string()),
                    }),
                )
                    .into_response(),
                AppMode::Production => e.into_response(),
            }
        }
        Err(e) => e.into_response(),
    }
}

async fn relay(state: &RelayState, form: ContactMessage) -> Result<String, FolioError> {
    let mail = form.into_mail()?;
    let Some(mailer) = state.mailer.as_ref() else {
        error!("SMTP credentials are not configured");
        return Err(FolioError::MailNotConfigured);
    };
    mailer.send(&mail).await
}

pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ApiErrorResponse {
            error: "Method Not Allowed".to_string(),
            details: None,
        }),
    )
        .into_response()
}
