use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum FolioError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success answer from the hosted backend; `message` is what the
    /// backend said, suitable for showing to the admin user.
    #[error("{message}")]
    Backend {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("No row in {table} with id {id}")]
    NotFound { table: String, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid email address")]
    InvalidAddress(String),

    #[error("Server configuration error")]
    MailNotConfigured,

    #[error("Failed to send message: {0}")]
    Mail(String),

    #[error("Portfolio data accessed before it was provided")]
    ContextUnavailable,

    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),
}

impl From<figment::Error> for FolioError {
    fn from(e: figment::Error) -> Self {
        FolioError::Config(Box::new(e))
    }
}

impl From<lettre::error::Error> for FolioError {
    fn from(e: lettre::error::Error) -> Self {
        FolioError::Mail(e.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for FolioError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        FolioError::Mail(e.to_string())
    }
}

impl FolioError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FolioError::MissingFields
            | FolioError::Validation(_)
            | FolioError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to an anonymous HTTP caller.
    pub fn public_message(&self) -> String {
        match self {
            FolioError::MissingFields
            | FolioError::Validation(_)
            | FolioError::InvalidAddress(_)
            | FolioError::MailNotConfigured => self.to_string(),
            FolioError::Mail(_) => "Failed to send message".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for FolioError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ApiErrorResponse {
            error: self.public_message(),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

/// JSON error body returned by the contact relay.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error body shapes emitted by the hosted backend. PostgREST and storage use
/// `message`, the auth service uses `error_description` or `msg`.
#[derive(Deserialize, Debug, Default)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl BackendErrorBody {
    pub fn into_error(self, status: reqwest::StatusCode) -> FolioError {
        let message = self
            .message
            .or(self.error_description)
            .or(self.msg)
            .or(self.error)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Backend request failed")
                    .to_string()
            });
        FolioError::Backend { status, message }
    }

    pub fn parse(status: reqwest::StatusCode, body: &[u8]) -> FolioError {
        serde_json::from_slice::<BackendErrorBody>(body)
            .unwrap_or_default()
            .into_error(status)
    }
}
