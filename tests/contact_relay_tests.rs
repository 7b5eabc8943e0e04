use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use folio::FolioError;
use folio::config::AppMode;
use folio::router::{CONTACT_PATH, RelayState, relay_router};
use folio::service::mailer::{ContactMail, Mailer};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<ContactMail>>,
    fail_with: Option<String>,
}

impl Mailer for RecordingMailer {
    fn send<'a>(&'a self, mail: &'a ContactMail) -> BoxFuture<'a, Result<String, FolioError>> {
        Box::pin(async move {
            if let Some(reason) = &self.fail_with {
                return Err(FolioError::Mail(reason.clone()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok("<1700000000000.abc@example.com>".to_string())
        })
    }
}

fn app_with(mailer: Option<Arc<RecordingMailer>>, mode: AppMode) -> Router {
    let mailer = mailer.map(|m| m as Arc<dyn Mailer>);
    relay_router(RelayState::new(mailer, mode))
}

async fn call(app: Router, method: &str, body: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(CONTACT_PATH)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body was not json")
    };
    (status, headers, json)
}

const VALID: &str = r#"{"name":"A","email":"a@b.com","message":"hi"}"#;

#[tokio::test]
async fn valid_submission_is_relayed() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app_with(Some(mailer.clone()), AppMode::Production);

    let (status, headers, body) = call(app, "POST", VALID).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert!(body["id"].is_string());
    assert_eq!(headers["access-control-allow-origin"], "*");

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "a@b.com");
    assert_eq!(sent[0].message, "hi");
}

#[tokio::test]
async fn missing_message_is_rejected() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app_with(Some(mailer.clone()), AppMode::Production);

    let (status, _, body) = call(app, "POST", r#"{"name":"A","email":"a@b.com"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing required fields"}));
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unparsable_email_is_rejected() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = app_with(Some(mailer.clone()), AppMode::Production);

    let (status, headers, body) = call(
        app,
        "POST",
        r#"{"name":"A","email":"not-an-address","message":"hi"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid email address"}));
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_json_counts_as_missing_fields() {
    let app = app_with(Some(Arc::default()), AppMode::Production);
    let (status, _, body) = call(app, "POST", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn unconfigured_smtp_is_a_server_error() {
    let app = app_with(None, AppMode::Production);
    let (status, _, body) = call(app, "POST", VALID).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Server configuration error"}));
}

#[tokio::test]
async fn preflight_is_answered_with_cors_headers() {
    let app = app_with(None, AppMode::Production);
    let (status, headers, body) = call(app, "OPTIONS", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let app = app_with(None, AppMode::Production);
    let (status, headers, body) = call(app, "GET", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "Method Not Allowed"}));
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
}

#[tokio::test]
async fn delivery_failure_hides_details_in_production() {
    let mailer = Arc::new(RecordingMailer {
        fail_with: Some("535 5.7.8 Username and Password not accepted".into()),
        ..RecordingMailer::default()
    });
    let app = app_with(Some(mailer), AppMode::Production);
    let (status, _, body) = call(app, "POST", VALID).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to send message"}));
}

#[tokio::test]
async fn delivery_failure_shows_details_in_development() {
    let mailer = Arc::new(RecordingMailer {
        fail_with: Some("connection refused".into()),
        ..RecordingMailer::default()
    });
    let app = app_with(Some(mailer), AppMode::Development);
    let (status, _, body) = call(app, "POST", VALID).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to send message");
    assert!(body["details"].as_str().unwrap().contains("connection refused"));
}
