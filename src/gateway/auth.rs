use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::Gateway;
use crate::error::FolioError;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Admin session returned by a password sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: SessionUser,
}

impl Gateway {
    /// Sign the admin in. On success the session token replaces the anon key
    /// as bearer for every later request made through this gateway.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, FolioError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let resp = self
            .authorized(self.client().post(url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: Session = Self::read_json(resp).await?;
        self.set_session(Some(session.access_token.clone()));
        info!(user = %session.user.id, "admin signed in");
        Ok(session)
    }

    /// Revoke the session server-side when possible; the local session is
    /// dropped either way.
    pub async fn sign_out(&self) {
        if !self.is_signed_in() {
            return;
        }
        let result: Result<(), FolioError> = async {
            let resp = self
                .authorized(self.client().post(self.endpoint("auth/v1/logout")?))
                .send()
                .await?;
            Self::expect_success(resp).await
        }
        .await;
        if let Err(e) = result {
            warn!(error = %e, "server-side sign out failed");
        }
        self.set_session(None);
        info!("admin signed out");
    }
}
