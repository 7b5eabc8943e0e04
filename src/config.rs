use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FolioError;

pub const PLACEHOLDER_SUPABASE_URL: &str = "https://placeholder.supabase.co";
pub const PLACEHOLDER_ANON_KEY: &str = "placeholder-key";

const ENV_KEYS: &[&str] = &[
    "supabase_url",
    "supabase_anon_key",
    "smtp_user",
    "smtp_pass",
    "smtp_host",
    "contact_to",
    "listen_addr",
    "loglevel",
    "app_mode",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    Development,
    #[default]
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub supabase_url: Url,
    pub supabase_anon_key: String,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub smtp_host: String,
    pub contact_to: Option<String>,
    pub listen_addr: String,
    pub loglevel: String,
    pub app_mode: AppMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: Url::parse(PLACEHOLDER_SUPABASE_URL).expect("placeholder URL is valid"),
            supabase_anon_key: PLACEHOLDER_ANON_KEY.to_string(),
            smtp_user: None,
            smtp_pass: None,
            smtp_host: "smtp.gmail.com".to_string(),
            contact_to: None,
            listen_addr: "0.0.0.0:3001".to_string(),
            loglevel: "info".to_string(),
            app_mode: AppMode::Production,
        }
    }
}

/// SMTP settings, present only when both credentials are configured.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub recipient: String,
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// Front-end style `VITE_` names are honored, bare names override them.
    pub fn load() -> Result<Self, FolioError> {
        Self::figment().extract().map_err(FolioError::from)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("VITE_").only(ENV_KEYS))
            .merge(Env::raw().only(ENV_KEYS))
    }

    pub fn uses_placeholder_backend(&self) -> bool {
        self.supabase_url.as_str().trim_end_matches('/') == PLACEHOLDER_SUPABASE_URL
    }

    pub fn smtp(&self) -> Option<SmtpSettings> {
        let username = self.smtp_user.as_deref().filter(|s| !s.is_empty())?;
        let password = self.smtp_pass.as_deref().filter(|s| !s.is_empty())?;
        let recipient = self
            .contact_to
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(username);
        Some(SmtpSettings {
            host: self.smtp_host.clone(),
            username: username.to_string(),
            password: password.to_string(),
            recipient: recipient.to_string(),
        })
    }
}
