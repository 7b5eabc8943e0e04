use chrono::Utc;
use futures::future::BoxFuture;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use rand::Rng;
use serde::Deserialize;
use tracing::info;

use crate::config::SmtpSettings;
use crate::error::FolioError;

/// A visitor's message from the public contact form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Contact message with every field present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMail {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    /// Require every field, and an email that parses as a reply address.
    pub fn into_mail(self) -> Result<ContactMail, FolioError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let (Some(name), Some(email), Some(message)) =
            (present(self.name), present(self.email), present(self.message))
        else {
            return Err(FolioError::MissingFields);
        };
        if email.parse::<Mailbox>().is_err() {
            return Err(FolioError::InvalidAddress(email));
        }
        Ok(ContactMail {
            name,
            email,
            message,
        })
    }
}

/// Delivers contact mail; returns the Message-ID of the sent mail.
pub trait Mailer: Send + Sync {
    fn send<'a>(&'a self, mail: &'a ContactMail) -> BoxFuture<'a, Result<String, FolioError>>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Address,
    recipient: Mailbox,
}

impl SmtpMailer {
    /// Relay over implicit TLS on port 465.
    pub fn new(settings: &SmtpSettings) -> Result<Self, FolioError> {
        let sender: Address = settings
            .username
            .parse()
            .map_err(|e| FolioError::Mail(format!("invalid SMTP user address: {e}")))?;
        let recipient: Mailbox = settings
            .recipient
            .parse()
            .map_err(|e| FolioError::Mail(format!("invalid contact recipient: {e}")))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send<'a>(&'a self, mail: &'a ContactMail) -> BoxFuture<'a, Result<String, FolioError>> {
        Box::pin(async move {
            let (message, id) = build_message(mail, &self.sender, &self.recipient)?;
            self.transport.send(message).await?;
            info!(message_id = %id, "contact message relayed");
            Ok(id)
        })
    }
}

fn message_id(domain: &str) -> String {
    let nonce: u64 = rand::thread_rng().r#gen();
    format!("<{}.{:016x}@{}>", Utc::now().timestamp_millis(), nonce, domain)
}

/// Compose the relayed mail: sent as the visitor's name from our own
/// address, with replies going to the visitor.
pub fn build_message(
    mail: &ContactMail,
    sender: &Address,
    recipient: &Mailbox,
) -> Result<(Message, String), FolioError> {
    let reply_to: Mailbox = mail
        .email
        .parse()
        .map_err(|_| FolioError::InvalidAddress(mail.email.clone()))?;
    let id = message_id(sender.domain());
    let message = Message::builder()
        .from(Mailbox::new(Some(mail.name.clone()), sender.clone()))
        .reply_to(reply_to)
        .to(recipient.clone())
        .subject(format!("New message from {}", mail.name))
        .message_id(Some(id.clone()))
        .header(ContentType::TEXT_PLAIN)
        .body(format!(
            "From: {} <{}>\n\n{}",
            mail.name, mail.email, mail.message
        ))?;
    Ok((message, id))
}
