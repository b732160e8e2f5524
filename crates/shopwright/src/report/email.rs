//! SMTP delivery of the zipped report.

use crate::config::EmailSettings;
use crate::result::{ShopError, ShopResult};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;
use tracing::info;

fn email_error(message: impl std::fmt::Display) -> ShopError {
    ShopError::Email {
        message: message.to_string(),
    }
}

fn mailbox(address: &str) -> ShopResult<Mailbox> {
    address
        .parse()
        .map_err(|e| ShopError::invalid("email address", format!("'{address}': {e}")))
}

/// Sends the report archive by mail
#[derive(Debug, Clone)]
pub struct ReportMailer {
    settings: EmailSettings,
}

impl ReportMailer {
    /// Mailer over `settings`
    #[must_use]
    pub const fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    /// Settings in use
    #[must_use]
    pub const fn settings(&self) -> &EmailSettings {
        &self.settings
    }

    /// Check that host, sender and at least one recipient are set
    pub fn validate(&self) -> ShopResult<()> {
        let s = &self.settings;
        if s.smtp_host.trim().is_empty() {
            return Err(ShopError::config("email.smtp_host is not set"));
        }
        if s.from.trim().is_empty() {
            return Err(ShopError::config("email.from is not set"));
        }
        if s.to.iter().all(|t| t.trim().is_empty()) {
            return Err(ShopError::config("email.to has no recipients"));
        }
        Ok(())
    }

    /// Build the message with `attachment` as `application/zip`
    pub fn build_message(&self, attachment: &Path) -> ShopResult<Message> {
        self.validate()?;
        let s = &self.settings;
        let mut builder = Message::builder().from(mailbox(&s.from)?).subject(&s.subject);
        for to in s.to.iter().filter(|t| !t.trim().is_empty()) {
            builder = builder.to(mailbox(to.trim())?);
        }
        let file_name = attachment
            .file_name()
            .map_or_else(|| "report.zip".to_string(), |n| n.to_string_lossy().into_owned());
        let body = std::fs::read(attachment)?;
        let content_type = ContentType::parse("application/zip").map_err(email_error)?;
        builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(s.body.clone()))
                    .singlepart(Attachment::new(file_name).body(body, content_type)),
            )
            .map_err(email_error)
    }

    /// Mail `attachment`. Returns `Ok(false)` without sending when email is
    /// disabled.
    pub async fn send(&self, attachment: &Path) -> ShopResult<bool> {
        let s = &self.settings;
        if !s.enabled {
            info!("email sending is disabled");
            return Ok(false);
        }
        let message = self.build_message(attachment)?;
        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&s.smtp_host)
            .map_err(email_error)?
            .port(s.smtp_port);
        if !s.username.is_empty() {
            transport = transport.credentials(Credentials::new(s.username.clone(), s.password.clone()));
        }
        transport.build().send(message).await.map_err(email_error)?;
        info!(recipients = ?s.to, "report emailed");
        Ok(true)
    }
}
