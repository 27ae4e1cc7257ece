pub mod templates;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to send email: {0}")]
    Transport(String),
}

/// Out-of-band delivery of reset tokens.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to_email: &str, token: &str) -> Result<(), MailError>;
}

/// Fields shared by every reset email, whatever the transport.
#[derive(Debug, Clone)]
pub struct ResetEmail {
    pub reset_url: Option<String>,
    pub ttl_minutes: i64,
}

impl ResetEmail {
    pub fn render(&self, token: &str) -> String {
        templates::render_password_reset(token, self.reset_url.as_deref(), self.ttl_minutes)
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    email: ResetEmail,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, email: ResetEmail) -> Result<Self, MailError> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
            email,
        })
    }

    async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| MailError::Address(format!("from: {e}")))?,
            )
            .to(to.parse().map_err(|e| MailError::Address(format!("to: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, to_email: &str, token: &str) -> Result<(), MailError> {
        self.send(to_email, "Password Reset", self.email.render(token))
            .await
    }
}

/// Stand-in used when no SMTP relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to_email: &str, token: &str) -> Result<(), MailError> {
        tracing::warn!("SMTP not configured. Password reset token for {to_email}: {token}");
        Ok(())
    }
}
