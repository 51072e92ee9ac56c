use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::Error as SmtpError;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{SmtpConfig, SmtpTls};
use crate::utils::error::{AppError, Result};

pub const EMAIL_SUBJECT: &str = "New listings from listing-monitor";

/// Outbound channel for the aggregated per-cycle message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, body: &str) -> Result<()>;
}

/// Sends the batch as a plain-text email over SMTP.
pub struct EmailNotifier {
    config: SmtpConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let relay_error =
            |e: SmtpError| AppError::NotificationSend(format!("invalid SMTP relay {}: {}", config.host, e));
        let builder = match config.tls {
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(relay_error)?
            }
            SmtpTls::Wrapper => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host).map_err(relay_error)?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            config,
        })
    }

    fn build_message(&self, body: &str) -> Result<Message> {
        let from = self
            .config
            .from_address
            .as_deref()
            .or(self.config.username.as_deref())
            .ok_or_else(|| AppError::NotificationSend("no sender address configured".to_string()))?;
        let to = self
            .config
            .to_address
            .as_deref()
            .ok_or_else(|| AppError::NotificationSend("no recipient address configured".to_string()))?;

        let message = Message::builder()
            .from(
                from.parse::<Mailbox>()
                    .map_err(|e| AppError::NotificationSend(format!("invalid sender address {}: {}", from, e)))?,
            )
            .to(to
                .parse::<Mailbox>()
                .map_err(|e| AppError::NotificationSend(format!("invalid recipient address {}: {}", to, e)))?)
            .subject(EMAIL_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(format!("{}\r\n", body))
            .map_err(|e| AppError::NotificationSend(format!("could not build email: {}", e)))?;

        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, body: &str) -> Result<()> {
        let message = self.build_message(body)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| AppError::NotificationSend(e.to_string()))?;

        tracing::info!("Sent notification email to {}", self.config.to_address.as_deref().unwrap_or_default());
        Ok(())
    }
}

/// Writes the batch to the log instead of sending it anywhere.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, body: &str) -> Result<()> {
        tracing::info!("New listings:\n{}", body);
        Ok(())
    }
}
