//! Outbound notifications.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::{info, warn};

use crate::{auth::TokenPlaintext, users::UserId};

/// Attempts made by [`deliver`] before giving up.
pub const SEND_ATTEMPTS: u32 = 3;

/// Pause between delivery attempts.
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Sent after registration, carrying the activation token.
    Welcome {
        user_id: UserId,
        name: String,
        activation_token: TokenPlaintext,
    },

    PasswordReset { reset_token: TokenPlaintext },
}

impl Notification {
    #[must_use]
    pub const fn subject(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "Welcome!",
            Self::PasswordReset { .. } => "Reset your password",
        }
    }
}

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<(), MailerError>;
}

/// Mailer that records notifications in the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<(), MailerError> {
        info!(
            recipient,
            subject = notification.subject(),
            "notification sent"
        );

        Ok(())
    }
}

/// Send `notification`, retrying transient failures.
///
/// # Errors
///
/// Returns the last error once [`SEND_ATTEMPTS`] attempts have failed.
pub async fn deliver(
    mailer: &dyn Mailer,
    recipient: &str,
    notification: &Notification,
) -> Result<(), MailerError> {
    let mut attempt = 1;

    loop {
        match mailer.send(recipient, notification).await {
            Ok(()) => return Ok(()),
            Err(error) if attempt < SEND_ATTEMPTS => {
                warn!(attempt, error = %error, "notification delivery failed, retrying");

                attempt += 1;

                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(error) => return Err(error),
        }
    }
}
