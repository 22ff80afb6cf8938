//! Outbound mail transport.

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::SmtpConfig;

use super::EmailError;

/// Sends built messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), EmailError>;
}

/// SMTP mailer.
///
/// STARTTLS takes precedence over implicit TLS; with neither set the
/// connection is unencrypted.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| EmailError::Transport(e.to_string()))?
        } else if config.ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| EmailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if config.auth {
            builder = builder.credentials(Credentials::new(
                config.username.clone().unwrap_or_default(),
                config.password.clone().unwrap_or_default(),
            ));
        }

        debug!(
            host = %config.host,
            port = config.port,
            starttls = config.starttls,
            ssl = config.ssl,
            auth = config.auth,
            "Configured SMTP transport"
        );

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;
        Ok(())
    }
}
