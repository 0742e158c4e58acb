use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{Message, Notifier, Recipient};
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Sends mail through an HTTP relay, one POST per recipient.
pub struct RelayNotifier {
    http_client: Client,
    relay_url: String,
    token: Option<String>,
    from: Address,
}

#[derive(Debug, Clone, Serialize)]
struct Address {
    email: String,
    name: String,
}

#[derive(Serialize)]
struct RelayMail<'a> {
    from: &'a Address,
    to: Address,
    subject: &'a str,
    html: &'a str,
}

impl RelayNotifier {
    /// # Errors
    ///
    /// Returns `AppError::Notification` if the HTTP client cannot be built.
    pub fn new(config: &Config, relay_url: &str) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Notification(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            relay_url: relay_url.to_string(),
            token: config.mail_relay_token.clone(),
            from: Address {
                email: config.mail_from.clone(),
                name: config.mail_from_name.clone(),
            },
        })
    }

    async fn send(&self, mail: &RelayMail<'_>) -> AppResult<()> {
        let mut request = self.http_client.post(&self.relay_url).json(mail);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Notification(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for RelayNotifier {
    async fn notify(&self, recipients: &[Recipient], message: &Message) -> AppResult<()> {
        for recipient in recipients {
            let mail = RelayMail {
                from: &self.from,
                to: Address {
                    email: recipient.email.clone(),
                    name: recipient.display_name().to_string(),
                },
                subject: &message.subject,
                html: &message.html_body,
            };
            self.send(&mail).await?;
            tracing::info!(to = %recipient.email, subject = %message.subject, "Mail relayed");
        }
        Ok(())
    }
}
