//! Outgoing notifications about trained models.

mod relay;

pub use relay::RelayNotifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::repository::Contact;

/// Addressee of a notification. The display name falls back to the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Recipient {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

impl From<Contact> for Recipient {
    fn from(contact: Contact) -> Self {
        Self {
            email: contact.email,
            name: Some(contact.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to every recipient.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Notification` if a delivery fails.
    async fn notify(&self, recipients: &[Recipient], message: &Message) -> AppResult<()>;
}

/// Writes notifications to the log. Used when no mail relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipients: &[Recipient], message: &Message) -> AppResult<()> {
        for recipient in recipients {
            tracing::info!(
                to = %recipient.email,
                subject = %message.subject,
                body = %message.html_body,
                "Notification (no relay configured)"
            );
        }
        Ok(())
    }
}

/// Link that downloads a freshly trained model.
#[must_use]
pub fn delivery_url(public_app_url: &str, model_id: i32) -> String {
    format!("{public_app_url}?deliverModel=true&modelID={model_id}")
}

/// Link that opens a model for use with the given sensor types.
#[must_use]
pub fn usage_url(public_app_url: &str, model_id: i32, sensor_types: &[i32]) -> String {
    let types = sensor_types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("{public_app_url}?useModel=true&modelID={model_id}&sensorTypes={types}")
}

#[must_use]
pub fn model_ready_message(public_app_url: &str, model_id: i32) -> Message {
    let url = delivery_url(public_app_url, model_id);
    Message {
        subject: "Your model has been trained".to_string(),
        html_body: format!(
            "<p>Training has finished.</p><p>Your model is ready: <a href=\"{url}\">{url}</a></p>"
        ),
    }
}

#[must_use]
pub fn model_shared_message(public_app_url: &str, model_id: i32, sensor_types: &[i32]) -> Message {
    let url = usage_url(public_app_url, model_id, sensor_types);
    Message {
        subject: "A model was shared with you".to_string(),
        html_body: format!(
            "<p>A trained model was shared with you.</p><p>Open it here: <a href=\"{url}\">{url}</a></p>"
        ),
    }
}
