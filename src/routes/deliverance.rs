use axum::{Json, body::Bytes, extract::State, http::Method};
use serde_json::{Value, json};
use std::str::FromStr;

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::notify::{Recipient, model_shared_message, usage_url};
use crate::routes::{CurrentUser, post_body};
use crate::validate::field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveranceJob {
    /// Answer a link for the requested format
    Get,
    /// Mail the link to recipients
    Send,
}

impl FromStr for DeliveranceJob {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get" => Ok(Self::Get),
            "send" => Ok(Self::Send),
            other => Err(AppError::NotImplemented(format!("deliverance job '{other}'"))),
        }
    }
}

/// Formats a model can be handed out in. Both open the same page.
fn is_deliverable_format(format: Option<&Value>) -> bool {
    matches!(format.and_then(Value::as_str), Some("WEB_APP" | "EXE"))
}

/// Parse the recipient list; anything but an array of `{email, name?}` is refused.
fn recipients(value: Option<&Value>) -> Option<Vec<Recipient>> {
    match value {
        Some(list @ Value::Array(_)) => serde_json::from_value(list.clone()).ok(),
        _ => None,
    }
}

/// Hand out a trained model
///
/// `get` answers the usage link for format `WEB_APP` or `EXE`. `send` mails the
/// link to every recipient and to the current user.
#[utoipa::path(
    post,
    path = "/deliverance",
    request_body(content = Object, description = "job (get or send), id, format, recipients", content_type = "application/json"),
    responses(
        (status = 200, description = "Link or send result"),
        (status = 401, description = "Not logged in"),
        (status = 406, description = "Missing job or id, or wrong method"),
        (status = 501, description = "Unknown job"),
        (status = 502, description = "Mail relay failed"),
    ),
    tag = "models"
)]
pub async fn deliverance(
    State(state): State<AppState>,
    method: Method,
    user: Option<CurrentUser>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let request = post_body(&method, &body)?;
    let (Some(job), Some(model_id)) = (
        field(&request, "job").and_then(Value::as_str),
        field(&request, "id")
            .and_then(Value::as_i64)
            .and_then(|id| i32::try_from(id).ok()),
    ) else {
        return Err(AppError::NotAcceptable);
    };
    let job: DeliveranceJob = job.parse()?;
    let CurrentUser(user_id) = user.ok_or(AppError::Unauthorized)?;

    let contact = state.repo.get_email(user_id).await?;
    let sensor_types = state.repo.get_sensor_types(model_id).await?;
    let base = &state.config.public_app_url;

    match job {
        DeliveranceJob::Get => {
            if is_deliverable_format(field(&request, "format")) {
                Ok(Json(json!({ "url": usage_url(base, model_id, &sensor_types) })))
            } else {
                Ok(Json(json!({})))
            }
        }
        DeliveranceJob::Send => {
            let Some(mut recipients) = recipients(field(&request, "recipients")) else {
                return Ok(Json(json!({ "result": false })));
            };
            recipients.push(Recipient::from(contact));

            let message = model_shared_message(base, model_id, &sensor_types);
            state.notifier.notify(&recipients, &message).await?;

            tracing::info!(
                model_id,
                recipients = recipients.len(),
                "Model link sent"
            );
            Ok(Json(json!({ "result": true })))
        }
    }
}
