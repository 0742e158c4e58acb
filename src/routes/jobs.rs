use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::Method,
};
use serde_json::{Value, json};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::jobs::JobKind;
use crate::notify::{Recipient, model_ready_message};
use crate::repository::Contact;
use crate::routes::{CurrentUser, post_body};
use crate::validate::{ParamType, field, validate};

/// A training request names its data and every pipeline stage.
#[must_use]
pub fn is_build_request(job: &Value) -> bool {
    validate(
        &[("dataSets", ParamType::Array), ("features", ParamType::Array)],
        job,
    )
    .is_empty()
        && ["scaler", "classifier", "imputator"]
            .iter()
            .all(|key| field(job, key).is_some())
}

#[must_use]
pub fn is_classify_request(job: &Value) -> bool {
    validate(&[("dataSets", ParamType::Array)], job).is_empty()
        && field(job, "classifier").is_some()
}

/// Train a model
///
/// Starts the training job in the background and answers immediately. The
/// current user gets a mail with the download link once training has finished.
#[utoipa::path(
    post,
    path = "/build_model",
    request_body(content = Object, description = "dataSets, features, scaler, classifier, imputator", content_type = "application/json"),
    responses(
        (status = 200, description = "Training started"),
        (status = 401, description = "Not logged in"),
        (status = 406, description = "Missing keys or wrong method"),
    ),
    tag = "models"
)]
pub async fn build_model(
    State(state): State<AppState>,
    method: Method,
    user: Option<CurrentUser>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let job = post_body(&method, &body)?;
    if !is_build_request(&job) {
        return Err(AppError::NotAcceptable);
    }
    let CurrentUser(user_id) = user.ok_or(AppError::Unauthorized)?;

    let contact = state.repo.get_email(user_id).await?;

    tracing::info!(user_id, "Model build requested");
    tokio::spawn(run_build(state, job, contact));

    Ok(Json(json!({})))
}

async fn run_build(state: AppState, job: Value, contact: Contact) {
    let model_id = match state.jobs.run(JobKind::BuildModel, &job).await {
        Ok(outcome) => outcome.model_id(),
        Err(e) => Err(e),
    };

    match model_id {
        Ok(model_id) => {
            let message = model_ready_message(&state.config.public_app_url, model_id);
            let recipients = [Recipient::from(contact)];
            if let Err(e) = state.notifier.notify(&recipients, &message).await {
                tracing::error!(model_id, error = %e, "Failed to deliver model link");
            } else {
                tracing::info!(model_id, "Model built and delivered");
            }
        }
        Err(e) => tracing::error!(error = %e, "Model build failed"),
    }
}

/// Classify data with a trained model
///
/// Runs the classification job and returns its output lines.
#[utoipa::path(
    post,
    path = "/classify",
    request_body(content = Object, description = "dataSets and classifier", content_type = "application/json"),
    responses(
        (status = 200, description = "Job output lines", body = Vec<String>),
        (status = 406, description = "Missing keys or wrong method"),
        (status = 500, description = "Job could not be started"),
    ),
    tag = "models"
)]
pub async fn classify(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> AppResult<Json<Vec<String>>> {
    let job = post_body(&method, &body)?;
    if !is_classify_request(&job) {
        return Err(AppError::NotAcceptable);
    }

    let outcome = state.jobs.run(JobKind::Classify, &job).await?;
    Ok(Json(outcome.lines()))
}
