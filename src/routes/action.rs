use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use utoipa::IntoParams;

use crate::common::AppState;
use crate::dispatch::{Action, Output, dispatch};
use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionQuery {
    /// Operation to run, e.g. `create_project`
    pub action: Option<String>,
}

/// An empty body reads as an empty object.
fn decode_body(body: &[u8]) -> Result<Value, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| format!("Request body is not valid JSON: {e}"))
}

/// Run a repository operation
///
/// The body is the operation's JSON parameter object. Invalid parameters are
/// answered with status 200 and `{"error": [...]}`. Successful `register_admin`
/// and `login_admin` calls set the session cookie.
#[utoipa::path(
    post,
    path = "/api",
    params(ActionQuery),
    request_body(content = Object, description = "Operation parameters", content_type = "application/json"),
    responses(
        (status = 200, description = "Operation result or validation errors"),
        (status = 400, description = "Unknown action"),
        (status = 404, description = "Project or language not found"),
        (status = 500, description = "Persistence or integrity failure"),
    ),
    tag = "actions"
)]
pub async fn run_action(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
    body: Bytes,
) -> AppResult<Response> {
    let action: Action = query.action.unwrap_or_default().parse()?;

    let params = if action.takes_params() {
        match decode_body(&body) {
            Ok(params) => params,
            Err(message) => return Ok(Json(json!({ "error": [message] })).into_response()),
        }
    } else {
        Value::Null
    };

    let dispatched = dispatch(&state.repo, action, &params).await?;

    let mut response = match dispatched.output {
        Output::Json(value) => Json(value).into_response(),
        Output::Raw(text) => (
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            text,
        )
            .into_response(),
    };

    if let Some(user_id) = dispatched.authenticated {
        let token = state.sessions.issue(user_id).await;
        let cookie = state
            .sessions
            .cookie(&token)
            .ok_or_else(|| AppError::Internal("Session cookie is not a valid header".to_string()))?;
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }

    Ok(response)
}
