pub mod action;
pub mod deliverance;
pub mod health;
pub mod jobs;

use axum::{
    Router,
    extract::OptionalFromRequestParts,
    http::{Method, request::Parts},
    routing::{any, get, post},
};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::{AdminRegistered, AdminView, DataminerRegistered, LoginResult, ProjectRef};
use crate::repository::{
    DataPointWritten, DataRowView, DataSetCreated, DataSetDeleted, DataSetView, DeviceRegistered,
    LabelCreated, LabelDeleted, LabelUpdated, LabelView, LanguageMeta, LoadedProject,
    ProjectCreated, ProjectData, ProjectMeta, SensorView,
};
use crate::services::rate_limit::SessionOrIpKeyExtractor;

/// Series uploads can be large
const API_BODY_LIMIT: usize = 16 * 1024 * 1024;
const JOB_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// User bound to the request's session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i32);

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(state
            .sessions
            .current_user(&parts.headers)
            .await
            .map(CurrentUser))
    }
}

/// JSON object body of a peripheral request; anything else is not acceptable.
pub(crate) fn post_body(method: &Method, body: &[u8]) -> AppResult<Value> {
    if method != Method::POST {
        return Err(AppError::NotAcceptable);
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        _ => Err(AppError::NotAcceptable),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        action::run_action,
        jobs::build_model,
        jobs::classify,
        deliverance::deliverance,
    ),
    components(
        schemas(
            LanguageMeta,
            ProjectCreated,
            ProjectMeta,
            LoadedProject,
            ProjectData,
            DataSetView,
            SensorView,
            DataRowView,
            LabelView,
            DataSetCreated,
            DataSetDeleted,
            DataPointWritten,
            LabelCreated,
            LabelUpdated,
            LabelDeleted,
            DeviceRegistered,
            AdminRegistered,
            DataminerRegistered,
            ProjectRef,
            LoginResult,
            AdminView,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "actions", description = "Repository operations selected by action name"),
        (name = "models", description = "Model training, classification and delivery"),
    ),
    info(
        title = "DataLab API",
        description = "Persistence and orchestration API for a sensor data labeling platform",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let api_routes = Router::new()
        .route("/api", post(action::run_action))
        .layer(RequestBodyLimitLayer::new(API_BODY_LIMIT));

    // Peripheral endpoints answer 406 to other verbs themselves
    let job_routes_base = Router::new()
        .route("/build_model", any(jobs::build_model))
        .route("/classify", any(jobs::classify))
        .route("/deliverance", any(deliverance::deliverance));

    let job_routes = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        job_routes_base
    } else {
        let limiter = GovernorConfigBuilder::default()
            .key_extractor(SessionOrIpKeyExtractor::new(state.sessions.clone()))
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish();

        match limiter {
            Some(limiter) => {
                tracing::info!(
                    rate = %format!("{}/s burst {}", config.rate_limit_per_second, config.rate_limit_burst),
                    "Rate limiting configured"
                );
                job_routes_base.layer(GovernorLayer {
                    config: Arc::new(limiter),
                })
            }
            None => {
                tracing::warn!("Invalid rate limit settings, rate limiting DISABLED");
                job_routes_base
            }
        }
    }
    .layer(RequestBodyLimitLayer::new(JOB_BODY_LIMIT));

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .merge(api_routes)
        .merge(job_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
