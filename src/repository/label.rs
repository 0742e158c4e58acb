use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::Repository;
use crate::entity::labels;
use crate::error::AppResult;
use crate::validate::{ParamType, Reply, checked, field, validate, validate_optional};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LabelCreated {
    #[serde(rename = "labelID")]
    pub label_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LabelUpdated {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LabelDeleted {
    pub result: bool,
}

#[derive(Deserialize)]
struct CreateLabel {
    #[serde(rename = "datasetID")]
    dataset_id: i32,
    label: NewLabel,
}

#[derive(Deserialize)]
struct NewLabel {
    #[serde(rename = "labelName")]
    name: String,
    span: Span,
}

#[derive(Deserialize)]
struct Span {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct SetLabel {
    #[serde(rename = "datasetID")]
    dataset_id: i32,
    label: LabelChange,
}

#[derive(Deserialize)]
struct LabelChange {
    #[serde(rename = "labelID")]
    id: i32,
    #[serde(rename = "labelName")]
    name: String,
    #[serde(default)]
    span: Option<SpanChange>,
}

#[derive(Deserialize, Default)]
struct SpanChange {
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    end: Option<f64>,
}

#[derive(Deserialize)]
struct DeleteLabel {
    #[serde(rename = "dataSetID")]
    data_set_id: i32,
    #[serde(rename = "labelID")]
    label_id: i32,
}

impl Repository {
    /// Add a named time span to a dataset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the insert fails.
    pub async fn create_label(&self, params: &Value) -> AppResult<Reply<LabelCreated>> {
        let mut errors = validate(
            &[
                ("datasetID", ParamType::Integer),
                ("label", ParamType::Object),
            ],
            params,
        );
        if let Some(label) = field(params, "label").filter(|l| l.is_object()) {
            errors.extend(validate(
                &[
                    ("labelName", ParamType::String),
                    ("span", ParamType::Object),
                ],
                label,
            ));
            if let Some(span) = field(label, "span").filter(|s| s.is_object()) {
                errors.extend(validate(
                    &[("start", ParamType::Number), ("end", ParamType::Number)],
                    span,
                ));
            }
        }
        let params: CreateLabel = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let label = labels::ActiveModel {
            dataset_id: Set(params.dataset_id),
            name: Set(params.label.name),
            start: Set(params.label.span.start),
            end: Set(params.label.span.end),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::debug!(label_id = label.id, dataset_id = params.dataset_id, "Label created");

        Ok(Reply::Done(LabelCreated { label_id: label.id }))
    }

    /// Rename a label and move the span bounds that are given.
    ///
    /// Each change is its own statement; `success` is false when any of them did
    /// not find the label.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if an update fails.
    pub async fn set_label(&self, params: &Value) -> AppResult<Reply<LabelUpdated>> {
        let mut errors = validate(
            &[
                ("datasetID", ParamType::Integer),
                ("label", ParamType::Object),
            ],
            params,
        );
        if let Some(label) = field(params, "label").filter(|l| l.is_object()) {
            errors.extend(validate(
                &[
                    ("labelID", ParamType::Integer),
                    ("labelName", ParamType::String),
                ],
                label,
            ));
            errors.extend(validate_optional(&[("span", ParamType::Object)], label));
            if let Some(span) = field(label, "span").filter(|s| s.is_object()) {
                errors.extend(validate_optional(
                    &[("start", ParamType::Number), ("end", ParamType::Number)],
                    span,
                ));
            }
        }
        let params: SetLabel = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let label_id = params.label.id;
        let span = params.label.span.unwrap_or_default();

        let mut changes = vec![(labels::Column::Name, Expr::value(params.label.name))];
        if let Some(start) = span.start {
            changes.push((labels::Column::Start, Expr::value(start)));
        }
        if let Some(end) = span.end {
            changes.push((labels::Column::End, Expr::value(end)));
        }

        let mut success = true;
        for (column, value) in changes {
            let res = labels::Entity::update_many()
                .col_expr(column, value)
                .filter(labels::Column::Id.eq(label_id))
                .filter(labels::Column::DatasetId.eq(params.dataset_id))
                .exec(&self.db)
                .await?;
            success &= res.rows_affected >= 1;
        }

        Ok(Reply::Done(LabelUpdated { success }))
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the delete fails.
    pub async fn delete_label(&self, params: &Value) -> AppResult<Reply<LabelDeleted>> {
        let errors = validate(
            &[
                ("dataSetID", ParamType::Integer),
                ("labelID", ParamType::Integer),
            ],
            params,
        );
        let params: DeleteLabel = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let res = labels::Entity::delete_many()
            .filter(labels::Column::Id.eq(params.label_id))
            .filter(labels::Column::DatasetId.eq(params.data_set_id))
            .exec(&self.db)
            .await?;

        Ok(Reply::Done(LabelDeleted {
            result: res.rows_affected >= 1,
        }))
    }
}
