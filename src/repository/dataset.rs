use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use utoipa::ToSchema;

use super::Repository;
use crate::entity::{datarows, datasets, labels, projects};
use crate::error::AppResult;
use crate::validate::{ParamType, Reply, checked, type_name, validate, validate_optional};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DataSetCreated {
    #[serde(rename = "dataSetID")]
    pub data_set_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DataSetDeleted {
    pub result: bool,
}

#[derive(Deserialize)]
struct CreateDataSet {
    #[serde(rename = "sessionID")]
    session_id: i32,
    #[serde(rename = "projectID")]
    project_id: i32,
    #[serde(rename = "userID")]
    user_id: i32,
    #[serde(rename = "dataSetName")]
    data_set_name: String,
}

#[derive(Deserialize)]
struct NewDataRow {
    #[serde(rename = "sensorID")]
    sensor_id: i32,
    #[serde(rename = "datarowName", default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct DeleteDataSet {
    #[serde(rename = "dataSetID")]
    data_set_id: i32,
    #[serde(rename = "userID")]
    user_id: i32,
    #[serde(rename = "projectID")]
    project_id: i32,
}

/// Rows may be sent as an object keyed by row id or as an array indexed by it.
fn rows_by_id(data_row: Option<&Value>) -> Option<Map<String, Value>> {
    match data_row? {
        Value::Object(map) => Some(map.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item.clone()))
                .collect(),
        ),
        _ => None,
    }
}

fn row_errors(rows: &Map<String, Value>) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (key, entry) in rows {
        match key.parse::<i32>() {
            // "1", "01" and "+1" name the same row
            Ok(id) if !seen.insert(id) => {
                errors.push(format!("Param dataRow key {key} repeats row id {id}"));
            }
            Ok(_) => {}
            Err(_) => errors.push(format!("Param dataRow key {key} is not an integer id")),
        }
        if !entry.is_object() {
            errors.push(format!(
                "Param {key} has not type object, but type {}",
                type_name(entry)
            ));
            continue;
        }
        errors.extend(validate(&[("sensorID", ParamType::Integer)], entry));
        errors.extend(validate_optional(&[("datarowName", ParamType::String)], entry));
    }
    errors
}

impl Repository {
    /// Create a dataset and its (empty) rows inside an existing project session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if an insert fails, for instance on an unknown
    /// sensor id; nothing is kept then.
    pub async fn create_data_set(&self, params: &Value) -> AppResult<Reply<DataSetCreated>> {
        let mut errors = validate(
            &[
                ("sessionID", ParamType::Integer),
                ("projectID", ParamType::Integer),
                ("userID", ParamType::Integer),
                ("dataSetName", ParamType::String),
            ],
            params,
        );
        let rows = rows_by_id(params.get("dataRow"));
        match &rows {
            Some(rows) => errors.extend(row_errors(rows)),
            None => errors.extend(validate(&[("dataRow", ParamType::Object)], params)),
        }
        let header: CreateDataSet = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let mut new_rows = Vec::new();
        for (key, entry) in rows.unwrap_or_default() {
            let row: NewDataRow = match checked(Vec::new(), &entry) {
                Ok(r) => r,
                Err(errors) => return Ok(Reply::rejected(errors)),
            };
            // Keys were checked above
            let Ok(id) = key.parse::<i32>() else {
                continue;
            };
            new_rows.push((id, row));
        }

        let txn = self.db.begin().await?;

        let bound = projects::Entity::find_by_id(header.project_id)
            .filter(projects::Column::SessionId.eq(header.session_id))
            .one(&txn)
            .await?;
        if bound.is_none() {
            return Ok(Reply::rejected(vec![format!(
                "Project {} has no session {}",
                header.project_id, header.session_id
            )]));
        }

        let set = datasets::ActiveModel {
            project_id: Set(header.project_id),
            user_id: Set(header.user_id),
            name: Set(header.data_set_name),
            session_id: Set(header.session_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let row_count = new_rows.len();
        if !new_rows.is_empty() {
            datarows::Entity::insert_many(new_rows.into_iter().map(|(id, row)| {
                datarows::ActiveModel {
                    id: Set(id),
                    dataset_id: Set(set.id),
                    name: Set(row.name.unwrap_or_default()),
                    sensor_id: Set(row.sensor_id),
                    data_json: Set(datarows::EMPTY_SERIES.to_string()),
                }
            }))
            .exec_without_returning(&txn)
            .await?;
        }

        txn.commit().await?;

        tracing::info!(
            data_set_id = set.id,
            project_id = header.project_id,
            rows = row_count,
            "Dataset created"
        );

        Ok(Reply::Done(DataSetCreated { data_set_id: set.id }))
    }

    /// Delete a dataset with its rows and labels.
    ///
    /// `result` is true when the dataset existed for that user and project.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a delete fails; nothing is removed then.
    pub async fn delete_data_set(&self, params: &Value) -> AppResult<Reply<DataSetDeleted>> {
        let errors = validate(
            &[
                ("dataSetID", ParamType::Integer),
                ("userID", ParamType::Integer),
                ("projectID", ParamType::Integer),
            ],
            params,
        );
        let params: DeleteDataSet = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let txn = self.db.begin().await?;

        let owned = datasets::Entity::find_by_id(params.data_set_id)
            .filter(datasets::Column::UserId.eq(params.user_id))
            .filter(datasets::Column::ProjectId.eq(params.project_id))
            .one(&txn)
            .await?;
        if owned.is_none() {
            return Ok(Reply::Done(DataSetDeleted { result: false }));
        }

        let rows = datarows::Entity::delete_many()
            .filter(datarows::Column::DatasetId.eq(params.data_set_id))
            .exec(&txn)
            .await?;
        labels::Entity::delete_many()
            .filter(labels::Column::DatasetId.eq(params.data_set_id))
            .exec(&txn)
            .await?;
        let deleted = datasets::Entity::delete_many()
            .filter(datasets::Column::Id.eq(params.data_set_id))
            .filter(datasets::Column::UserId.eq(params.user_id))
            .filter(datasets::Column::ProjectId.eq(params.project_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(
            data_set_id = params.data_set_id,
            rows = rows.rows_affected,
            "Dataset deleted"
        );

        Ok(Reply::Done(DataSetDeleted {
            result: deleted.rows_affected >= 1,
        }))
    }
}
