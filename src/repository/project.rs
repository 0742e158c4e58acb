use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use utoipa::ToSchema;

use super::Repository;
use crate::entity::{classifiers, datarows, datasets, labels, projects, sensors, sessions};
use crate::error::{AppError, AppResult};
use crate::validate::{ParamType, Reply, checked, validate};

/// Start offset reported for every stored row; recordings are not anchored in time.
const UNKNOWN_RECORDING_START: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProjectCreated {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(rename = "projectID")]
    pub project_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProjectMeta {
    #[serde(rename = "projectID")]
    pub project_id: i32,
    #[serde(rename = "projectName")]
    pub project_name: String,
    #[serde(rename = "AIModelID")]
    pub ai_model_ids: Vec<i32>,
}

/// A project with everything recorded for it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LoadedProject {
    #[serde(rename = "projectID")]
    pub project_id: i32,
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(rename = "projectName")]
    pub project_name: String,
    #[serde(rename = "projectData")]
    pub project_data: ProjectData,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProjectData {
    #[serde(rename = "aiModelID")]
    pub ai_model_ids: Vec<i32>,
    #[serde(rename = "dataSet")]
    pub data_sets: Vec<DataSetView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DataSetView {
    #[serde(rename = "dataRowSensors")]
    pub data_row_sensors: Vec<SensorView>,
    #[serde(rename = "dataSetID")]
    pub data_set_id: i32,
    #[serde(rename = "dataSetName")]
    pub data_set_name: String,
    /// Creation time, unix seconds
    #[serde(rename = "generateDate")]
    pub generate_date: i64,
    #[serde(rename = "dataRows")]
    pub data_rows: Vec<DataRowView>,
    pub label: Vec<LabelView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SensorView {
    #[serde(rename = "sensorID")]
    pub sensor_id: i32,
    #[serde(rename = "deviceUniqueSensorID")]
    pub device_unique_sensor_id: i32,
    #[serde(rename = "sensorTypeID")]
    pub sensor_type_id: i32,
    #[serde(rename = "sensorName")]
    pub sensor_name: String,
    #[serde(rename = "deviceID")]
    pub device_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DataRowView {
    #[serde(rename = "dataRowID")]
    pub data_row_id: i32,
    /// Id of the sensor that recorded the row.
    #[serde(rename = "sensorType")]
    pub sensor_id: i32,
    #[serde(rename = "recordingStart")]
    pub recording_start: i64,
    #[serde(rename = "dataRow")]
    #[schema(value_type = Vec<Object>)]
    pub data_row: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LabelView {
    pub name: String,
    #[serde(rename = "labelID")]
    pub label_id: i32,
    pub start: f64,
    pub end: f64,
}

#[derive(Deserialize)]
struct CreateProject {
    #[serde(rename = "userID")]
    user_id: i32,
    #[serde(rename = "projectName")]
    project_name: String,
}

#[derive(Deserialize)]
struct LoadProject {
    #[serde(rename = "userID")]
    user_id: i32,
    #[serde(rename = "projectID")]
    project_id: i32,
}

#[derive(Deserialize)]
struct ProjectOwner {
    #[serde(rename = "userID")]
    user_id: i32,
}

impl Repository {
    /// Open a new recording session and a project bound to it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if either insert fails; nothing is kept then.
    pub async fn create_project(&self, params: &Value) -> AppResult<Reply<ProjectCreated>> {
        let errors = validate(
            &[
                ("userID", ParamType::Integer),
                ("projectName", ParamType::String),
            ],
            params,
        );
        let params: CreateProject = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let txn = self.db.begin().await?;

        let session = sessions::ActiveModel {
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let project = projects::ActiveModel {
            name: Set(params.project_name),
            admin_id: Set(params.user_id),
            session_id: Set(session.id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(
            project_id = project.id,
            session_id = session.id,
            admin_id = params.user_id,
            "Project created"
        );

        Ok(Reply::Done(ProjectCreated {
            session_id: session.id,
            project_id: project.id,
        }))
    }

    /// Load a project owned by `userID` with its models, datasets, rows and labels.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user owns no such project,
    /// `AppError::Integrity` if a stored series is not valid JSON.
    pub async fn load_project(&self, params: &Value) -> AppResult<Reply<LoadedProject>> {
        let errors = validate(
            &[
                ("userID", ParamType::Integer),
                ("projectID", ParamType::Integer),
            ],
            params,
        );
        let params: LoadProject = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let project = projects::Entity::find_by_id(params.project_id)
            .filter(projects::Column::AdminId.eq(params.user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Project {} not found", params.project_id))
            })?;

        let ai_model_ids = self.model_ids(project.id).await?;

        let sets = datasets::Entity::find()
            .filter(datasets::Column::ProjectId.eq(project.id))
            .filter(datasets::Column::SessionId.eq(project.session_id))
            .order_by_asc(datasets::Column::Id)
            .all(&self.db)
            .await?;

        let mut data_sets = Vec::with_capacity(sets.len());
        for set in sets {
            data_sets.push(self.data_set_view(set).await?);
        }

        Ok(Reply::Done(LoadedProject {
            project_id: project.id,
            session_id: project.session_id,
            project_name: project.name,
            project_data: ProjectData {
                ai_model_ids,
                data_sets,
            },
        }))
    }

    /// List the projects of an admin with the ids of their trained models.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    pub async fn get_project_metas(&self, params: &Value) -> AppResult<Reply<Vec<ProjectMeta>>> {
        let errors = validate(&[("userID", ParamType::Integer)], params);
        let params: ProjectOwner = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let owned = projects::Entity::find()
            .filter(projects::Column::AdminId.eq(params.user_id))
            .order_by_asc(projects::Column::Id)
            .all(&self.db)
            .await?;

        let mut metas = Vec::with_capacity(owned.len());
        for project in owned {
            metas.push(ProjectMeta {
                ai_model_ids: self.model_ids(project.id).await?,
                project_id: project.id,
                project_name: project.name,
            });
        }

        Ok(Reply::Done(metas))
    }

    async fn model_ids(&self, project_id: i32) -> AppResult<Vec<i32>> {
        let ids = classifiers::Entity::find()
            .select_only()
            .column(classifiers::Column::Id)
            .filter(classifiers::Column::ProjectId.eq(project_id))
            .order_by_asc(classifiers::Column::Id)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;
        Ok(ids)
    }

    async fn data_set_view(&self, set: datasets::Model) -> AppResult<DataSetView> {
        let rows = datarows::Entity::find()
            .filter(datarows::Column::DatasetId.eq(set.id))
            .order_by_asc(datarows::Column::Id)
            .all(&self.db)
            .await?;

        let sensor_ids: BTreeSet<i32> = rows.iter().map(|r| r.sensor_id).collect();
        let row_sensors = if sensor_ids.is_empty() {
            Vec::new()
        } else {
            sensors::Entity::find()
                .filter(sensors::Column::Id.is_in(sensor_ids))
                .order_by_asc(sensors::Column::Id)
                .all(&self.db)
                .await?
        };

        let set_labels = labels::Entity::find()
            .filter(labels::Column::DatasetId.eq(set.id))
            .order_by_asc(labels::Column::Id)
            .all(&self.db)
            .await?;

        let mut data_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let data_row = row.series().map_err(|e| {
                AppError::Integrity(format!(
                    "Datarow {} of dataset {} holds invalid JSON: {e}",
                    row.id, row.dataset_id
                ))
            })?;
            data_rows.push(DataRowView {
                data_row_id: row.id,
                sensor_id: row.sensor_id,
                recording_start: UNKNOWN_RECORDING_START,
                data_row,
            });
        }

        Ok(DataSetView {
            data_row_sensors: row_sensors
                .into_iter()
                .map(|s| SensorView {
                    sensor_id: s.id,
                    device_unique_sensor_id: s.device_unique_sensor_id,
                    sensor_type_id: s.sensor_type_id,
                    sensor_name: s.name,
                    device_id: s.device_id,
                })
                .collect(),
            data_set_id: set.id,
            data_set_name: set.name,
            generate_date: set.created_at.timestamp(),
            data_rows,
            label: set_labels
                .into_iter()
                .map(|l| LabelView {
                    name: l.name,
                    label_id: l.id,
                    start: l.start,
                    end: l.end,
                })
                .collect(),
        })
    }
}
