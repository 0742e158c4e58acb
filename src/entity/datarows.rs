use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One sensor's time series inside a dataset.
///
/// `data_json` holds the whole series as a JSON array of `{value, relativeTime}`
/// points. It is always decoded and re-encoded as a unit, see [`Model::series`]
/// and [`encode_series`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datarows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub dataset_id: i32,
    pub name: String,
    pub sensor_id: i32,
    #[sea_orm(column_type = "Text")]
    pub data_json: String,
}

impl Model {
    /// Decode the stored series.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not hold a JSON array.
    pub fn series(&self) -> Result<Vec<serde_json::Value>, serde_json::Error> {
        serde_json::from_str(&self.data_json)
    }
}

/// Encode a full series for storage.
///
/// # Errors
///
/// Returns an error if a point cannot be serialized.
pub fn encode_series(points: &[serde_json::Value]) -> Result<String, serde_json::Error> {
    serde_json::to_string(points)
}

/// Content of a freshly created row.
pub const EMPTY_SERIES: &str = "[]";

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::datasets::Entity",
        from = "Column::DatasetId",
        to = "super::datasets::Column::Id"
    )]
    Dataset,
    #[sea_orm(
        belongs_to = "super::sensors::Entity",
        from = "Column::SensorId",
        to = "super::sensors::Column::Id"
    )]
    Sensor,
}

impl Related<super::datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dataset.def()
    }
}

impl Related<super::sensors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sensor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
