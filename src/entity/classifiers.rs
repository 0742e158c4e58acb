use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Trained model produced by the training job.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "classifiers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_id: i32,
    /// JSON array of the sensor type ids the model consumes
    #[sea_orm(column_type = "Text")]
    pub sensors: String,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Decode the sensor type list.
    ///
    /// # Errors
    ///
    /// Returns an error if the column does not hold a JSON array of integers.
    pub fn sensor_types(&self) -> Result<Vec<i32>, serde_json::Error> {
        serde_json::from_str(&self.sensors)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
