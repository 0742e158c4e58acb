use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sensors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sensor_type_id: i32,
    pub name: String,
    /// Index of the sensor on its own device
    pub device_unique_sensor_id: i32,
    pub device_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::devices::Entity",
        from = "Column::DeviceId",
        to = "super::devices::Column::Id"
    )]
    Device,
    #[sea_orm(has_many = "super::datarows::Entity")]
    Datarows,
}

impl Related<super::devices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Device.def()
    }
}

impl Related<super::datarows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Datarows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
