use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::Repository;
use crate::entity::classifiers;
use crate::error::{AppError, AppResult};

impl Repository {
    /// Sensor type ids a trained model expects as input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Integrity` unless exactly one model matches and its
    /// sensor list decodes.
    pub async fn get_sensor_types(&self, model_id: i32) -> AppResult<Vec<i32>> {
        let found = classifiers::Entity::find()
            .filter(classifiers::Column::Id.eq(model_id))
            .all(&self.db)
            .await?;

        let [model] = found.as_slice() else {
            return Err(AppError::Integrity(format!(
                "Illegal number of records ({}) for model {model_id}",
                found.len()
            )));
        };

        model.sensor_types().map_err(|e| {
            AppError::Integrity(format!("Model {model_id} holds an invalid sensor list: {e}"))
        })
    }
}
