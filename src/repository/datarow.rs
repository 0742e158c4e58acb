use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::Repository;
use crate::entity::datarows;
use crate::error::{AppError, AppResult};
use crate::validate::{ParamType, Reply, checked, validate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DataPointWritten {
    pub result: bool,
}

#[derive(Deserialize)]
struct SendDataPoint {
    #[serde(rename = "dataRowID")]
    data_row_id: i32,
    #[serde(rename = "dataSetID")]
    data_set_id: i32,
    datapoint: Value,
}

#[derive(Deserialize)]
struct SendDataPoints {
    #[serde(rename = "dataRowID")]
    data_row_id: i32,
    #[serde(rename = "dataSetID")]
    data_set_id: i32,
    datapoints: Vec<Value>,
}

/// Overwrite the stored series of one row; true iff exactly that row changed.
async fn write_series<C: ConnectionTrait>(
    conn: &C,
    data_set_id: i32,
    data_row_id: i32,
    series: &[Value],
) -> AppResult<bool> {
    let encoded = datarows::encode_series(series)?;
    let res = datarows::Entity::update_many()
        .col_expr(datarows::Column::DataJson, Expr::value(encoded))
        .filter(datarows::Column::Id.eq(data_row_id))
        .filter(datarows::Column::DatasetId.eq(data_set_id))
        .exec(conn)
        .await?;
    Ok(res.rows_affected == 1)
}

impl Repository {
    /// Append one `{value, relativeTime}` point to a row's series.
    ///
    /// The series is read, extended and written back inside one transaction.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Integrity` if the stored series is not valid JSON,
    /// `AppError::Database` if a statement fails.
    pub async fn send_data_point(&self, params: &Value) -> AppResult<Reply<DataPointWritten>> {
        let mut errors = validate(
            &[
                ("dataRowID", ParamType::Integer),
                ("dataSetID", ParamType::Integer),
                ("datapoint", ParamType::Object),
            ],
            params,
        );
        if let Some(point) = params.get("datapoint").filter(|p| p.is_object()) {
            errors.extend(validate(
                &[
                    ("value", ParamType::Array),
                    ("relativeTime", ParamType::Double),
                ],
                point,
            ));
        }
        let params: SendDataPoint = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let txn = self.db.begin().await?;

        let Some(row) = datarows::Entity::find_by_id((params.data_row_id, params.data_set_id))
            .one(&txn)
            .await?
        else {
            tracing::debug!(
                data_row_id = params.data_row_id,
                data_set_id = params.data_set_id,
                "Datapoint for unknown row"
            );
            return Ok(Reply::Done(DataPointWritten { result: false }));
        };

        let mut series = row.series().map_err(|e| {
            AppError::Integrity(format!(
                "Datarow {} of dataset {} holds invalid JSON: {e}",
                row.id, row.dataset_id
            ))
        })?;
        series.push(params.datapoint);

        let result = write_series(&txn, params.data_set_id, params.data_row_id, &series).await?;
        txn.commit().await?;

        Ok(Reply::Done(DataPointWritten { result }))
    }

    /// Replace a row's whole series. Points are stored as given.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the update fails.
    pub async fn send_data_points_again(
        &self,
        params: &Value,
    ) -> AppResult<Reply<DataPointWritten>> {
        let errors = validate(
            &[
                ("dataRowID", ParamType::Integer),
                ("dataSetID", ParamType::Integer),
                ("datapoints", ParamType::Array),
            ],
            params,
        );
        let params: SendDataPoints = match checked(errors, params) {
            Ok(p) => p,
            Err(errors) => return Ok(Reply::rejected(errors)),
        };

        let result = write_series(
            &self.db,
            params.data_set_id,
            params.data_row_id,
            &params.datapoints,
        )
        .await?;

        tracing::debug!(
            data_row_id = params.data_row_id,
            data_set_id = params.data_set_id,
            points = params.datapoints.len(),
            result,
            "Series replaced"
        );

        Ok(Reply::Done(DataPointWritten { result }))
    }
}
