//! Entity repository.
//!
//! All persistent state of the platform is read and written here. Public
//! operations take the decoded request payload, validate it (see
//! [`crate::validate`]) and answer with a [`crate::validate::Reply`]. Persistence
//! failures are returned as [`crate::error::AppError`] and never swallowed.
//!
//! The repository holds no session state: operations that act on behalf of a user
//! receive the user id as a parameter.

mod account;
mod dataset;
mod datarow;
mod label;
mod language;
mod model;
mod project;

pub use account::{Contact, DeviceInfo, DeviceRegistered, SensorInfo, device_errors};
pub use dataset::{DataSetCreated, DataSetDeleted};
pub use datarow::DataPointWritten;
pub use label::{LabelCreated, LabelDeleted, LabelUpdated};
pub use language::LanguageMeta;
pub use project::{
    DataRowView, DataSetView, LabelView, LoadedProject, ProjectCreated, ProjectData, ProjectMeta,
    SensorView,
};

use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Round trip to the database.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the connection is unusable.
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.db.ping().await?;
        Ok(())
    }
}
