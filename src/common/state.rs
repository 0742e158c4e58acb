use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::jobs::ComputeJob;
use crate::notify::Notifier;
use crate::repository::Repository;
use crate::services::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub notifier: Arc<dyn Notifier>,
    pub jobs: Arc<dyn ComputeJob>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        config: Config,
        notifier: Arc<dyn Notifier>,
        jobs: Arc<dyn ComputeJob>,
    ) -> Self {
        Self {
            repo: Repository::new(db),
            sessions: SessionStore::new(&config),
            config: Arc::new(config),
            notifier,
            jobs,
        }
    }
}
