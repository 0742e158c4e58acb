//! Shared fixtures: an in-memory SQLite database migrated like production, seed
//! helpers and recording collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

use datalab_db::common::AppState;
use datalab_db::config::{Config, Deployment};
use datalab_db::entity::{classifiers, languages};
use datalab_db::error::AppResult;
use datalab_db::jobs::{ComputeJob, JobKind, JobOutcome};
use datalab_db::notify::{Message, Notifier, Recipient};
use datalab_db::repository::Repository;

pub const ADMIN_EMAIL: &str = "ada@example.org";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub async fn test_db() -> DatabaseConnection {
    // One connection: every connection to :memory: is its own database
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("connect sqlite");
    migration::Migrator::up(&db, None).await.expect("migrate");
    db
}

pub async fn test_repo() -> Repository {
    Repository::new(test_db().await)
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        disable_rate_limiting: true,
        rate_limit_per_second: 1,
        rate_limit_burst: 10,
        session_ttl_seconds: 3600,
        session_max_entries: 100,
        session_cookie_name: "datalab_session".to_string(),
        mail_relay_url: None,
        mail_relay_token: None,
        mail_from: "no-reply@example.org".to_string(),
        mail_from_name: "KI-App".to_string(),
        public_app_url: "https://app.example.org/build".to_string(),
        build_model_command: vec!["true".to_string()],
        classify_command: vec!["true".to_string()],
        job_temp_dir: None,
        deployment: Deployment::Local,
    }
}

pub fn device_payload() -> Value {
    json!({
        "deviceName": "Pixel 7",
        "deviceType": "smartphone",
        "firmware": "14",
        "generation": "7",
        "MACADRESS": "aa:bb:cc:dd:ee:ff",
        "sensorInformation": [
            { "sensorTypeID": 1, "sensorName": "accelerometer", "deviceUniqueSensorID": 10 },
            { "sensorTypeID": 2, "sensorName": "gyroscope", "deviceUniqueSensorID": 11 }
        ]
    })
}

/// Registered admin with its device's sensor ids.
pub struct Admin {
    pub id: i32,
    pub device_id: i32,
    pub sensor_ids: Vec<i32>,
}

pub async fn register_admin(repo: &Repository) -> Admin {
    let registered = repo
        .register_admin(&json!({
            "adminEmail": ADMIN_EMAIL,
            "adminName": "Ada",
            "password": ADMIN_PASSWORD,
            "device": device_payload(),
        }))
        .await
        .expect("register admin")
        .done()
        .expect("admin payload accepted");
    let device = registered.device.expect("device registered");
    Admin {
        id: registered.admin_id,
        device_id: device.device_id,
        sensor_ids: device.sensor_ids,
    }
}

/// Returns `(session_id, project_id)`.
pub async fn create_project(repo: &Repository, admin_id: i32, name: &str) -> (i32, i32) {
    let created = repo
        .create_project(&json!({ "userID": admin_id, "projectName": name }))
        .await
        .expect("create project")
        .done()
        .expect("project payload accepted");
    (created.session_id, created.project_id)
}

pub async fn create_data_set(
    repo: &Repository,
    session_id: i32,
    project_id: i32,
    user_id: i32,
    data_row: Value,
) -> i32 {
    repo.create_data_set(&json!({
        "sessionID": session_id,
        "projectID": project_id,
        "userID": user_id,
        "dataSetName": "walk",
        "dataRow": data_row,
    }))
    .await
    .expect("create data set")
    .done()
    .expect("data set payload accepted")
    .data_set_id
}

pub async fn insert_model(db: &DatabaseConnection, project_id: i32, sensors: &str) -> i32 {
    classifiers::ActiveModel {
        project_id: Set(project_id),
        sensors: Set(sensors.to_string()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert model")
    .id
}

pub async fn insert_language(db: &DatabaseConnection, code: &str, name: &str, text: &str) {
    languages::ActiveModel {
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        language: Set(text.to_string()),
    }
    .insert(db)
    .await
    .expect("insert language");
}

/// Notifier that keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(Vec<Recipient>, Message)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(Vec<Recipient>, Message)> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipients: &[Recipient], message: &Message) -> AppResult<()> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push((recipients.to_vec(), message.clone()));
        Ok(())
    }
}

/// Job runner answering a fixed outcome and recording what it was asked to run.
pub struct FixedJob {
    pub outcome: JobOutcome,
    pub runs: Mutex<Vec<(JobKind, Value)>>,
}

impl FixedJob {
    pub fn printing(stdout: &str) -> Self {
        Self {
            outcome: JobOutcome {
                success: true,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
            runs: Mutex::new(Vec::new()),
        }
    }

    pub fn runs(&self) -> Vec<(JobKind, Value)> {
        self.runs.lock().expect("job lock").clone()
    }
}

#[async_trait]
impl ComputeJob for FixedJob {
    async fn run(&self, kind: JobKind, job: &Value) -> AppResult<JobOutcome> {
        self.runs.lock().expect("job lock").push((kind, job.clone()));
        Ok(self.outcome.clone())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub jobs: Arc<FixedJob>,
}

pub async fn test_app(job_stdout: &str) -> TestApp {
    let notifier = Arc::new(RecordingNotifier::default());
    let jobs = Arc::new(FixedJob::printing(job_stdout));
    let state = AppState::new(
        test_db().await,
        test_config(),
        notifier.clone(),
        jobs.clone(),
    );
    TestApp {
        state,
        notifier,
        jobs,
    }
}
