//! External compute jobs (model training and classification).

mod process;

pub use process::{ProcessJobRunner, write_job_file};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    BuildModel,
    Classify,
}

impl JobKind {
    /// Prefix of the temp file that carries the job description.
    #[must_use]
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::BuildModel => "BM_",
            Self::Classify => "CLS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl JobOutcome {
    /// Output lines, stdout first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::to_string)
            .collect()
    }

    /// Id of the trained model, printed as the last stdout line of a build job.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ComputeJob` if the job failed or printed no id.
    pub fn model_id(&self) -> AppResult<i32> {
        if !self.success {
            return Err(AppError::ComputeJob(format!(
                "Training job failed: {}",
                self.stderr.trim()
            )));
        }
        self.stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .and_then(|line| line.parse().ok())
            .ok_or_else(|| {
                AppError::ComputeJob(format!(
                    "Training job printed no model id: {}",
                    self.stdout.trim()
                ))
            })
    }
}

#[async_trait]
pub trait ComputeJob: Send + Sync {
    /// Run a job to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the job cannot be started. A job that runs and fails is
    /// reported through [`JobOutcome::success`].
    async fn run(&self, kind: JobKind, job: &Value) -> AppResult<JobOutcome>;
}
