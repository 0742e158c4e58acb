use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};
use tokio::process::Command;

use super::{ComputeJob, JobKind, JobOutcome};
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Runs jobs as child processes. The job description is handed over in a temp
/// file whose path is the last argument.
#[derive(Debug, Clone)]
pub struct ProcessJobRunner {
    build_model_command: Vec<String>,
    classify_command: Vec<String>,
    temp_dir: Option<PathBuf>,
}

impl ProcessJobRunner {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            build_model_command: config.build_model_command.clone(),
            classify_command: config.classify_command.clone(),
            temp_dir: config.job_temp_dir.clone(),
        }
    }

    fn command(&self, kind: JobKind) -> &[String] {
        match kind {
            JobKind::BuildModel => &self.build_model_command,
            JobKind::Classify => &self.classify_command,
        }
    }
}

/// Write `job` to a fresh temp file named `<prefix>...json`.
///
/// The file is exclusively locked while it is written and unlocked before the
/// path is returned. It is removed when the returned handle is dropped.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be created, locked or written.
pub fn write_job_file(dir: Option<&Path>, prefix: &str, job: &Value) -> AppResult<TempPath> {
    let mut builder = Builder::new();
    builder.prefix(prefix).suffix(".json");
    let file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    let handle = file.as_file();
    handle.lock()?;
    let written = serde_json::to_writer(handle, job)
        .map_err(AppError::from)
        .and_then(|()| handle.sync_all().map_err(AppError::from));
    handle.unlock()?;
    written?;

    Ok(file.into_temp_path())
}

#[async_trait]
impl ComputeJob for ProcessJobRunner {
    async fn run(&self, kind: JobKind, job: &Value) -> AppResult<JobOutcome> {
        let [program, args @ ..] = self.command(kind) else {
            return Err(AppError::ComputeJob(format!("No command configured for {kind:?}")));
        };

        let dir = self.temp_dir.clone();
        let job = job.clone();
        let prefix = kind.file_prefix();
        let path = tokio::task::spawn_blocking(move || write_job_file(dir.as_deref(), prefix, &job))
            .await
            .map_err(|e| AppError::Internal(format!("Job file task failed: {e}")))??;

        tracing::info!(kind = ?kind, file = %path.display(), "Starting compute job");

        let output = Command::new(program)
            .args(args)
            .arg(&*path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::ComputeJob(format!("Failed to launch {program}: {e}")))?;

        let outcome = JobOutcome {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if outcome.success {
            tracing::info!(kind = ?kind, "Compute job finished");
        } else {
            tracing::warn!(
                kind = ?kind,
                status = %output.status,
                stderr = %outcome.stderr.trim(),
                "Compute job failed"
            );
        }

        // Removes the job file unless the job already did
        drop(path);

        Ok(outcome)
    }
}
