//! Unit tests for compute job handling.
//!
//! Run with: cargo test --test jobs_unit_test

mod common;

use serde_json::{Value, json};
use std::fs::File;

use datalab_db::error::AppError;
use datalab_db::jobs::{ComputeJob, JobKind, JobOutcome, ProcessJobRunner, write_job_file};

fn outcome(success: bool, stdout: &str, stderr: &str) -> JobOutcome {
    JobOutcome {
        success,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

#[test]
fn model_id_is_last_printed_line() {
    assert_eq!(outcome(true, "loading\ntraining\n 42 \n\n", "").model_id().unwrap(), 42);
    assert!(matches!(
        outcome(true, "done\n", "").model_id(),
        Err(AppError::ComputeJob(_))
    ));
    assert!(matches!(
        outcome(false, "42\n", "Traceback").model_id(),
        Err(AppError::ComputeJob(_))
    ));
}

#[test]
fn lines_list_stdout_before_stderr() {
    assert_eq!(
        outcome(true, "a\nb\n", "warn\n").lines(),
        vec!["a", "b", "warn"]
    );
    assert!(outcome(true, "", "").lines().is_empty());
}

#[test]
fn job_file_is_written_unlocked_and_removed_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let job = json!({ "dataSets": [1, 2], "classifier": "knn" });

    let path = write_job_file(Some(dir.path()), JobKind::BuildModel.file_prefix(), &job).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("BM_"), "{name}");
    assert!(name.ends_with(".json"), "{name}");

    let stored: Value = serde_json::from_reader(File::open(&*path).unwrap()).unwrap();
    assert_eq!(stored, job);

    // Nobody holds the lock any more
    let reader = File::open(&*path).unwrap();
    assert!(reader.try_lock().is_ok());
    reader.unlock().unwrap();

    let kept = path.to_path_buf();
    drop(path);
    assert!(!kept.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn process_runner_passes_job_file_as_last_argument() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config();
    config.classify_command = vec!["cat".to_string()];
    config.build_model_command = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
    config.job_temp_dir = Some(dir.path().to_path_buf());
    let runner = ProcessJobRunner::new(&config);

    let job = json!({ "dataSets": [[0.5]], "classifier": 1 });
    let classified = runner.run(JobKind::Classify, &job).await.unwrap();
    assert!(classified.success);
    assert_eq!(serde_json::from_str::<Value>(&classified.stdout).unwrap(), job);

    let failed = runner.run(JobKind::BuildModel, &job).await.unwrap();
    assert!(!failed.success);

    // Job files do not outlive the job
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_program_is_an_error() {
    let mut config = common::test_config();
    config.classify_command = vec!["/nonexistent/datalab-classifier".to_string()];
    let runner = ProcessJobRunner::new(&config);

    let result = runner.run(JobKind::Classify, &json!({})).await;
    assert!(matches!(result, Err(AppError::ComputeJob(_))));
}
