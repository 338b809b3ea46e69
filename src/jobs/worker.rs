use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{config::JobsConfig, error::AppError, notify::Notifications};

use super::{JobRecord, JobRegistry, export, reminders, reports};

#[derive(Debug, Clone)]
pub enum JobPayload {
    ExportCsv { user_id: Uuid },
    DailyReminders,
    MonthlyReports { year: i32, month: u32 },
}

impl JobPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::ExportCsv { .. } => "export_csv",
            JobPayload::DailyReminders => "daily_reminders",
            JobPayload::MonthlyReports { .. } => "monthly_reports",
        }
    }
}

#[derive(Debug)]
struct Job {
    id: Uuid,
    payload: JobPayload,
}

/// Everything a job handler may touch. Handlers never reach back into the
/// request path; they only read the database, write files, and notify.
#[derive(Clone)]
pub struct JobEnv {
    pub db: DatabaseConnection,
    pub notifications: Notifications,
    pub config: JobsConfig,
    pub registry: JobRegistry,
}

/// Submission handle held by the HTTP layer. Submitting returns immediately
/// with the queued record; the caller polls the registry for progress.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
    registry: JobRegistry,
}

impl JobQueue {
    pub async fn submit(&self, payload: JobPayload) -> Result<JobRecord, AppError> {
        let record = self.registry.create(payload.kind()).await;
        self.tx
            .send(Job {
                id: record.id,
                payload,
            })
            .map_err(|err| {
                AppError::internal_with_source("Job queue is not running", err)
            })?;
        Ok(record)
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }
}

/// Spawns the single worker task consuming the queue. Jobs run one at a
/// time; a failed job records its error and the worker moves on.
pub fn spawn_worker(env: JobEnv) -> JobQueue {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
    let registry = env.registry.clone();

    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            env.registry.set_running(&job.id).await;
            tracing::info!(job = %job.id, kind = job.payload.kind(), "job started");

            let outcome = match &job.payload {
                JobPayload::ExportCsv { user_id } => {
                    export::run(&env, &job.id, user_id).await
                }
                JobPayload::DailyReminders => reminders::run(&env).await,
                JobPayload::MonthlyReports { year, month } => {
                    reports::run(&env, *year, *month).await
                }
            };

            match outcome {
                Ok(result) => {
                    env.registry.complete(&job.id, result).await;
                    tracing::info!(job = %job.id, "job completed");
                }
                Err(err) => {
                    tracing::warn!(job = %job.id, error = %err, "job failed");
                    env.registry.fail(&job.id, err.to_string()).await;
                }
            }
        }
    });

    JobQueue { tx, registry }
}
