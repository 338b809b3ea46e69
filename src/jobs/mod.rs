pub mod export;
pub mod registry;
pub mod reminders;
pub mod reports;
pub mod scheduler;
pub mod worker;

pub use registry::{JobRecord, JobRegistry, JobState};
pub use worker::{JobEnv, JobPayload, JobQueue, spawn_worker};

use crate::db::dao::DaoLayerError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Dao(#[from] DaoLayerError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
