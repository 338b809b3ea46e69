//! In-process job status store, keyed by job id and polled over HTTP.
//! Records survive as long as the process; callers that abandon a job simply
//! stop polling.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub kind: &'static str,
    pub state: JobState,
    pub progress: u8,
    pub detail: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub submitted_at: DateTime<FixedOffset>,
    pub finished_at: Option<DateTime<FixedOffset>>,
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, kind: &'static str) -> JobRecord {
        let record = JobRecord {
            id: Uuid::new_v4(),
            kind,
            state: JobState::Queued,
            progress: 0,
            detail: "queued".to_string(),
            result: None,
            error: None,
            submitted_at: Utc::now().fixed_offset(),
            finished_at: None,
        };
        self.inner
            .write()
            .await
            .insert(record.id, record.clone());
        record
    }

    pub async fn set_running(&self, id: &Uuid) {
        let mut jobs = self.inner.write().await;
        if let Some(record) = jobs.get_mut(id) {
            record.state = JobState::Running;
            record.detail = "running".to_string();
        }
    }

    pub async fn progress(&self, id: &Uuid, progress: u8, detail: impl Into<String>) {
        let mut jobs = self.inner.write().await;
        if let Some(record) = jobs.get_mut(id) {
            record.progress = progress.min(100);
            record.detail = detail.into();
        }
    }

    pub async fn complete(&self, id: &Uuid, result: serde_json::Value) {
        let mut jobs = self.inner.write().await;
        if let Some(record) = jobs.get_mut(id) {
            record.state = JobState::Completed;
            record.progress = 100;
            record.detail = "completed".to_string();
            record.result = Some(result);
            record.finished_at = Some(Utc::now().fixed_offset());
        }
    }

    pub async fn fail(&self, id: &Uuid, error: impl Into<String>) {
        let mut jobs = self.inner.write().await;
        if let Some(record) = jobs.get_mut(id) {
            record.state = JobState::Failed;
            record.detail = "failed".to_string();
            record.error = Some(error.into());
            record.finished_at = Some(Utc::now().fixed_offset());
        }
    }

    pub async fn get(&self, id: &Uuid) -> Option<JobRecord> {
        self.inner.read().await.get(id).cloned()
    }
}
