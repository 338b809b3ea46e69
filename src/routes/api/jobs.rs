use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AdminRole,
    error::AppError,
    jobs::{JobPayload, JobRecord},
    middleware::{AuthGuard, AuthRoleGuard, subject_id},
    response::{ApiResult, JsonApiResponse},
    state::AppState,
};

#[derive(Debug, Deserialize, Default)]
pub struct MonthlyReportRequest {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/export-csv", post(export_csv))
        .route("/export-status/{job_id}", get(export_status))
        .route("/admin/jobs/reminders", post(trigger_reminders))
        .route("/admin/jobs/monthly-reports", post(trigger_monthly_reports))
        .with_state(state)
}

/// Queues a CSV export of the caller's reservation history and returns the
/// job id to poll.
async fn export_csv(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
) -> ApiResult<JobRecord> {
    let user_id = subject_id(&claims)?;
    let record = state
        .jobs
        .submit(JobPayload::ExportCsv { user_id })
        .await?;
    JsonApiResponse::with_status(StatusCode::ACCEPTED, "queued", record)
}

async fn export_status(
    State(state): State<Arc<AppState>>,
    _claims: AuthGuard,
    Path(job_id): Path<Uuid>,
) -> ApiResult<JobRecord> {
    let record = state
        .jobs
        .registry()
        .get(&job_id)
        .await
        .ok_or_else(|| AppError::not_found("Job not found"))?;
    JsonApiResponse::ok(record)
}

async fn trigger_reminders(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
) -> ApiResult<JobRecord> {
    let record = state.jobs.submit(JobPayload::DailyReminders).await?;
    JsonApiResponse::with_status(StatusCode::ACCEPTED, "queued", record)
}

/// Defaults to the previous calendar month when no period is given.
async fn trigger_monthly_reports(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    body: Option<Json<MonthlyReportRequest>>,
) -> ApiResult<JobRecord> {
    let request = body.map(|Json(body)| body).unwrap_or_default();
    let (year, month) = match (request.year, request.month) {
        (Some(year), Some(month)) => {
            if !(1..=12).contains(&month) {
                return Err(AppError::bad_request("Invalid month"));
            }
            (year, month)
        }
        (None, None) => {
            let today = Utc::now();
            crate::jobs::reports::previous_month(today.year(), today.month())
        }
        _ => {
            return Err(AppError::bad_request(
                "Year and month must be provided together",
            ));
        }
    };

    let record = state
        .jobs
        .submit(JobPayload::MonthlyReports { year, month })
        .await?;
    JsonApiResponse::with_status(StatusCode::ACCEPTED, "queued", record)
}
