//! Interval tasks that feed the job queue: reminders on a fixed cadence,
//! monthly reports on the first day of each month.

use std::time::Duration;

use chrono::{Datelike, Utc};

use crate::config::JobsConfig;

use super::{JobPayload, JobQueue, reports::previous_month};

pub fn spawn(queue: JobQueue, cfg: &JobsConfig) {
    tokio::spawn(reminder_loop(
        queue.clone(),
        cfg.reminder_interval_hours,
    ));
    tokio::spawn(monthly_report_loop(queue));
}

async fn reminder_loop(queue: JobQueue, interval_hours: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_hours * 3600));
    // The first tick fires immediately; skip it so boot does not spam.
    interval.tick().await;
    loop {
        interval.tick().await;
        if let Err(err) = queue.submit(JobPayload::DailyReminders).await {
            tracing::warn!(error = %err, "failed to enqueue reminder job");
        }
    }
}

async fn monthly_report_loop(queue: JobQueue) {
    let mut interval = tokio::time::interval(Duration::from_secs(24 * 3600));
    interval.tick().await;
    let mut last_submitted: Option<(i32, u32)> = None;
    loop {
        interval.tick().await;
        let today = Utc::now();
        if today.day() != 1 {
            continue;
        }
        let current = (today.year(), today.month());
        if last_submitted == Some(current) {
            continue;
        }
        let (year, month) = previous_month(current.0, current.1);
        match queue.submit(JobPayload::MonthlyReports { year, month }).await {
            Ok(_) => {
                last_submitted = Some(current);
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to enqueue monthly report job");
            }
        }
    }
}
