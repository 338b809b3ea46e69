//! Monthly activity reports, mailed per user.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::{
    db::dao::DaoContext,
    notify::{Notice, Notifier},
    parking::stats::{ReservationStats, summarize},
};

use super::{JobEnv, JobError};

/// Half-open window [start, end) of a calendar month, UTC.
pub fn month_bounds(year: i32, month: u32) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("month start should be valid")
        .fixed_offset();
    let (end_year, end_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = Utc
        .with_ymd_and_hms(end_year, end_month, 1, 0, 0, 0)
        .single()
        .expect("month end should be valid")
        .fixed_offset();
    (start, end)
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

pub async fn run(env: &JobEnv, year: i32, month: u32) -> Result<serde_json::Value, JobError> {
    if !(1..=12).contains(&month) {
        return Err(JobError::NotFound(format!("invalid month {month}")));
    }

    let daos = DaoContext::new(&env.db);
    let (start, end) = month_bounds(year, month);
    let users = daos.user().list_active_users().await?;

    let mut reports_sent = 0usize;
    let mut reports_skipped = 0usize;

    for user in &users {
        let reservations = daos
            .reservation()
            .list_by_user_between(&user.id, start, end)
            .await?;
        if reservations.is_empty() {
            reports_skipped += 1;
            continue;
        }

        let stats = summarize(&reservations);
        if let Some(mailer) = env.notifications.mailer.as_ref() {
            let body = report_body(&user.username, year, month, &stats);
            let notice = Notice {
                to_email: &user.email,
                to_name: &user.username,
                subject: &format!("Your parking report for {year}-{month:02}"),
                body: &body,
            };
            match mailer.send(&notice).await {
                Ok(()) => reports_sent += 1,
                Err(err) => {
                    tracing::warn!(
                        user = %user.username,
                        error = %err,
                        "monthly report delivery failed"
                    );
                }
            }
        }
    }

    Ok(serde_json::json!({
        "year": year,
        "month": month,
        "users_processed": users.len(),
        "reports_sent": reports_sent,
        "reports_skipped": reports_skipped,
    }))
}

fn report_body(username: &str, year: i32, month: u32, stats: &ReservationStats) -> String {
    format!(
        "Hi {username},\n\nHere is your parking summary for {year}-{month:02}:\n\
         - Reservations: {}\n\
         - Completed: {}\n\
         - Cancelled: {}\n\
         - Total spent: {:.2}\n\
         - Average duration: {:.2} hours\n",
        stats.total_reservations,
        stats.completed_reservations,
        stats.cancelled_reservations,
        stats.total_revenue,
        stats.average_duration,
    )
}

#[cfg(test)]
mod tests {
    use super::{month_bounds, previous_month};

    #[test]
    fn month_bounds_are_half_open() {
        let (start, end) = month_bounds(2026, 3);
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-04-01T00:00:00+00:00");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (start, end) = month_bounds(2025, 12);
        assert_eq!(start.to_rfc3339(), "2025-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn previous_month_handles_january() {
        assert_eq!(previous_month(2026, 1), (2025, 12));
        assert_eq!(previous_month(2026, 7), (2026, 6));
    }
}
