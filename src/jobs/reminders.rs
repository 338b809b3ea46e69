//! Reminder fan-out for users without a recent reservation. Delivery is
//! best-effort per recipient: a failed send is counted and the job moves on
//! to the next user.

use chrono::{Duration, Utc};

use crate::{
    db::dao::DaoContext,
    db::entities::user,
    notify::{Notice, Notifier},
};

use super::{JobEnv, JobError};

pub async fn run(env: &JobEnv) -> Result<serde_json::Value, JobError> {
    let daos = DaoContext::new(&env.db);

    let cutoff = Utc::now().fixed_offset() - Duration::days(env.config.inactive_after_days);
    let recent_user_ids = daos
        .reservation()
        .user_ids_with_reservations_since(cutoff)
        .await?;
    let inactive_users = daos
        .user()
        .find_without_recent_activity(recent_user_ids)
        .await?;

    let channels = env.notifications.channels();
    let mut successful_sends = 0usize;
    let mut failed_sends = 0usize;

    for user in &inactive_users {
        if channels.is_empty() {
            break;
        }
        match send_reminder(env, user).await {
            Ok(()) => successful_sends += 1,
            Err(()) => failed_sends += 1,
        }
    }

    Ok(serde_json::json!({
        "users_processed": inactive_users.len(),
        "successful_sends": successful_sends,
        "failed_sends": failed_sends,
        "timestamp": Utc::now().fixed_offset().to_rfc3339(),
    }))
}

async fn send_reminder(env: &JobEnv, user: &user::Model) -> Result<(), ()> {
    let body = format!(
        "Hi {}, we noticed you haven't booked a parking spot recently. \
         Reserve your spot the next time you need parking!",
        user.username
    );
    let notice = Notice {
        to_email: &user.email,
        to_name: &user.username,
        subject: "Parking reminder - don't forget to book your spot",
        body: &body,
    };

    let mut delivered = false;
    for channel in env.notifications.channels() {
        match channel.send(&notice).await {
            Ok(()) => delivered = true,
            Err(err) => {
                tracing::warn!(
                    user = %user.username,
                    channel = channel.channel(),
                    error = %err,
                    "reminder delivery failed"
                );
            }
        }
    }

    if delivered { Ok(()) } else { Err(()) }
}
