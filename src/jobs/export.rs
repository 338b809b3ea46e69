//! Per-user CSV export of reservation history. Writes the file under the
//! configured exports directory and mails it as an attachment when a mailer
//! is configured.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoContext},
    db::entities::{parking_lot, parking_spot, reservation},
    notify::Notice,
};

use super::{JobEnv, JobError};

const CSV_HEADERS: [&str; 13] = [
    "Reservation ID",
    "Parking Lot",
    "Parking Spot",
    "Vehicle Number",
    "Parking Date",
    "Parking Time",
    "Leaving Date",
    "Leaving Time",
    "Duration (Hours)",
    "Cost",
    "Status",
    "Remarks",
    "Lot Price per Hour",
];

pub async fn run(
    env: &JobEnv,
    job_id: &Uuid,
    user_id: &Uuid,
) -> Result<serde_json::Value, JobError> {
    let daos = DaoContext::new(&env.db);

    env.registry
        .progress(job_id, 10, "Fetching user data...")
        .await;
    let user = daos.user().find_by_id(*user_id).await?;

    env.registry
        .progress(job_id, 30, "Fetching reservations...")
        .await;
    let reservations = daos.reservation().list_by_user(user_id).await?;

    env.registry
        .progress(job_id, 60, "Generating CSV...")
        .await;
    let (spots, lots) = load_spot_and_lot_context(&daos, &reservations).await?;
    let data = build_csv(&reservations, &spots, &lots)?;

    env.registry.progress(job_id, 80, "Saving file...").await;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("parking_history_{}_{timestamp}.csv", user.username);
    let exports_dir = PathBuf::from(&env.config.exports_dir);
    tokio::fs::create_dir_all(&exports_dir).await?;
    let file_path = exports_dir.join(&filename);
    tokio::fs::write(&file_path, &data).await?;

    env.registry
        .progress(job_id, 90, "Sending notification...")
        .await;
    let mut email_sent = false;
    if let Some(mailer) = env.notifications.mailer.as_ref() {
        let body = format!(
            "Hi {},\n\nYour parking history export is ready. The attached CSV \
             contains all of your reservations with locations, durations and \
             costs.\n",
            user.username
        );
        let notice = Notice {
            to_email: &user.email,
            to_name: &user.username,
            subject: "Your parking history export is ready",
            body: &body,
        };
        match mailer
            .send_with_attachment(&notice, &filename, data.clone(), "text/csv")
            .await
        {
            Ok(()) => email_sent = true,
            Err(err) => {
                tracing::warn!(user = %user.username, error = %err, "export email failed");
            }
        }
    }

    cleanup_old_exports(&exports_dir, env.config.export_keep_days).await;

    Ok(serde_json::json!({
        "filename": filename,
        "path": file_path.to_string_lossy(),
        "records_count": reservations.len(),
        "email_sent": email_sent,
        "generated_at": Utc::now().fixed_offset().to_rfc3339(),
    }))
}

async fn load_spot_and_lot_context(
    daos: &DaoContext,
    reservations: &[reservation::Model],
) -> Result<
    (
        HashMap<Uuid, parking_spot::Model>,
        HashMap<Uuid, parking_lot::Model>,
    ),
    JobError,
> {
    let mut spots = HashMap::new();
    let mut lots = HashMap::new();
    for reservation in reservations {
        if spots.contains_key(&reservation.spot_id) {
            continue;
        }
        // Spots and lots may have been deleted since; the row still exports
        // with unknown placeholders.
        let Ok(spot) = daos.spot().find_by_id(reservation.spot_id).await else {
            continue;
        };
        if !lots.contains_key(&spot.lot_id) {
            if let Ok(lot) = daos.lot().find_by_id(spot.lot_id).await {
                lots.insert(spot.lot_id, lot);
            }
        }
        spots.insert(reservation.spot_id, spot);
    }
    Ok((spots, lots))
}

fn build_csv(
    reservations: &[reservation::Model],
    spots: &HashMap<Uuid, parking_spot::Model>,
    lots: &HashMap<Uuid, parking_lot::Model>,
) -> Result<Vec<u8>, JobError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for reservation in reservations {
        let spot = spots.get(&reservation.spot_id);
        let lot = spot.and_then(|spot| lots.get(&spot.lot_id));

        let (parking_date, parking_time) = split_timestamp(reservation.parking_timestamp);
        let (leaving_date, leaving_time) = split_timestamp(reservation.leaving_timestamp);

        writer.write_record([
            reservation.id.to_string(),
            lot.map(|lot| lot.prime_location_name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            spot.map(|spot| spot.spot_number.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            reservation.vehicle_number.clone(),
            parking_date,
            parking_time,
            leaving_date,
            leaving_time,
            reservation
                .total_hours
                .map(|hours| hours.to_string())
                .unwrap_or_default(),
            reservation
                .parking_cost
                .map(|cost| format!("{cost:.2}"))
                .unwrap_or_default(),
            reservation.status.clone(),
            reservation.remarks.clone().unwrap_or_default(),
            lot.map(|lot| format!("{:.2}", lot.hourly_rate))
                .unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| JobError::Io(err.into_error()))
}

fn split_timestamp(ts: Option<chrono::DateTime<chrono::FixedOffset>>) -> (String, String) {
    match ts {
        Some(ts) => (
            ts.format("%Y-%m-%d").to_string(),
            ts.format("%H:%M:%S").to_string(),
        ),
        None => (String::new(), String::new()),
    }
}

/// Removes export files older than the retention window. Best-effort: any
/// filesystem error is logged and skipped.
async fn cleanup_old_exports(dir: &Path, keep_days: u32) {
    let cutoff = SystemTime::now() - Duration::from_secs(u64::from(keep_days) * 24 * 3600);
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, "export cleanup skipped");
            return;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        if modified < cutoff {
            if let Err(err) = tokio::fs::remove_file(entry.path()).await {
                tracing::warn!(file = %entry.path().display(), error = %err, "export cleanup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{FixedOffset, TimeZone};
    use uuid::Uuid;

    use crate::db::entities::{parking_lot, parking_spot, reservation};

    use super::build_csv;

    fn ts() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn fixture() -> (
        Vec<reservation::Model>,
        HashMap<Uuid, parking_spot::Model>,
        HashMap<Uuid, parking_lot::Model>,
    ) {
        let lot_id = Uuid::new_v4();
        let spot_id = Uuid::new_v4();
        let lot = parking_lot::Model {
            id: lot_id,
            created_at: ts(),
            updated_at: ts(),
            prime_location_name: "Downtown".to_string(),
            address: "123 Main Street".to_string(),
            pin_code: "560001".to_string(),
            hourly_rate: 10.0,
            number_of_spots: 1,
            description: None,
            latitude: None,
            longitude: None,
            is_active: true,
        };
        let spot = parking_spot::Model {
            id: spot_id,
            created_at: ts(),
            updated_at: ts(),
            lot_id,
            spot_number: "S001".to_string(),
            status: "available".to_string(),
            is_active: true,
        };
        let reservation = reservation::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            user_id: Uuid::new_v4(),
            spot_id,
            vehicle_number: "KA01AB1234".to_string(),
            status: "completed".to_string(),
            parking_timestamp: Some(ts()),
            leaving_timestamp: Some(ts() + chrono::Duration::minutes(90)),
            total_hours: Some(1.5),
            parking_cost: Some(15.0),
            remarks: None,
        };
        (
            vec![reservation],
            HashMap::from([(spot_id, spot)]),
            HashMap::from([(lot_id, lot)]),
        )
    }

    #[test]
    fn csv_contains_header_and_reservation_row() {
        let (reservations, spots, lots) = fixture();

        let data = build_csv(&reservations, &spots, &lots).expect("csv should build");
        let text = String::from_utf8(data).expect("csv should be utf-8");
        let mut lines = text.lines();

        let header = lines.next().expect("header line");
        assert!(header.starts_with("Reservation ID,Parking Lot,Parking Spot"));

        let row = lines.next().expect("data line");
        assert!(row.contains("Downtown"));
        assert!(row.contains("S001"));
        assert!(row.contains("KA01AB1234"));
        assert!(row.contains("2026-03-01"));
        assert!(row.contains("09:30:00"));
        assert!(row.contains("11:00:00"));
        assert!(row.contains("1.5"));
        assert!(row.contains("15.00"));
        assert!(row.contains("completed"));
    }

    #[test]
    fn missing_spot_exports_unknown_placeholders() {
        let (reservations, _, lots) = fixture();

        let data = build_csv(&reservations, &HashMap::new(), &lots).expect("csv should build");
        let text = String::from_utf8(data).expect("csv should be utf-8");
        assert!(text.lines().nth(1).expect("data line").contains("Unknown"));
    }

    #[test]
    fn empty_history_yields_header_only() {
        let data =
            build_csv(&[], &HashMap::new(), &HashMap::new()).expect("csv should build");
        let text = String::from_utf8(data).expect("csv should be utf-8");
        assert_eq!(text.lines().count(), 1);
    }
}
