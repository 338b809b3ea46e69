//! Pure aggregation over reservation rows, shared by the user dashboard and
//! the monthly report job.

use serde::Serialize;

use crate::db::entities::reservation;
use crate::parking::ReservationStatus;
use crate::parking::pricing::round2;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ReservationStats {
    pub total_reservations: usize,
    pub completed_reservations: usize,
    pub active_reservations: usize,
    pub cancelled_reservations: usize,
    pub total_revenue: f64,
    pub average_duration: f64,
    pub average_cost: f64,
}

pub fn summarize(reservations: &[reservation::Model]) -> ReservationStats {
    let mut stats = ReservationStats {
        total_reservations: reservations.len(),
        ..Default::default()
    };
    let mut total_duration = 0.0;

    for reservation in reservations {
        match ReservationStatus::try_from(reservation.status.as_str()) {
            Ok(ReservationStatus::Completed) => {
                stats.completed_reservations += 1;
                if let Some(cost) = reservation.parking_cost {
                    stats.total_revenue += cost;
                }
                if let Some(hours) = reservation.total_hours {
                    total_duration += hours;
                }
            }
            Ok(ReservationStatus::Reserved) | Ok(ReservationStatus::Active) => {
                stats.active_reservations += 1;
            }
            Ok(ReservationStatus::Cancelled) => {
                stats.cancelled_reservations += 1;
            }
            Err(()) => {}
        }
    }

    if stats.completed_reservations > 0 {
        stats.average_duration = round2(total_duration / stats.completed_reservations as f64);
        stats.average_cost = round2(stats.total_revenue / stats.completed_reservations as f64);
    }
    stats.total_revenue = round2(stats.total_revenue);

    stats
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use uuid::Uuid;

    use crate::db::entities::reservation;

    use super::summarize;

    fn ts() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 3, 1, 8, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn reservation(
        status: &str,
        total_hours: Option<f64>,
        parking_cost: Option<f64>,
    ) -> reservation::Model {
        reservation::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            user_id: Uuid::new_v4(),
            spot_id: Uuid::new_v4(),
            vehicle_number: "KA01AB1234".to_string(),
            status: status.to_string(),
            parking_timestamp: None,
            leaving_timestamp: None,
            total_hours,
            parking_cost,
            remarks: None,
        }
    }

    #[test]
    fn empty_input_yields_zeroed_stats() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_reservations, 0);
        assert_eq!(stats.total_revenue, 0.0);
        assert_eq!(stats.average_cost, 0.0);
    }

    #[test]
    fn aggregates_by_status() {
        let rows = vec![
            reservation("completed", Some(2.0), Some(20.0)),
            reservation("completed", Some(1.0), Some(15.0)),
            reservation("active", None, None),
            reservation("reserved", None, Some(10.0)),
            reservation("cancelled", None, None),
        ];

        let stats = summarize(&rows);
        assert_eq!(stats.total_reservations, 5);
        assert_eq!(stats.completed_reservations, 2);
        assert_eq!(stats.active_reservations, 2);
        assert_eq!(stats.cancelled_reservations, 1);
        assert_eq!(stats.total_revenue, 35.0);
        assert_eq!(stats.average_duration, 1.5);
        assert_eq!(stats.average_cost, 17.5);
    }

    #[test]
    fn live_reservation_costs_do_not_count_as_revenue() {
        // The reserve placeholder estimate must not leak into revenue.
        let rows = vec![reservation("reserved", None, Some(10.0))];

        let stats = summarize(&rows);
        assert_eq!(stats.total_revenue, 0.0);
    }

    #[test]
    fn averages_are_rounded_to_two_decimals() {
        let rows = vec![
            reservation("completed", Some(1.0), Some(10.0)),
            reservation("completed", Some(1.0), Some(10.0)),
            reservation("completed", Some(1.0), Some(5.0)),
        ];

        let stats = summarize(&rows);
        assert_eq!(stats.average_cost, 8.33);
    }
}
