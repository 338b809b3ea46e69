use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::dao::{LotDao, ReservationDao, SpotDao},
    db::entities::{parking_spot, reservation},
    error::AppError,
    parking::{
        ReservationStatus, SpotStatus,
        lifecycle::spot_status_for,
        pricing::round2,
        stats::{ReservationStats, summarize},
    },
};

#[derive(Debug, Serialize)]
pub struct SpotStatusCounts {
    pub available: u64,
    pub reserved: u64,
    pub occupied: u64,
}

#[derive(Debug, Serialize)]
pub struct AdminAnalytics {
    pub parking_status: SpotStatusCounts,
    pub total_completed_reservations: usize,
    pub total_cancelled_reservations: u64,
    pub total_revenue: f64,
    pub average_parking_duration: f64,
}

#[derive(Debug, Serialize)]
pub struct PublicStats {
    pub total_parking_lots: u64,
    pub total_parking_spots: u64,
    pub available_spots: u64,
    pub utilization_rate: f64,
    pub total_reservations: u64,
}

/// One spot whose stored status disagrees with the live-reservation view.
#[derive(Debug, PartialEq, Serialize)]
pub struct SpotInconsistency {
    pub spot_id: Uuid,
    pub lot_id: Uuid,
    pub spot_number: String,
    pub stored_status: String,
    pub expected_status: String,
    pub live_reservation_id: Option<Uuid>,
}

/// Compares stored spot statuses against live reservations. Lifecycle
/// transitions write both rows in one transaction, so anything reported
/// here came from an external write.
pub fn find_inconsistencies(
    spots: &[parking_spot::Model],
    live_reservations: &[reservation::Model],
) -> Vec<SpotInconsistency> {
    let live_by_spot: HashMap<Uuid, &reservation::Model> = live_reservations
        .iter()
        .map(|model| (model.spot_id, model))
        .collect();

    spots
        .iter()
        .filter_map(|spot| {
            let live = live_by_spot.get(&spot.id).copied();
            let expected = match live {
                Some(model) => ReservationStatus::try_from(model.status.as_str())
                    .map(spot_status_for)
                    .unwrap_or(SpotStatus::Available),
                None => SpotStatus::Available,
            };
            if spot.status == expected.as_str() {
                return None;
            }
            Some(SpotInconsistency {
                spot_id: spot.id,
                lot_id: spot.lot_id,
                spot_number: spot.spot_number.clone(),
                stored_status: spot.status.clone(),
                expected_status: expected.as_str().to_string(),
                live_reservation_id: live.map(|model| model.id),
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct StatsService {
    lot_dao: LotDao,
    spot_dao: SpotDao,
    reservation_dao: ReservationDao,
}

impl StatsService {
    pub fn new(lot_dao: LotDao, spot_dao: SpotDao, reservation_dao: ReservationDao) -> Self {
        Self {
            lot_dao,
            spot_dao,
            reservation_dao,
        }
    }

    pub async fn user_dashboard(&self, user_id: &Uuid) -> Result<ReservationStats, AppError> {
        let reservations = self.reservation_dao.list_by_user(user_id).await?;
        Ok(summarize(&reservations))
    }

    pub async fn admin_analytics(&self) -> Result<AdminAnalytics, AppError> {
        let parking_status = SpotStatusCounts {
            available: self
                .spot_dao
                .count_with_status(SpotStatus::Available)
                .await?,
            reserved: self.spot_dao.count_with_status(SpotStatus::Reserved).await?,
            occupied: self.spot_dao.count_with_status(SpotStatus::Occupied).await?,
        };

        let completed = self
            .reservation_dao
            .list_with_status(ReservationStatus::Completed)
            .await?;
        let total_revenue = round2(
            completed
                .iter()
                .filter_map(|model| model.parking_cost)
                .sum::<f64>(),
        );
        let total_duration: f64 = completed
            .iter()
            .filter_map(|model| model.total_hours)
            .sum();
        let average_parking_duration = if completed.is_empty() {
            0.0
        } else {
            round2(total_duration / completed.len() as f64)
        };

        Ok(AdminAnalytics {
            parking_status,
            total_completed_reservations: completed.len(),
            total_cancelled_reservations: self
                .reservation_dao
                .count_with_status(ReservationStatus::Cancelled)
                .await?,
            total_revenue,
            average_parking_duration,
        })
    }

    pub async fn public_stats(&self) -> Result<PublicStats, AppError> {
        let total_parking_lots = self.lot_dao.count().await?;
        let total_parking_spots = self.spot_dao.count_total().await?;
        let available_spots = self
            .spot_dao
            .count_with_status(SpotStatus::Available)
            .await?;
        let total_reservations = self.reservation_dao.count_total().await?;

        let utilization_rate = if total_parking_spots > 0 {
            let occupied = total_parking_spots - available_spots;
            round2(occupied as f64 / total_parking_spots as f64 * 100.0)
        } else {
            0.0
        };

        Ok(PublicStats {
            total_parking_lots,
            total_parking_spots,
            available_spots,
            utilization_rate,
            total_reservations,
        })
    }

    pub async fn inconsistent_spots(&self) -> Result<Vec<SpotInconsistency>, AppError> {
        let spots = self.spot_dao.list_all().await?;
        let live = self.reservation_dao.list_live().await?;
        Ok(find_inconsistencies(&spots, &live))
    }
}
