use std::collections::HashMap;

use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, DaoLayerError, LotDao, ReservationDao, SpotDao, lot_dao::NewLot},
    db::entities::{parking_lot, parking_spot, reservation},
    error::AppError,
    parking::{SpotStatus, validate},
};

#[derive(Debug)]
pub struct LotInput {
    pub prime_location_name: String,
    pub address: String,
    pub pin_code: String,
    pub hourly_rate: f64,
    pub number_of_spots: i32,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Default)]
pub struct LotPatch {
    pub prime_location_name: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub hourly_rate: Option<f64>,
    pub number_of_spots: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LotOverview {
    pub id: Uuid,
    pub prime_location_name: String,
    pub address: String,
    pub pin_code: String,
    pub hourly_rate: f64,
    pub number_of_spots: i32,
    pub available_spots: usize,
    pub occupied_spots: usize,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct ReservationRef {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_number: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SpotView {
    pub id: Uuid,
    pub spot_number: String,
    pub status: String,
    pub is_active: bool,
    pub current_reservation: Option<ReservationRef>,
}

#[derive(Debug, Serialize)]
pub struct LotDetail {
    pub lot: LotOverview,
    pub spots: Vec<SpotView>,
}

#[derive(Clone)]
pub struct LotService {
    db: DatabaseConnection,
    lot_dao: LotDao,
    spot_dao: SpotDao,
    reservation_dao: ReservationDao,
}

impl LotService {
    pub fn new(
        db: &DatabaseConnection,
        lot_dao: LotDao,
        spot_dao: SpotDao,
        reservation_dao: ReservationDao,
    ) -> Self {
        Self {
            db: db.clone(),
            lot_dao,
            spot_dao,
            reservation_dao,
        }
    }

    /// Creates the lot and its numbered spots in one transaction, keeping
    /// `number_of_spots` equal to the actual spot count.
    pub async fn create_lot(&self, input: LotInput) -> Result<parking_lot::Model, AppError> {
        let name = input.prime_location_name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("Location name required"));
        }
        let address = input.address.trim();
        if address.is_empty() {
            return Err(AppError::bad_request("Address required"));
        }
        let pin_code = validate::validate_pin_code(&input.pin_code)?;
        validate::validate_hourly_rate(input.hourly_rate)?;
        validate::validate_spot_count(input.number_of_spots)?;
        validate::validate_coordinates(input.latitude, input.longitude)?;

        let numbers: Vec<String> = (1..=input.number_of_spots)
            .map(validate::spot_number)
            .collect();

        let txn = self.db.begin().await?;
        let lot = self
            .lot_dao
            .insert_lot(
                &txn,
                NewLot {
                    prime_location_name: name.to_string(),
                    address: address.to_string(),
                    pin_code,
                    hourly_rate: input.hourly_rate,
                    number_of_spots: input.number_of_spots,
                    description: input.description,
                    latitude: input.latitude,
                    longitude: input.longitude,
                },
            )
            .await?;
        self.spot_dao.create_spots(&txn, &lot.id, &numbers).await?;
        txn.commit().await?;

        tracing::info!(lot = %lot.id, spots = numbers.len(), "parking lot created");
        Ok(lot)
    }

    /// Updates lot fields; a spot-count change appends new spots or removes
    /// free ones (highest numbers first) in the same transaction. Spots that
    /// are occupied or held by a live reservation are never removed.
    pub async fn update_lot(
        &self,
        lot_id: &Uuid,
        patch: LotPatch,
    ) -> Result<parking_lot::Model, AppError> {
        let lot = self.require_lot(lot_id).await?;

        if let Some(name) = patch.prime_location_name.as_deref() {
            if name.trim().is_empty() {
                return Err(AppError::bad_request("Location name required"));
            }
        }
        let pin_code = match patch.pin_code.as_deref() {
            Some(pin) => Some(validate::validate_pin_code(pin)?),
            None => None,
        };
        if let Some(rate) = patch.hourly_rate {
            validate::validate_hourly_rate(rate)?;
        }
        if let Some(count) = patch.number_of_spots {
            validate::validate_spot_count(count)?;
        }

        let mut to_add: Vec<String> = Vec::new();
        let mut to_remove: Vec<Uuid> = Vec::new();
        if let Some(new_count) = patch.number_of_spots {
            let old_count = lot.number_of_spots;
            if new_count > old_count {
                to_add = (old_count + 1..=new_count).map(validate::spot_number).collect();
            } else if new_count < old_count {
                let needed = (old_count - new_count) as usize;
                let spots = self.spot_dao.list_by_lot(lot_id).await?;
                let candidate_ids: Vec<Uuid> = spots
                    .iter()
                    .filter(|spot| spot.status == SpotStatus::Available.as_str())
                    .map(|spot| spot.id)
                    .collect();
                let live_ids = self.reservation_dao.live_spot_ids(&candidate_ids).await?;
                let mut removable: Vec<&parking_spot::Model> = spots
                    .iter()
                    .filter(|spot| {
                        spot.status == SpotStatus::Available.as_str()
                            && !live_ids.contains(&spot.id)
                    })
                    .collect();
                if removable.len() < needed {
                    return Err(AppError::conflict(
                        "Cannot shrink lot below its occupied spots",
                    ));
                }
                removable.sort_by(|a, b| b.spot_number.cmp(&a.spot_number));
                to_remove = removable
                    .into_iter()
                    .take(needed)
                    .map(|spot| spot.id)
                    .collect();
            }
        }

        let txn = self.db.begin().await?;
        let updated = self
            .lot_dao
            .apply_update(&txn, lot_id, move |active| {
                if let Some(name) = patch.prime_location_name {
                    active.prime_location_name = sea_orm::Set(name.trim().to_string());
                }
                if let Some(address) = patch.address {
                    active.address = sea_orm::Set(address);
                }
                if let Some(pin) = pin_code {
                    active.pin_code = sea_orm::Set(pin);
                }
                if let Some(rate) = patch.hourly_rate {
                    active.hourly_rate = sea_orm::Set(rate);
                }
                if let Some(count) = patch.number_of_spots {
                    active.number_of_spots = sea_orm::Set(count);
                }
                if let Some(description) = patch.description {
                    active.description = sea_orm::Set(Some(description));
                }
                if let Some(is_active) = patch.is_active {
                    active.is_active = sea_orm::Set(is_active);
                }
            })
            .await?;
        if !to_add.is_empty() {
            self.spot_dao.create_spots(&txn, lot_id, &to_add).await?;
        }
        if !to_remove.is_empty() {
            self.spot_dao.delete_spots(&txn, &to_remove).await?;
        }
        txn.commit().await?;

        Ok(updated)
    }

    /// A lot can only be deleted once every spot is free; spots are removed
    /// by the cascade.
    pub async fn delete_lot(&self, lot_id: &Uuid) -> Result<(), AppError> {
        self.require_lot(lot_id).await?;

        let spots = self.spot_dao.list_by_lot(lot_id).await?;
        let any_taken = spots
            .iter()
            .any(|spot| spot.status != SpotStatus::Available.as_str());
        if any_taken {
            return Err(AppError::conflict("Cannot delete lot with occupied spots"));
        }

        let spot_ids: Vec<Uuid> = spots.iter().map(|spot| spot.id).collect();
        let live_ids = self.reservation_dao.live_spot_ids(&spot_ids).await?;
        if !live_ids.is_empty() {
            return Err(AppError::conflict("Cannot delete lot with occupied spots"));
        }

        self.lot_dao.delete(*lot_id).await?;
        tracing::info!(lot = %lot_id, "parking lot deleted");
        Ok(())
    }

    pub async fn list_overview(&self) -> Result<Vec<LotOverview>, AppError> {
        let lots = self.lot_dao.list_lots().await?;
        let mut overviews = Vec::with_capacity(lots.len());
        for lot in lots {
            let spots = self.spot_dao.list_by_lot(&lot.id).await?;
            overviews.push(overview_of(lot, &spots));
        }
        Ok(overviews)
    }

    pub async fn detail(&self, lot_id: &Uuid) -> Result<LotDetail, AppError> {
        let lot = self.require_lot(lot_id).await?;
        let spots = self.spot_dao.list_by_lot(lot_id).await?;
        let spot_ids: Vec<Uuid> = spots.iter().map(|spot| spot.id).collect();
        let live: HashMap<Uuid, reservation::Model> = self
            .reservation_dao
            .list_live_for_spots(&spot_ids)
            .await?
            .into_iter()
            .map(|model| (model.spot_id, model))
            .collect();

        let overview = overview_of(lot, &spots);
        let spots = spots
            .into_iter()
            .map(|spot| {
                let current_reservation = live.get(&spot.id).map(|model| ReservationRef {
                    id: model.id,
                    user_id: model.user_id,
                    vehicle_number: model.vehicle_number.clone(),
                    status: model.status.clone(),
                });
                SpotView {
                    id: spot.id,
                    spot_number: spot.spot_number,
                    status: spot.status,
                    is_active: spot.is_active,
                    current_reservation,
                }
            })
            .collect();

        Ok(LotDetail {
            lot: overview,
            spots,
        })
    }

    async fn require_lot(&self, lot_id: &Uuid) -> Result<parking_lot::Model, AppError> {
        self.lot_dao.find_by_id(*lot_id).await.map_err(|err| match err {
            DaoLayerError::NotFound { .. } => AppError::not_found("Parking lot not found"),
            other => other.into(),
        })
    }
}

fn overview_of(lot: parking_lot::Model, spots: &[parking_spot::Model]) -> LotOverview {
    let available = spots
        .iter()
        .filter(|spot| spot.status == SpotStatus::Available.as_str())
        .count();
    let occupied = spots
        .iter()
        .filter(|spot| spot.status == SpotStatus::Occupied.as_str())
        .count();
    LotOverview {
        id: lot.id,
        prime_location_name: lot.prime_location_name,
        address: lot.address,
        pin_code: lot.pin_code,
        hourly_rate: lot.hourly_rate,
        number_of_spots: lot.number_of_spots,
        available_spots: available,
        occupied_spots: occupied,
        description: lot.description,
        latitude: lot.latitude,
        longitude: lot.longitude,
        is_active: lot.is_active,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use uuid::Uuid;

    use crate::db::entities::{parking_lot, parking_spot, reservation};
    use crate::parking::{ReservationStatus, SpotStatus};
    use crate::services::ServiceContext;

    use super::{LotInput, LotPatch, LotService};

    fn ts() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn lot_model(id: Uuid, spots: i32) -> parking_lot::Model {
        parking_lot::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            prime_location_name: "Downtown".to_string(),
            address: "123 Main Street".to_string(),
            pin_code: "560001".to_string(),
            hourly_rate: 10.0,
            number_of_spots: spots,
            description: None,
            latitude: None,
            longitude: None,
            is_active: true,
        }
    }

    fn spot_model(lot_id: Uuid, number: &str, status: SpotStatus) -> parking_spot::Model {
        parking_spot::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            lot_id,
            spot_number: number.to_string(),
            status: status.as_str().to_string(),
            is_active: true,
        }
    }

    fn service(db: &DatabaseConnection) -> LotService {
        ServiceContext::new(db).lot()
    }

    fn valid_input() -> LotInput {
        LotInput {
            prime_location_name: "Downtown".to_string(),
            address: "123 Main Street".to_string(),
            pin_code: "560001".to_string(),
            hourly_rate: 10.0,
            number_of_spots: 3,
            description: None,
            latitude: None,
            longitude: None,
        }
    }

    #[tokio::test]
    async fn create_lot_rejects_invalid_pin_before_any_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let mut input = valid_input();
        input.pin_code = "12a".to_string();
        let err = service(&db)
            .create_lot(input)
            .await
            .expect_err("create should fail");
        assert_eq!(err.message(), "Invalid pin code");
    }

    #[tokio::test]
    async fn create_lot_rejects_spot_count_out_of_bounds() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let mut input = valid_input();
        input.number_of_spots = 0;
        let err = service(&db)
            .create_lot(input)
            .await
            .expect_err("create should fail");
        assert_eq!(err.message(), "Invalid number of spots");
    }

    #[tokio::test]
    async fn create_lot_rejects_unpaired_coordinates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let mut input = valid_input();
        input.latitude = Some(12.9);
        let err = service(&db)
            .create_lot(input)
            .await
            .expect_err("create should fail");
        assert_eq!(
            err.message(),
            "Latitude and longitude must be provided together"
        );
    }

    #[tokio::test]
    async fn update_lot_refuses_to_shrink_over_taken_spots() {
        let lot_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 3)]])
            .append_query_results([vec![
                spot_model(lot_id, "S001", SpotStatus::Available),
                spot_model(lot_id, "S002", SpotStatus::Occupied),
                spot_model(lot_id, "S003", SpotStatus::Occupied),
            ]])
            .append_query_results([Vec::<reservation::Model>::new()])
            .into_connection();

        let err = service(&db)
            .update_lot(
                &lot_id,
                LotPatch {
                    number_of_spots: Some(1),
                    ..Default::default()
                },
            )
            .await
            .expect_err("update should fail");
        assert_eq!(err.message(), "Cannot shrink lot below its occupied spots");
    }

    #[tokio::test]
    async fn update_lot_shrink_protects_spots_with_live_reservations() {
        // Both spots read available but a live reservation still points at
        // S002, so only S001 is removable and shrinking by two must fail.
        let lot_id = Uuid::new_v4();
        let s1 = spot_model(lot_id, "S001", SpotStatus::Available);
        let s2 = spot_model(lot_id, "S002", SpotStatus::Available);
        let live = reservation::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            user_id: Uuid::new_v4(),
            spot_id: s2.id,
            vehicle_number: "KA01AB1234".to_string(),
            status: ReservationStatus::Reserved.as_str().to_string(),
            parking_timestamp: None,
            leaving_timestamp: None,
            total_hours: None,
            parking_cost: Some(10.0),
            remarks: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 3)]])
            .append_query_results([vec![s1, s2]])
            .append_query_results([vec![live]])
            .into_connection();

        let err = service(&db)
            .update_lot(
                &lot_id,
                LotPatch {
                    number_of_spots: Some(1),
                    ..Default::default()
                },
            )
            .await
            .expect_err("shrink by two should fail");
        assert_eq!(err.message(), "Cannot shrink lot below its occupied spots");
    }

    #[tokio::test]
    async fn delete_lot_rejects_taken_spots() {
        let lot_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 2)]])
            .append_query_results([vec![
                spot_model(lot_id, "S001", SpotStatus::Available),
                spot_model(lot_id, "S002", SpotStatus::Occupied),
            ]])
            .into_connection();

        let err = service(&db)
            .delete_lot(&lot_id)
            .await
            .expect_err("delete should fail");
        assert_eq!(err.message(), "Cannot delete lot with occupied spots");
    }

    #[tokio::test]
    async fn list_overview_counts_spot_statuses() {
        let lot_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 3)]])
            .append_query_results([vec![
                spot_model(lot_id, "S001", SpotStatus::Available),
                spot_model(lot_id, "S002", SpotStatus::Occupied),
                spot_model(lot_id, "S003", SpotStatus::Reserved),
            ]])
            .into_connection();

        let overview = service(&db)
            .list_overview()
            .await
            .expect("listing should succeed");
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].available_spots, 1);
        assert_eq!(overview[0].occupied_spots, 1);
    }
}
