use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::{
    db::dao::{DaoBase, LotDao, ReservationDao, SpotDao},
    db::entities::{parking_lot, parking_spot, reservation},
    error::AppError,
    parking::{
        LifecycleEvent, ReservationStatus, SpotStatus,
        lifecycle::{spot_status_for, transition},
        pricing,
        validate,
    },
};

/// Identity performing a lifecycle operation. Admin actors bypass the
/// ownership guard (force release and similar override paths).
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}

/// Billing outcome of a completing transition (release, or cancel while
/// active).
#[derive(Debug, PartialEq)]
pub struct Billing {
    pub leaving_timestamp: DateTime<FixedOffset>,
    pub total_hours: f64,
    pub parking_cost: f64,
}

/// Elapsed time is billed with the one-hour minimum; `total_hours` keeps the
/// display rounding, the cost uses the raw duration.
pub fn billing_for_completion(
    parked_at: DateTime<FixedOffset>,
    leaving_at: DateTime<FixedOffset>,
    hourly_rate: f64,
) -> Billing {
    let raw_hours = pricing::duration_hours(parked_at, leaving_at);
    Billing {
        leaving_timestamp: leaving_at,
        total_hours: pricing::round2(raw_hours),
        parking_cost: pricing::parking_cost(raw_hours, hourly_rate),
    }
}

#[derive(Clone)]
pub struct ReservationService {
    db: DatabaseConnection,
    lot_dao: LotDao,
    spot_dao: SpotDao,
    reservation_dao: ReservationDao,
}

impl ReservationService {
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

    /// Creates a reservation on the first free spot of the lot. The spot is
    /// claimed with a conditional update inside the same transaction that
    /// inserts the reservation row.
    pub async fn reserve(
        &self,
        user_id: &Uuid,
        lot_id: &Uuid,
        vehicle_number: &str,
    ) -> Result<reservation::Model, AppError> {
        let vehicle_number = validate::normalize_vehicle_number(vehicle_number)?;

        let lot = self.require_lot(lot_id).await?;
        if !lot.is_active {
            return Err(AppError::conflict("Parking lot is not active"));
        }

        if self
            .reservation_dao
            .live_by_user(user_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "User already has an active reservation",
            ));
        }

        let spot = self.allocate_spot(lot_id).await?;

        let txn = self.db.begin().await?;
        let claimed = self.spot_dao.claim_spot(&txn, &spot.id).await?;
        if !claimed {
            txn.rollback().await?;
            return Err(AppError::conflict("No spots available in this lot"));
        }

        // Placeholder estimate until release computes the real amount.
        let cost_estimate = pricing::round2(lot.hourly_rate);
        let created = self
            .reservation_dao
            .create_reservation(&txn, user_id, &spot.id, &vehicle_number, cost_estimate)
            .await?;
        txn.commit().await?;

        tracing::info!(
            reservation = %created.id,
            spot = %spot.spot_number,
            lot = %lot.prime_location_name,
            "reservation created"
        );
        Ok(created)
    }

    /// First active spot of the lot that is stored available and not
    /// referenced by a live reservation. Selection order is the stored
    /// spot_number ordering; no fairness beyond that.
    async fn allocate_spot(&self, lot_id: &Uuid) -> Result<parking_spot::Model, AppError> {
        let spots = self.spot_dao.list_by_lot(lot_id).await?;
        let candidates: Vec<parking_spot::Model> = spots
            .into_iter()
            .filter(|spot| {
                spot.is_active && spot.status == SpotStatus::Available.as_str()
            })
            .collect();
        if candidates.is_empty() {
            return Err(AppError::conflict("No spots available in this lot"));
        }

        let candidate_ids: Vec<Uuid> = candidates.iter().map(|spot| spot.id).collect();
        let live_ids = self.reservation_dao.live_spot_ids(&candidate_ids).await?;

        candidates
            .into_iter()
            .find(|spot| !live_ids.contains(&spot.id))
            .ok_or_else(|| AppError::conflict("No spots available in this lot"))
    }

    /// reserved -> active; the vehicle arrived.
    pub async fn park(
        &self,
        actor: &Actor,
        reservation_id: &Uuid,
    ) -> Result<reservation::Model, AppError> {
        let current = self.load_guarded(actor, reservation_id).await?;
        let status = parse_status(&current)?;
        let next = apply_event(status, LifecycleEvent::Park)?;

        let now = Utc::now().fixed_offset();
        let txn = self.db.begin().await?;
        let updated = self
            .reservation_dao
            .apply_update(&txn, reservation_id, move |active| {
                active.status = sea_orm::Set(next.as_str().to_string());
                active.parking_timestamp = sea_orm::Set(Some(now));
            })
            .await?;
        self.spot_dao
            .set_status(&txn, &current.spot_id, spot_status_for(next))
            .await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// active -> completed; bills the stay and frees the spot.
    pub async fn release(
        &self,
        actor: &Actor,
        reservation_id: &Uuid,
    ) -> Result<reservation::Model, AppError> {
        let current = self.load_guarded(actor, reservation_id).await?;
        let status = parse_status(&current)?;
        let next = apply_event(status, LifecycleEvent::Release)?;

        let parked_at = current
            .parking_timestamp
            .ok_or_else(|| AppError::conflict("Reservation has no parking time"))?;
        let hourly_rate = self.hourly_rate_for_spot(&current.spot_id).await?;
        let billing = billing_for_completion(parked_at, Utc::now().fixed_offset(), hourly_rate);

        let txn = self.db.begin().await?;
        let updated = self
            .reservation_dao
            .apply_update(&txn, reservation_id, move |active| {
                active.status = sea_orm::Set(next.as_str().to_string());
                active.leaving_timestamp = sea_orm::Set(Some(billing.leaving_timestamp));
                active.total_hours = sea_orm::Set(Some(billing.total_hours));
                active.parking_cost = sea_orm::Set(Some(billing.parking_cost));
            })
            .await?;
        self.spot_dao
            .set_status(&txn, &current.spot_id, spot_status_for(next))
            .await?;
        txn.commit().await?;

        tracing::info!(
            reservation = %updated.id,
            cost = updated.parking_cost,
            "reservation released"
        );
        Ok(updated)
    }

    /// reserved|active -> cancelled. Cancelling from reserved clears the
    /// placeholder estimate; cancelling from active bills the elapsed time
    /// like a release (policy: an occupied spot is never free to abandon).
    pub async fn cancel(
        &self,
        actor: &Actor,
        reservation_id: &Uuid,
        remark: Option<String>,
    ) -> Result<reservation::Model, AppError> {
        let current = self.load_guarded(actor, reservation_id).await?;
        let status = parse_status(&current)?;
        let next = apply_event(status, LifecycleEvent::Cancel)?;

        let billing = match (status, current.parking_timestamp) {
            (ReservationStatus::Active, Some(parked_at)) => {
                let hourly_rate = self.hourly_rate_for_spot(&current.spot_id).await?;
                Some(billing_for_completion(
                    parked_at,
                    Utc::now().fixed_offset(),
                    hourly_rate,
                ))
            }
            _ => None,
        };

        let txn = self.db.begin().await?;
        let updated = self
            .reservation_dao
            .apply_update(&txn, reservation_id, move |active| {
                active.status = sea_orm::Set(next.as_str().to_string());
                active.remarks = sea_orm::Set(Some(
                    remark.unwrap_or_else(|| "cancelled by user".to_string()),
                ));
                match billing {
                    Some(billing) => {
                        active.leaving_timestamp =
                            sea_orm::Set(Some(billing.leaving_timestamp));
                        active.total_hours = sea_orm::Set(Some(billing.total_hours));
                        active.parking_cost = sea_orm::Set(Some(billing.parking_cost));
                    }
                    None => {
                        active.parking_cost = sea_orm::Set(None);
                    }
                }
            })
            .await?;
        self.spot_dao
            .set_status(&txn, &current.spot_id, spot_status_for(next))
            .await?;
        txn.commit().await?;

        Ok(updated)
    }

    pub async fn history(&self, user_id: &Uuid) -> Result<Vec<reservation::Model>, AppError> {
        Ok(self.reservation_dao.list_by_user(user_id).await?)
    }

    pub async fn require(&self, reservation_id: &Uuid) -> Result<reservation::Model, AppError> {
        self.reservation_dao
            .find_by_id(*reservation_id)
            .await
            .map_err(|err| match err {
                crate::db::dao::DaoLayerError::NotFound { .. } => {
                    AppError::not_found("Reservation not found")
                }
                other => other.into(),
            })
    }

    async fn load_guarded(
        &self,
        actor: &Actor,
        reservation_id: &Uuid,
    ) -> Result<reservation::Model, AppError> {
        let reservation = self.require(reservation_id).await?;
        if !actor.is_admin && reservation.user_id != actor.user_id {
            return Err(AppError::forbidden("Not your reservation"));
        }
        Ok(reservation)
    }

    async fn require_lot(&self, lot_id: &Uuid) -> Result<parking_lot::Model, AppError> {
        self.lot_dao.find_by_id(*lot_id).await.map_err(|err| match err {
            crate::db::dao::DaoLayerError::NotFound { .. } => {
                AppError::not_found("Parking lot not found")
            }
            other => other.into(),
        })
    }

    async fn hourly_rate_for_spot(&self, spot_id: &Uuid) -> Result<f64, AppError> {
        let spot = self.spot_dao.find_by_id(*spot_id).await?;
        let lot = self.lot_dao.find_by_id(spot.lot_id).await?;
        Ok(lot.hourly_rate)
    }
}

fn parse_status(reservation: &reservation::Model) -> Result<ReservationStatus, AppError> {
    ReservationStatus::try_from(reservation.status.as_str()).map_err(|()| {
        AppError::internal_with_source(
            "Reservation has an unknown status",
            format!("id={} status={}", reservation.id, reservation.status),
        )
    })
}

fn apply_event(
    status: ReservationStatus,
    event: LifecycleEvent,
) -> Result<ReservationStatus, AppError> {
    transition(status, event).map_err(|err| AppError::conflict(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone, Utc};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use crate::db::entities::{parking_lot, parking_spot, reservation};
    use crate::parking::{ReservationStatus, SpotStatus};
    use crate::services::ServiceContext;

    use super::{Actor, ReservationService, billing_for_completion};

    fn ts() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn lot_model(id: Uuid, rate: f64, active: bool) -> parking_lot::Model {
        parking_lot::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            prime_location_name: "Downtown".to_string(),
            address: "123 Main Street".to_string(),
            pin_code: "560001".to_string(),
            hourly_rate: rate,
            number_of_spots: 2,
            description: None,
            latitude: None,
            longitude: None,
            is_active: active,
        }
    }

    fn spot_model(id: Uuid, lot_id: Uuid, number: &str, status: SpotStatus) -> parking_spot::Model {
        parking_spot::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            lot_id,
            spot_number: number.to_string(),
            status: status.as_str().to_string(),
            is_active: true,
        }
    }

    fn reservation_model(
        id: Uuid,
        user_id: Uuid,
        spot_id: Uuid,
        status: ReservationStatus,
    ) -> reservation::Model {
        reservation::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            user_id,
            spot_id,
            vehicle_number: "KA01AB1234".to_string(),
            status: status.as_str().to_string(),
            parking_timestamp: None,
            leaving_timestamp: None,
            total_hours: None,
            parking_cost: Some(10.0),
            remarks: None,
        }
    }

    fn service(db: &DatabaseConnection) -> ReservationService {
        ServiceContext::new(db).reservation()
    }

    #[test]
    fn billing_covers_the_ninety_minute_example() {
        let parked = ts();
        let billing = billing_for_completion(parked, parked + Duration::minutes(90), 10.0);

        assert_eq!(billing.total_hours, 1.5);
        assert_eq!(billing.parking_cost, 15.0);
    }

    #[test]
    fn billing_applies_minimum_hour() {
        let parked = ts();
        let billing = billing_for_completion(parked, parked + Duration::minutes(20), 10.0);

        assert_eq!(billing.total_hours, 0.33);
        assert_eq!(billing.parking_cost, 10.0);
    }

    #[tokio::test]
    async fn reserve_rejects_invalid_vehicle_number_before_any_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(&db)
            .reserve(&Uuid::new_v4(), &Uuid::new_v4(), "x")
            .await
            .expect_err("reserve should fail");
        assert_eq!(err.message(), "Invalid vehicle number");
    }

    #[tokio::test]
    async fn reserve_rejects_inactive_lot() {
        let lot_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 10.0, false)]])
            .into_connection();

        let err = service(&db)
            .reserve(&Uuid::new_v4(), &lot_id, "KA01AB1234")
            .await
            .expect_err("reserve should fail");
        assert_eq!(err.message(), "Parking lot is not active");
    }

    #[tokio::test]
    async fn reserve_rejects_second_live_reservation() {
        let lot_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 10.0, true)]])
            .append_query_results([vec![reservation_model(
                Uuid::new_v4(),
                user_id,
                Uuid::new_v4(),
                ReservationStatus::Reserved,
            )]])
            .into_connection();

        let err = service(&db)
            .reserve(&user_id, &lot_id, "KA01AB1234")
            .await
            .expect_err("reserve should fail");
        assert_eq!(err.message(), "User already has an active reservation");
    }

    #[tokio::test]
    async fn reserve_fails_when_every_spot_is_taken() {
        let lot_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 10.0, true)]])
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_query_results([vec![
                spot_model(Uuid::new_v4(), lot_id, "S001", SpotStatus::Occupied),
                spot_model(Uuid::new_v4(), lot_id, "S002", SpotStatus::Reserved),
            ]])
            .into_connection();

        let err = service(&db)
            .reserve(&Uuid::new_v4(), &lot_id, "KA01AB1234")
            .await
            .expect_err("reserve should fail");
        assert_eq!(err.message(), "No spots available in this lot");
    }

    #[tokio::test]
    async fn reserve_skips_available_spot_with_live_reservation() {
        // Spot S001 says available but a live reservation still points at
        // it; the allocator must not hand it out again.
        let lot_id = Uuid::new_v4();
        let drifted_spot = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 10.0, true)]])
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_query_results([vec![spot_model(
                drifted_spot,
                lot_id,
                "S001",
                SpotStatus::Available,
            )]])
            .append_query_results([vec![reservation_model(
                Uuid::new_v4(),
                Uuid::new_v4(),
                drifted_spot,
                ReservationStatus::Active,
            )]])
            .into_connection();

        let err = service(&db)
            .reserve(&Uuid::new_v4(), &lot_id, "KA01AB1234")
            .await
            .expect_err("reserve should fail");
        assert_eq!(err.message(), "No spots available in this lot");
    }

    #[tokio::test]
    async fn reserve_reports_conflict_when_claim_loses_the_race() {
        let lot_id = Uuid::new_v4();
        let spot_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 10.0, true)]])
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_query_results([vec![spot_model(
                spot_id,
                lot_id,
                "S001",
                SpotStatus::Available,
            )]])
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = service(&db)
            .reserve(&Uuid::new_v4(), &lot_id, "KA01AB1234")
            .await
            .expect_err("reserve should fail");
        assert_eq!(err.message(), "No spots available in this lot");
    }

    #[tokio::test]
    async fn reserve_creates_reservation_on_first_free_spot() {
        let lot_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let spot_id = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![lot_model(lot_id, 10.0, true)]])
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_query_results([vec![spot_model(
                spot_id,
                lot_id,
                "S001",
                SpotStatus::Available,
            )]])
            .append_query_results([Vec::<reservation::Model>::new()])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![reservation_model(
                reservation_id,
                user_id,
                spot_id,
                ReservationStatus::Reserved,
            )]])
            .into_connection();

        let created = service(&db)
            .reserve(&user_id, &lot_id, "ka 01 ab 1234")
            .await
            .expect("reserve should succeed");
        assert_eq!(created.id, reservation_id);
        assert_eq!(created.status, "reserved");
    }

    #[tokio::test]
    async fn park_rejects_foreign_reservation() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reservation_model(
                reservation_id,
                owner,
                Uuid::new_v4(),
                ReservationStatus::Reserved,
            )]])
            .into_connection();

        let err = service(&db)
            .park(&Actor::user(other), &reservation_id)
            .await
            .expect_err("park should fail");
        assert_eq!(err.message(), "Not your reservation");
    }

    #[tokio::test]
    async fn park_rejects_wrong_source_state() {
        let user_id = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reservation_model(
                reservation_id,
                user_id,
                Uuid::new_v4(),
                ReservationStatus::Completed,
            )]])
            .into_connection();

        let err = service(&db)
            .park(&Actor::user(user_id), &reservation_id)
            .await
            .expect_err("park should fail");
        assert_eq!(err.message(), "cannot park a completed reservation");
    }

    #[tokio::test]
    async fn release_rejects_reservation_that_never_parked() {
        let user_id = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reservation_model(
                reservation_id,
                user_id,
                Uuid::new_v4(),
                ReservationStatus::Reserved,
            )]])
            .into_connection();

        let err = service(&db)
            .release(&Actor::user(user_id), &reservation_id)
            .await
            .expect_err("release should fail");
        assert_eq!(err.message(), "cannot release a reserved reservation");
    }

    #[tokio::test]
    async fn release_twice_fails_on_the_state_guard() {
        let user_id = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reservation_model(
                reservation_id,
                user_id,
                Uuid::new_v4(),
                ReservationStatus::Completed,
            )]])
            .into_connection();

        let err = service(&db)
            .release(&Actor::user(user_id), &reservation_id)
            .await
            .expect_err("second release should fail");
        assert_eq!(err.message(), "cannot release a completed reservation");
    }

    #[tokio::test]
    async fn admin_actor_bypasses_ownership_guard() {
        let owner = Uuid::new_v4();
        let admin = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();
        // Guard passes for the admin; the terminal state then rejects.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![reservation_model(
                reservation_id,
                owner,
                Uuid::new_v4(),
                ReservationStatus::Cancelled,
            )]])
            .into_connection();

        let err = service(&db)
            .release(&Actor::admin(admin), &reservation_id)
            .await
            .expect_err("release should fail on state, not ownership");
        assert_eq!(err.message(), "cannot release a cancelled reservation");
    }

    #[tokio::test]
    async fn cancel_from_active_bills_elapsed_time() {
        let user_id = Uuid::new_v4();
        let spot_id = Uuid::new_v4();
        let lot_id = Uuid::new_v4();
        let reservation_id = Uuid::new_v4();

        let mut active_res =
            reservation_model(reservation_id, user_id, spot_id, ReservationStatus::Active);
        active_res.parking_timestamp = Some(Utc::now().fixed_offset() - Duration::minutes(90));

        let mut cancelled = active_res.clone();
        cancelled.status = ReservationStatus::Cancelled.as_str().to_string();
        cancelled.total_hours = Some(1.5);
        cancelled.parking_cost = Some(15.0);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // load_guarded
            .append_query_results([vec![active_res.clone()]])
            // hourly_rate_for_spot: spot then lot
            .append_query_results([vec![spot_model(
                spot_id,
                lot_id,
                "S001",
                SpotStatus::Occupied,
            )]])
            .append_query_results([vec![lot_model(lot_id, 10.0, true)]])
            // apply_update: select then update-returning
            .append_query_results([vec![active_res]])
            .append_query_results([vec![cancelled]])
            // spot set_status
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let updated = service(&db)
            .cancel(&Actor::user(user_id), &reservation_id, None)
            .await
            .expect("cancel should succeed");
        assert_eq!(updated.status, "cancelled");
        assert_eq!(updated.parking_cost, Some(15.0));
    }
}
