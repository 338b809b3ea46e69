use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::prelude::Reservation;
use crate::db::entities::reservation;
use crate::parking::ReservationStatus;

const LIVE_STATUSES: [&str; 2] = ["reserved", "active"];

#[derive(Clone)]
pub struct ReservationDao {
    db: DatabaseConnection,
}

impl DaoBase for ReservationDao {
    type Entity = Reservation;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl ReservationDao {
    /// Inserts a fresh reservation inside the caller's transaction so the
    /// spot claim and the reservation row commit or roll back together.
    pub async fn create_reservation<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &Uuid,
        spot_id: &Uuid,
        vehicle_number: &str,
        cost_estimate: f64,
    ) -> DaoResult<reservation::Model> {
        let now = Utc::now().fixed_offset();
        let model = reservation::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            user_id: Set(*user_id),
            spot_id: Set(*spot_id),
            vehicle_number: Set(vehicle_number.to_string()),
            status: Set(ReservationStatus::Reserved.as_str().to_string()),
            parking_timestamp: Set(None),
            leaving_timestamp: Set(None),
            total_hours: Set(None),
            parking_cost: Set(Some(cost_estimate)),
            remarks: Set(None),
        };
        model.insert(conn).await.map_err(DaoLayerError::Db)
    }

    /// Re-reads and mutates one reservation inside the caller's transaction.
    pub async fn apply_update<C, F>(
        &self,
        conn: &C,
        id: &Uuid,
        apply: F,
    ) -> DaoResult<reservation::Model>
    where
        C: ConnectionTrait,
        F: for<'a> FnOnce(&'a mut reservation::ActiveModel) + Send,
    {
        let model = Reservation::find_by_id(*id)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)?
            .ok_or(DaoLayerError::NotFound {
                entity: std::any::type_name::<Reservation>(),
                id: *id,
            })?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(conn).await.map_err(DaoLayerError::Db)
    }

    /// The user's live (reserved or active) reservation, if any. At most one
    /// exists; reserve() enforces that before creating another.
    pub async fn live_by_user(&self, user_id: &Uuid) -> DaoResult<Option<reservation::Model>> {
        let user_id = *user_id;
        self.find(1, 1, None, move |query| {
            query
                .filter(reservation::Column::UserId.eq(user_id))
                .filter(reservation::Column::Status.is_in(LIVE_STATUSES))
        })
        .await
        .map(|response| response.data.into_iter().next())
    }

    /// Live reservations referencing any of `spot_ids`.
    pub async fn list_live_for_spots(
        &self,
        spot_ids: &[Uuid],
    ) -> DaoResult<Vec<reservation::Model>> {
        if spot_ids.is_empty() {
            return Ok(Vec::new());
        }
        let spot_ids = spot_ids.to_vec();
        let mut pager = self.find_iter(None, None, move |query| {
            query
                .filter(reservation::Column::SpotId.is_in(spot_ids.clone()))
                .filter(reservation::Column::Status.is_in(LIVE_STATUSES))
        });
        let mut reservations = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            reservations.append(&mut response.data);
        }
        Ok(reservations)
    }

    /// Spot ids among `spot_ids` already held by a live reservation. The
    /// allocator filters these out on top of the stored spot status.
    pub async fn live_spot_ids(&self, spot_ids: &[Uuid]) -> DaoResult<Vec<Uuid>> {
        self.list_live_for_spots(spot_ids)
            .await
            .map(|models| models.into_iter().map(|model| model.spot_id).collect())
    }

    pub async fn list_live(&self) -> DaoResult<Vec<reservation::Model>> {
        let mut pager = self.find_iter(None, None, |query| {
            query.filter(reservation::Column::Status.is_in(LIVE_STATUSES))
        });
        let mut reservations = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            reservations.append(&mut response.data);
        }
        Ok(reservations)
    }

    pub async fn list_by_user(&self, user_id: &Uuid) -> DaoResult<Vec<reservation::Model>> {
        let user_id = *user_id;
        let mut pager = self.find_iter(
            None,
            Some((reservation::Column::CreatedAt, Order::Desc)),
            move |query| query.filter(reservation::Column::UserId.eq(user_id)),
        );
        let mut reservations = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            reservations.append(&mut response.data);
        }
        Ok(reservations)
    }

    pub async fn list_by_user_between(
        &self,
        user_id: &Uuid,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> DaoResult<Vec<reservation::Model>> {
        let user_id = *user_id;
        let mut pager = self.find_iter(
            None,
            Some((reservation::Column::CreatedAt, Order::Desc)),
            move |query| {
                query
                    .filter(reservation::Column::UserId.eq(user_id))
                    .filter(reservation::Column::CreatedAt.gte(start))
                    .filter(reservation::Column::CreatedAt.lt(end))
            },
        );
        let mut reservations = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            reservations.append(&mut response.data);
        }
        Ok(reservations)
    }

    pub async fn list_with_status(
        &self,
        status: ReservationStatus,
    ) -> DaoResult<Vec<reservation::Model>> {
        let mut pager = self.find_iter(None, None, move |query| {
            query.filter(reservation::Column::Status.eq(status.as_str()))
        });
        let mut reservations = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            reservations.append(&mut response.data);
        }
        Ok(reservations)
    }

    pub async fn count_total(&self) -> DaoResult<u64> {
        Reservation::find()
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn count_with_status(&self, status: ReservationStatus) -> DaoResult<u64> {
        Reservation::find()
            .filter(reservation::Column::Status.eq(status.as_str()))
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Ids of users who created a reservation at or after `cutoff`; the
    /// reminder job excludes them from its recipient list.
    pub async fn user_ids_with_reservations_since(
        &self,
        cutoff: DateTime<FixedOffset>,
    ) -> DaoResult<Vec<Uuid>> {
        let mut pager = self.find_iter(None, None, move |query| {
            query.filter(reservation::Column::CreatedAt.gte(cutoff))
        });
        let mut ids = Vec::new();
        while let Some(response) = pager.next_page().await? {
            ids.extend(response.data.into_iter().map(|model| model.user_id));
        }
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
