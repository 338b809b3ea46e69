use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::parking_spot;
use crate::db::entities::prelude::ParkingSpot;
use crate::parking::SpotStatus;

#[derive(Clone)]
pub struct SpotDao {
    db: DatabaseConnection,
}

impl DaoBase for SpotDao {
    type Entity = ParkingSpot;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl SpotDao {
    /// Creates `numbers.len()` spots for a lot in one insert, all available.
    pub async fn create_spots<C: ConnectionTrait>(
        &self,
        conn: &C,
        lot_id: &Uuid,
        numbers: &[String],
    ) -> DaoResult<()> {
        if numbers.is_empty() {
            return Ok(());
        }
        let now = Utc::now().fixed_offset();
        let models = numbers.iter().map(|number| parking_spot::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            lot_id: Set(*lot_id),
            spot_number: Set(number.clone()),
            status: Set(SpotStatus::Available.as_str().to_string()),
            is_active: Set(true),
        });
        ParkingSpot::insert_many(models)
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(())
    }

    /// Spots of a lot in insertion order (spot_number is zero-padded).
    pub async fn list_by_lot(&self, lot_id: &Uuid) -> DaoResult<Vec<parking_spot::Model>> {
        let lot_id = *lot_id;
        let mut pager = self.find_iter(
            None,
            Some((parking_spot::Column::SpotNumber, Order::Asc)),
            move |query| query.filter(parking_spot::Column::LotId.eq(lot_id)),
        );
        let mut spots = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            spots.append(&mut response.data);
        }
        Ok(spots)
    }

    /// Atomically claims a spot for a new reservation: flips
    /// available -> reserved only if the row still says available, and
    /// reports whether this caller won. Losing the race leaves no writes.
    pub async fn claim_spot<C: ConnectionTrait>(
        &self,
        conn: &C,
        spot_id: &Uuid,
    ) -> DaoResult<bool> {
        let result = ParkingSpot::update_many()
            .col_expr(
                parking_spot::Column::Status,
                Expr::value(SpotStatus::Reserved.as_str()),
            )
            .col_expr(
                parking_spot::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(parking_spot::Column::Id.eq(*spot_id))
            .filter(parking_spot::Column::Status.eq(SpotStatus::Available.as_str()))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected == 1)
    }

    pub async fn set_status<C: ConnectionTrait>(
        &self,
        conn: &C,
        spot_id: &Uuid,
        status: SpotStatus,
    ) -> DaoResult<()> {
        let result = ParkingSpot::update_many()
            .col_expr(parking_spot::Column::Status, Expr::value(status.as_str()))
            .col_expr(
                parking_spot::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(parking_spot::Column::Id.eq(*spot_id))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;

        if result.rows_affected == 0 {
            return Err(DaoLayerError::NotFound {
                entity: std::any::type_name::<ParkingSpot>(),
                id: *spot_id,
            });
        }
        Ok(())
    }

    pub async fn delete_spots<C: ConnectionTrait>(
        &self,
        conn: &C,
        spot_ids: &[Uuid],
    ) -> DaoResult<u64> {
        if spot_ids.is_empty() {
            return Ok(0);
        }
        let result = ParkingSpot::delete_many()
            .filter(parking_spot::Column::Id.is_in(spot_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }

    pub async fn count_with_status(&self, status: SpotStatus) -> DaoResult<u64> {
        ParkingSpot::find()
            .filter(parking_spot::Column::Status.eq(status.as_str()))
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn count_total(&self) -> DaoResult<u64> {
        ParkingSpot::find()
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn list_all(&self) -> DaoResult<Vec<parking_spot::Model>> {
        let mut pager = self.find_iter(None, None, |query| query);
        let mut spots = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            spots.append(&mut response.data);
        }
        Ok(spots)
    }

}
