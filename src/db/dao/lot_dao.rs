use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::parking_lot;
use crate::db::entities::prelude::ParkingLot;

#[derive(Clone)]
pub struct LotDao {
    db: DatabaseConnection,
}

impl DaoBase for LotDao {
    type Entity = ParkingLot;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub struct NewLot {
    pub prime_location_name: String,
    pub address: String,
    pub pin_code: String,
    pub hourly_rate: f64,
    pub number_of_spots: i32,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LotDao {
    /// Inserts a lot inside the caller's transaction so the lot row and its
    /// spot rows commit together.
    pub async fn insert_lot<C: ConnectionTrait>(
        &self,
        conn: &C,
        lot: NewLot,
    ) -> DaoResult<parking_lot::Model> {
        let now = Utc::now().fixed_offset();
        let model = parking_lot::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            updated_at: Set(now),
            prime_location_name: Set(lot.prime_location_name),
            address: Set(lot.address),
            pin_code: Set(lot.pin_code),
            hourly_rate: Set(lot.hourly_rate),
            number_of_spots: Set(lot.number_of_spots),
            description: Set(lot.description),
            latitude: Set(lot.latitude),
            longitude: Set(lot.longitude),
            is_active: Set(true),
        };
        model.insert(conn).await.map_err(DaoLayerError::Db)
    }

    /// Re-reads and mutates one lot inside the caller's transaction.
    pub async fn apply_update<C, F>(
        &self,
        conn: &C,
        id: &Uuid,
        apply: F,
    ) -> DaoResult<parking_lot::Model>
    where
        C: ConnectionTrait,
        F: for<'a> FnOnce(&'a mut parking_lot::ActiveModel) + Send,
    {
        let model = ParkingLot::find_by_id(*id)
            .one(conn)
            .await
            .map_err(DaoLayerError::Db)?
            .ok_or(DaoLayerError::NotFound {
                entity: std::any::type_name::<ParkingLot>(),
                id: *id,
            })?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.updated_at = Set(Utc::now().fixed_offset());
        active.update(conn).await.map_err(DaoLayerError::Db)
    }

    pub async fn list_lots(&self) -> DaoResult<Vec<parking_lot::Model>> {
        let mut pager = self.find_iter(
            None,
            Some((parking_lot::Column::CreatedAt, Order::Asc)),
            |query| query,
        );
        let mut lots = Vec::new();
        while let Some(mut response) = pager.next_page().await? {
            lots.append(&mut response.data);
        }
        Ok(lots)
    }

    pub async fn count(&self) -> DaoResult<u64> {
        ParkingLot::find()
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::db::entities::parking_lot;

    use super::{LotDao, NewLot};
    use crate::db::dao::DaoBase;

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn lot_model(id: Uuid, name: &str) -> parking_lot::Model {
        let now = ts();
        parking_lot::Model {
            id,
            created_at: now,
            updated_at: now,
            prime_location_name: name.to_string(),
            address: "123 Main Street".to_string(),
            pin_code: "560001".to_string(),
            hourly_rate: 10.0,
            number_of_spots: 5,
            description: None,
            latitude: None,
            longitude: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn insert_lot_returns_inserted_model() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[lot_model(id, "Downtown")]])
            .into_connection();
        let dao = LotDao::new(&db);

        let lot = dao
            .insert_lot(&db, NewLot {
                prime_location_name: "Downtown".to_string(),
                address: "123 Main Street".to_string(),
                pin_code: "560001".to_string(),
                hourly_rate: 10.0,
                number_of_spots: 5,
                description: None,
                latitude: None,
                longitude: None,
            })
            .await
            .expect("create should succeed");
        assert_eq!(lot.id, id);
        assert_eq!(lot.prime_location_name, "Downtown");
    }

    #[tokio::test]
    async fn list_lots_drains_the_pager() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                lot_model(Uuid::new_v4(), "Downtown"),
                lot_model(Uuid::new_v4(), "Mall"),
            ]])
            .into_connection();
        let dao = LotDao::new(&db);

        let lots = dao.list_lots().await.expect("query should succeed");
        assert_eq!(lots.len(), 2);
    }
}
