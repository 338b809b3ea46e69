use sea_orm::DatabaseConnection;

use super::{DaoBase, LotDao, RefreshTokenDao, ReservationDao, SpotDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn lot(&self) -> LotDao {
        DaoBase::new(&self.db)
    }

    pub fn spot(&self) -> SpotDao {
        DaoBase::new(&self.db)
    }

    pub fn reservation(&self) -> ReservationDao {
        DaoBase::new(&self.db)
    }

    pub fn refresh_token(&self) -> RefreshTokenDao {
        DaoBase::new(&self.db)
    }
}
