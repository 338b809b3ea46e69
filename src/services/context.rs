use sea_orm::DatabaseConnection;

use crate::{
    auth::JwtKeys,
    db::dao::DaoContext,
    services::{
        auth_service::AuthService, lot_service::LotService,
        reservation_service::ReservationService, stats_service::StatsService,
        user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    db: DatabaseConnection,
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            db: db.clone(),
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user())
    }

    pub fn auth(&self, jwt: &JwtKeys) -> AuthService {
        AuthService::new(self.user(), self.daos.refresh_token(), jwt.clone())
    }

    pub fn lot(&self) -> LotService {
        LotService::new(
            &self.db,
            self.daos.lot(),
            self.daos.spot(),
            self.daos.reservation(),
        )
    }

    pub fn reservation(&self) -> ReservationService {
        ReservationService::new(
            &self.db,
            self.daos.lot(),
            self.daos.spot(),
            self.daos.reservation(),
        )
    }

    pub fn stats(&self) -> StatsService {
        StatsService::new(
            self.daos.lot(),
            self.daos.spot(),
            self.daos.reservation(),
        )
    }
}
