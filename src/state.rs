use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::JwtKeys, cache::ReadCache, config::AppConfig, jobs::JobQueue,
    services::lot_service::LotOverview,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub jwt: JwtKeys,
    pub lot_cache: ReadCache<Vec<LotOverview>>,
    pub jobs: JobQueue,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        jwt: JwtKeys,
        lot_cache: ReadCache<Vec<LotOverview>>,
        jobs: JobQueue,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            jwt,
            lot_cache,
            jobs,
        })
    }
}
