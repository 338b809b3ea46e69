use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::api;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::public::router(state.clone()))
        .merge(api::auth::router(state.clone()))
        .merge(api::lots::router(state.clone()))
        .merge(api::reservations::router(state.clone()))
        .merge(api::users::router(state.clone()))
        .merge(api::admin::router(state.clone()))
        .merge(api::jobs::router(state))
}
