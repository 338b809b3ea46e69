use std::sync::Arc;

use axum::{Router, extract::State, routing::get};

use crate::{
    response::{ApiResult, JsonApiResponse},
    services::{ServiceContext, stats_service::PublicStats},
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(public_stats))
        .with_state(state)
}

async fn health() -> ApiResult<serde_json::Value> {
    JsonApiResponse::ok(serde_json::json!({ "status": "healthy" }))
}

async fn public_stats(State(state): State<Arc<AppState>>) -> ApiResult<PublicStats> {
    let service = ServiceContext::from_state(state.as_ref()).stats();
    let stats = service.public_stats().await?;
    JsonApiResponse::ok(stats)
}
