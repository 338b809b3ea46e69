use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AdminRole,
    cache::LOT_LISTING_KEY,
    db::entities::parking_lot,
    middleware::AuthRoleGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        lot_service::{LotDetail, LotInput, LotOverview, LotPatch, LotService},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateLotRequest {
    pub prime_location_name: String,
    pub address: String,
    pub pin_code: String,
    pub hourly_rate: f64,
    pub number_of_spots: i32,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLotRequest {
    pub prime_location_name: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub hourly_rate: Option<f64>,
    pub number_of_spots: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lots", get(list_lots).post(create_lot))
        .route(
            "/lots/{lot_id}",
            get(lot_detail).patch(update_lot).delete(delete_lot),
        )
        .with_state(state)
}

/// Public listing, served through the read cache when warm.
async fn list_lots(State(state): State<Arc<AppState>>) -> ApiResult<Vec<LotOverview>> {
    if let Some(cached) = state.lot_cache.get(LOT_LISTING_KEY).await {
        return JsonApiResponse::ok((*cached).clone());
    }

    let service = lot_service_from_state(state.as_ref());
    let overview = service.list_overview().await?;
    let cached = state.lot_cache.insert(LOT_LISTING_KEY, overview).await;
    JsonApiResponse::ok((*cached).clone())
}

async fn lot_detail(
    State(state): State<Arc<AppState>>,
    Path(lot_id): Path<Uuid>,
) -> ApiResult<LotDetail> {
    let service = lot_service_from_state(state.as_ref());
    let detail = service.detail(&lot_id).await?;
    JsonApiResponse::ok(detail)
}

async fn create_lot(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Json(body): Json<CreateLotRequest>,
) -> ApiResult<parking_lot::Model> {
    let service = lot_service_from_state(state.as_ref());
    let lot = service
        .create_lot(LotInput {
            prime_location_name: body.prime_location_name,
            address: body.address,
            pin_code: body.pin_code,
            hourly_rate: body.hourly_rate,
            number_of_spots: body.number_of_spots,
            description: body.description,
            latitude: body.latitude,
            longitude: body.longitude,
        })
        .await?;
    state.lot_cache.invalidate(LOT_LISTING_KEY).await;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", lot)
}

async fn update_lot(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(lot_id): Path<Uuid>,
    Json(body): Json<UpdateLotRequest>,
) -> ApiResult<parking_lot::Model> {
    let service = lot_service_from_state(state.as_ref());
    let lot = service
        .update_lot(
            &lot_id,
            LotPatch {
                prime_location_name: body.prime_location_name,
                address: body.address,
                pin_code: body.pin_code,
                hourly_rate: body.hourly_rate,
                number_of_spots: body.number_of_spots,
                description: body.description,
                is_active: body.is_active,
            },
        )
        .await?;
    state.lot_cache.invalidate(LOT_LISTING_KEY).await;
    JsonApiResponse::ok(lot)
}

async fn delete_lot(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(lot_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let service = lot_service_from_state(state.as_ref());
    service.delete_lot(&lot_id).await?;
    state.lot_cache.invalidate(LOT_LISTING_KEY).await;
    JsonApiResponse::with_status(StatusCode::NO_CONTENT, "deleted", serde_json::Value::Null)
}

fn lot_service_from_state(state: &AppState) -> LotService {
    ServiceContext::from_state(state).lot()
}
