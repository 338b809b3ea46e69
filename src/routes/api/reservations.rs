use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post, put},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    cache::LOT_LISTING_KEY,
    db::entities::reservation,
    middleware::{AuthGuard, subject_id},
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        reservation_service::{Actor, ReservationService},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub lot_id: Uuid,
    pub vehicle_number: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub remark: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub spot_id: Uuid,
    pub vehicle_number: String,
    pub status: String,
    pub parking_timestamp: Option<DateTimeWithTimeZone>,
    pub leaving_timestamp: Option<DateTimeWithTimeZone>,
    pub total_hours: Option<f64>,
    pub parking_cost: Option<f64>,
    pub remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/reservations", post(reserve).get(history))
        .route("/reservations/{reservation_id}/park", put(park))
        .route("/reservations/{reservation_id}/release", put(release))
        .route("/reservations/{reservation_id}", delete(cancel))
        .with_state(state)
}

async fn reserve(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Json(body): Json<ReserveRequest>,
) -> ApiResult<ReservationResponse> {
    let user_id = subject_id(&claims)?;
    let service = reservation_service_from_state(state.as_ref());
    let created = service
        .reserve(&user_id, &body.lot_id, &body.vehicle_number)
        .await?;
    state.lot_cache.invalidate(LOT_LISTING_KEY).await;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", created.into())
}

async fn park(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(reservation_id): Path<Uuid>,
) -> ApiResult<ReservationResponse> {
    let actor = Actor::user(subject_id(&claims)?);
    let service = reservation_service_from_state(state.as_ref());
    let updated = service.park(&actor, &reservation_id).await?;
    state.lot_cache.invalidate(LOT_LISTING_KEY).await;
    JsonApiResponse::ok(updated.into())
}

async fn release(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(reservation_id): Path<Uuid>,
) -> ApiResult<ReservationResponse> {
    let actor = Actor::user(subject_id(&claims)?);
    let service = reservation_service_from_state(state.as_ref());
    let updated = service.release(&actor, &reservation_id).await?;
    state.lot_cache.invalidate(LOT_LISTING_KEY).await;
    JsonApiResponse::ok(updated.into())
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Path(reservation_id): Path<Uuid>,
    body: Option<Json<CancelRequest>>,
) -> ApiResult<ReservationResponse> {
    let actor = Actor::user(subject_id(&claims)?);
    let remark = body.and_then(|Json(body)| body.remark);
    let service = reservation_service_from_state(state.as_ref());
    let updated = service.cancel(&actor, &reservation_id, remark).await?;
    state.lot_cache.invalidate(LOT_LISTING_KEY).await;
    JsonApiResponse::ok(updated.into())
}

async fn history(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
) -> ApiResult<Vec<ReservationResponse>> {
    let user_id = subject_id(&claims)?;
    let service = reservation_service_from_state(state.as_ref());
    let reservations = service.history(&user_id).await?;
    JsonApiResponse::ok(
        reservations
            .into_iter()
            .map(ReservationResponse::from)
            .collect(),
    )
}

impl From<reservation::Model> for ReservationResponse {
    fn from(model: reservation::Model) -> Self {
        Self {
            id: model.id,
            spot_id: model.spot_id,
            vehicle_number: model.vehicle_number,
            status: model.status,
            parking_timestamp: model.parking_timestamp,
            leaving_timestamp: model.leaving_timestamp,
            total_hours: model.total_hours,
            parking_cost: model.parking_cost,
            remarks: model.remarks,
            created_at: model.created_at,
        }
    }
}

fn reservation_service_from_state(state: &AppState) -> ReservationService {
    ServiceContext::from_state(state).reservation()
}
