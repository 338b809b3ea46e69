use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AdminRole,
    cache::LOT_LISTING_KEY,
    middleware::{AuthRoleGuard, subject_id},
    response::{ApiResult, JsonApiResponse},
    routes::api::{reservations::ReservationResponse, users::UserResponse},
    services::{
        ServiceContext,
        reservation_service::Actor,
        stats_service::{AdminAnalytics, SpotInconsistency},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, serde::Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub page: u64,
    pub page_size: u64,
    pub has_next: bool,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/{user_id}", patch(update_user))
        .route("/admin/analytics", get(analytics))
        .route("/admin/spots/inconsistent", get(inconsistent_spots))
        .route(
            "/admin/reservations/{reservation_id}/release",
            put(force_release),
        )
        .with_state(state)
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Query(query): Query<PageQuery>,
) -> ApiResult<UserListResponse> {
    let service = ServiceContext::from_state(state.as_ref()).user();
    let page = service.list_page(query.page, query.page_size).await?;
    JsonApiResponse::ok(UserListResponse {
        users: page.data.into_iter().map(UserResponse::from).collect(),
        page: page.page,
        page_size: page.page_size,
        has_next: page.has_next,
    })
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    let service = ServiceContext::from_state(state.as_ref()).user();
    let updated = service
        .update_account(&user_id, body.role, body.is_active)
        .await?;
    JsonApiResponse::ok(updated.into())
}

async fn analytics(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
) -> ApiResult<AdminAnalytics> {
    let service = ServiceContext::from_state(state.as_ref()).stats();
    let analytics = service.admin_analytics().await?;
    JsonApiResponse::ok(analytics)
}

/// Debug surface: spots whose stored status disagrees with the live
/// reservation view.
async fn inconsistent_spots(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
) -> ApiResult<Vec<SpotInconsistency>> {
    let service = ServiceContext::from_state(state.as_ref()).stats();
    let report = service.inconsistent_spots().await?;
    JsonApiResponse::ok(report)
}

/// Ownership-bypassing release for stale or disputed reservations.
async fn force_release(
    State(state): State<Arc<AppState>>,
    guard: AuthRoleGuard<AdminRole>,
    Path(reservation_id): Path<Uuid>,
) -> ApiResult<ReservationResponse> {
    let actor = Actor::admin(subject_id(&guard.claims)?);
    let service = ServiceContext::from_state(state.as_ref()).reservation();
    let updated = service.release(&actor, &reservation_id).await?;
    state.lot_cache.invalidate(LOT_LISTING_KEY).await;
    JsonApiResponse::ok(updated.into())
}
