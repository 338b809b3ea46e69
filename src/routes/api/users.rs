use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::password,
    db::entities::user,
    error::AppError,
    middleware::{AuthGuard, subject_id},
    parking::stats::ReservationStats,
    response::{ApiResult, JsonApiResponse},
    services::{ServiceContext, user_service::ProfileUpdate},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub phone_number: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub last_login_at: Option<DateTimeWithTimeZone>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: UserResponse,
    pub statistics: ReservationStats,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/me", get(me).patch(update_me))
        .with_state(state)
}

/// Profile plus the dashboard statistics over the caller's reservations.
async fn me(State(state): State<Arc<AppState>>, claims: AuthGuard) -> ApiResult<DashboardResponse> {
    let user_id = subject_id(&claims)?;
    let services = ServiceContext::from_state(state.as_ref());
    let user = services.user().require(&user_id).await?;
    let statistics = services.stats().user_dashboard(&user_id).await?;
    JsonApiResponse::ok(DashboardResponse {
        user: user.into(),
        statistics,
    })
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    claims: AuthGuard,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<UserResponse> {
    let user_id = subject_id(&claims)?;
    let services = ServiceContext::from_state(state.as_ref());
    let service = services.user();

    if body.phone_number.is_none() && body.new_password.is_none() {
        return Err(AppError::bad_request("Nothing to update"));
    }

    // A password change re-authenticates against the current password.
    if let Some(new_password) = body.new_password.as_deref() {
        let current = body
            .current_password
            .as_deref()
            .ok_or_else(|| AppError::bad_request("Current password required"))?;
        let user = service.require(&user_id).await?;
        if !password::verify_password(current, &user.password_hash)? {
            return Err(AppError::unauthorized("Invalid credentials"));
        }
        if new_password == current {
            return Err(AppError::bad_request(
                "New password must differ from the current one",
            ));
        }
    }

    let updated = service
        .update_profile(
            &user_id,
            ProfileUpdate {
                phone_number: body.phone_number,
                new_password: body.new_password,
            },
        )
        .await?;
    JsonApiResponse::ok(updated.into())
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            phone_number: model.phone_number,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at,
            last_login_at: model.last_login_at,
        }
    }
}
