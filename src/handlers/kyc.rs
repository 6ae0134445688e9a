use crate::{
    error::CampusPayError,
    handlers::{extract::Json, AppState},
    middleware::AuthUser,
    models::{ApiResponse, KycStatusUpdate, KycSubmission, PendingKyc, Role, UserProfile},
};
use axum::extract::State;

pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    Json(submission): Json<KycSubmission>,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    user.require(&[Role::Student, Role::Vendor])?;
    let profile = state.kyc.submit(user.id, submission).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn pending(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<PendingKyc>>>, CampusPayError> {
    user.require_staff()?;
    Ok(Json(ApiResponse::ok(state.kyc.pending().await)))
}

pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<KycStatusUpdate>,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    user.require_staff()?;
    let profile = state
        .kyc
        .update_status(user.id, update.user_id, update.status, update.reason)
        .await?;
    Ok(Json(ApiResponse::ok(profile)))
}
