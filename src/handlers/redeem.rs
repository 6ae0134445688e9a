use crate::{
    error::CampusPayError,
    handlers::{
        extract::{Json, Query},
        AppState,
    },
    middleware::AuthUser,
    models::{
        ApiResponse, CreateRedeemRequest, RedeemFilter, RedeemRequest, RedeemStatusUpdate, Role,
    },
};
use axum::extract::State;

pub async fn request(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateRedeemRequest>,
) -> Result<Json<ApiResponse<RedeemRequest>>, CampusPayError> {
    user.require(&[Role::Vendor])?;
    let created = state.redeem.request(user.id, req.amount, req.bank).await?;
    Ok(Json(ApiResponse::ok(created)))
}

pub async fn mine(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<RedeemRequest>>>, CampusPayError> {
    user.require(&[Role::Vendor])?;
    let requests = state.redeem.list_for_vendor(user.id).await;
    Ok(Json(ApiResponse::ok(requests)))
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<RedeemFilter>,
) -> Result<Json<ApiResponse<Vec<RedeemRequest>>>, CampusPayError> {
    user.require(&[Role::Admin])?;
    let requests = state.redeem.list(filter.status).await;
    Ok(Json(ApiResponse::ok(requests)))
}

pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(update): Json<RedeemStatusUpdate>,
) -> Result<Json<ApiResponse<RedeemRequest>>, CampusPayError> {
    user.require(&[Role::Admin])?;
    let updated = state
        .redeem
        .update_status(user.id, update.id, update.status, update.remarks)
        .await?;
    Ok(Json(ApiResponse::ok(updated)))
}
