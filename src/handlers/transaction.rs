use crate::{
    error::CampusPayError,
    handlers::{extract::Json, AppState},
    middleware::AuthUser,
    models::{
        ApiResponse, GenerateQrRequest, GeneratedQr, PayQrRequest, Role, Transaction,
        TransferRequest, VerifiedQr, VerifyQrRequest,
    },
};
use axum::extract::State;

pub async fn generate_qr(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GenerateQrRequest>,
) -> Result<Json<ApiResponse<GeneratedQr>>, CampusPayError> {
    user.require(&[Role::Vendor])?;
    let qr = state.qr.issue(user.id, req.amount).await?;
    Ok(Json(ApiResponse::ok(qr)))
}

pub async fn verify_qr(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<VerifyQrRequest>,
) -> Result<Json<ApiResponse<VerifiedQr>>, CampusPayError> {
    user.require(&[Role::Student])?;
    let verified = state.qr.verify(user.id, &req.payload).await?;
    Ok(Json(ApiResponse::ok(verified)))
}

pub async fn pay(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<PayQrRequest>,
) -> Result<Json<ApiResponse<Transaction>>, CampusPayError> {
    user.require(&[Role::Student])?;
    let tx = state.qr.pay(user.id, req.tid.trim(), &req.mpin).await?;
    Ok(Json(ApiResponse::ok(tx)))
}

pub async fn transfer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<TransferRequest>,
) -> Result<Json<ApiResponse<Transaction>>, CampusPayError> {
    user.require(&[Role::Student, Role::Vendor])?;
    let tx = state.wallet.direct_transfer(user.id, req).await?;
    Ok(Json(ApiResponse::ok(tx)))
}
