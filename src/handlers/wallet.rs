use crate::{
    error::CampusPayError,
    handlers::{
        extract::{Json, Query},
        AppState,
    },
    middleware::AuthUser,
    models::{ApiResponse, Balance, HistoryQuery, Transaction},
};
use axum::extract::State;

pub async fn balance(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Balance>>, CampusPayError> {
    let balance = state.wallet.balance(user.id).await?;
    Ok(Json(ApiResponse::ok(balance)))
}

pub async fn transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, CampusPayError> {
    let history = state.wallet.history(user.id, query.limit).await;
    Ok(Json(ApiResponse::ok(history)))
}
