use crate::{
    error::CampusPayError,
    handlers::{
        extract::{Json, Path},
        AppState,
    },
    middleware::AuthUser,
    models::{ApiResponse, NewNotification, Notification},
};
use axum::extract::State;
use serde_json::{json, Value};
use uuid::Uuid;

pub async fn add(
    State(state): State<AppState>,
    user: AuthUser,
    Json(new): Json<NewNotification>,
) -> Result<Json<ApiResponse<Notification>>, CampusPayError> {
    user.require_staff()?;
    let notification = state.notifications.add(user.id, new).await?;
    Ok(Json(ApiResponse::ok(notification)))
}

pub async fn list_all(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Notification>>>, CampusPayError> {
    user.require_staff()?;
    Ok(Json(ApiResponse::ok(state.notifications.list_all().await)))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, CampusPayError> {
    user.require_staff()?;
    state.notifications.delete(id).await?;
    Ok(Json(ApiResponse::ok(json!({ "deleted": id }))))
}

/// Feed for the signed-in user's role.
pub async fn feed(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Notification>>>, CampusPayError> {
    Ok(Json(ApiResponse::ok(state.notifications.feed(user.role).await)))
}
