use crate::{
    error::CampusPayError,
    handlers::{
        extract::{Json, Path, Query},
        AppState,
    },
    middleware::AuthUser,
    models::{ApiResponse, Complaint, ComplaintFilter, ComplaintResponse, NewComplaint, Role},
};
use axum::extract::State;
use uuid::Uuid;

pub async fn file(
    State(state): State<AppState>,
    user: AuthUser,
    Json(complaint): Json<NewComplaint>,
) -> Result<Json<ApiResponse<Complaint>>, CampusPayError> {
    user.require(&[Role::Student, Role::Vendor])?;
    let filed = state.complaints.file(user.id, complaint).await?;
    Ok(Json(ApiResponse::ok(filed)))
}

pub async fn mine(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Complaint>>>, CampusPayError> {
    user.require(&[Role::Student, Role::Vendor])?;
    Ok(Json(ApiResponse::ok(state.complaints.mine(user.id).await)))
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<ComplaintFilter>,
) -> Result<Json<ApiResponse<Vec<Complaint>>>, CampusPayError> {
    user.require_staff()?;
    Ok(Json(ApiResponse::ok(state.complaints.list(filter.status).await)))
}

pub async fn respond(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ComplaintResponse>,
) -> Result<Json<ApiResponse<Complaint>>, CampusPayError> {
    user.require_staff()?;
    let resolved = state.complaints.respond(user.id, id, &body.response).await?;
    Ok(Json(ApiResponse::ok(resolved)))
}
