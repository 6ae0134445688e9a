use crate::{
    error::CampusPayError,
    handlers::{
        extract::{Json, Path, Query},
        AppState,
    },
    middleware::AuthUser,
    models::{
        ApiResponse, CreateSubAdminRequest, DashboardStats, FreezeRequest, FundsRequest,
        RoleFilter, Role, SuspendRequest, Transaction, UserProfile,
    },
};
use axum::extract::State;
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(filter): Query<RoleFilter>,
) -> Result<Json<ApiResponse<Vec<UserProfile>>>, CampusPayError> {
    user.require_staff()?;
    Ok(Json(ApiResponse::ok(state.admin.list_users(filter.role).await)))
}

pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    user.require_staff()?;
    Ok(Json(ApiResponse::ok(state.admin.get_user(id).await?)))
}

pub async fn freeze(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<FreezeRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    user.require_staff()?;
    let profile = state.admin.set_frozen(user.id, id, req.frozen).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn suspend(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SuspendRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    user.require(&[Role::Admin])?;
    let profile = state.admin.set_suspended(user.id, id, req.suspended).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn credit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<FundsRequest>,
) -> Result<Json<ApiResponse<Transaction>>, CampusPayError> {
    user.require(&[Role::Admin])?;
    let tx = state.wallet.credit(user.id, id, req.amount, req.note).await?;
    Ok(Json(ApiResponse::ok(tx)))
}

pub async fn debit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<FundsRequest>,
) -> Result<Json<ApiResponse<Transaction>>, CampusPayError> {
    user.require(&[Role::Admin])?;
    let tx = state.wallet.debit(user.id, id, req.amount, req.note).await?;
    Ok(Json(ApiResponse::ok(tx)))
}

pub async fn create_sub_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateSubAdminRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    user.require(&[Role::Admin])?;
    let profile = state.admin.create_sub_admin(user.id, req).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<DashboardStats>>, CampusPayError> {
    user.require_staff()?;
    Ok(Json(ApiResponse::ok(state.admin.dashboard_stats().await)))
}
