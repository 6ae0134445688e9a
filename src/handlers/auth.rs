use crate::{
    error::CampusPayError,
    handlers::{extract::Json, AppState},
    middleware::AuthUser,
    models::{
        ApiResponse, LoginRequest, LoginResponse, RegisterRequest, SetMpinRequest, UserProfile,
    },
};
use axum::extract::State;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    let profile = state.auth.register(req).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, CampusPayError> {
    let session = state.auth.login(req).await?;
    Ok(Json(ApiResponse::ok(session)))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    let profile = state.auth.profile(user.id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn set_mpin(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<SetMpinRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, CampusPayError> {
    state.auth.set_mpin(user.id, req).await?;
    let profile = state.auth.profile(user.id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
