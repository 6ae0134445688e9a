use crate::{
    error::{CampusPayError, Result},
    handlers::AppState,
    models::Role,
};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

/// Caller identity resolved from a `Bearer` token. The account is re-read
/// on every request so role changes and suspensions apply immediately.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(CampusPayError::Forbidden(format!(
                "{} accounts cannot use this endpoint",
                self.role
            )))
        }
    }

    pub fn require_staff(&self) -> Result<()> {
        self.require(&[Role::Admin, Role::SubAdmin])
    }
}

fn bearer_token(parts: &Parts) -> Result<&str> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| CampusPayError::Unauthorized("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| CampusPayError::Unauthorized("malformed Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CampusPayError::Unauthorized("expected a Bearer token".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = CampusPayError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)?;
        let claims = state.auth.decode_token(token)?;

        let account = state
            .store
            .read(|db| db.users.get(&claims.sub).map(|u| (u.role, u.is_suspended)))
            .await;

        match account {
            None => Err(CampusPayError::Unauthorized("account no longer exists".to_string())),
            Some((_, true)) => Err(CampusPayError::AccountSuspended),
            Some((role, false)) => Ok(AuthUser { id: claims.sub, role }),
        }
    }
}
