use crate::models::{Amount, QrError};
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type Result<T, E = CampusPayError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CampusPayError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Account is frozen: {0}")]
    AccountFrozen(Uuid),

    #[error("Account is suspended")]
    AccountSuspended,

    #[error("KYC verification required")]
    KycRequired,

    #[error("Insufficient balance: {available} < {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },

    #[error("Invalid MPIN, {remaining} attempt(s) remaining")]
    InvalidMpin { remaining: u32 },

    #[error("MPIN locked after too many failed attempts")]
    MpinLocked,

    #[error("MPIN has not been set")]
    MpinNotSet,

    #[error("Invalid QR code: {0}")]
    InvalidQr(#[from] QrError),

    #[error("QR code already used: {0}")]
    QrAlreadyUsed(String),

    #[error("QR code expired: {0}")]
    QrExpired(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl CampusPayError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            CampusPayError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            CampusPayError::InvalidQr(_) => (StatusCode::BAD_REQUEST, "INVALID_QR"),
            CampusPayError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            CampusPayError::InvalidMpin { .. } => (StatusCode::UNAUTHORIZED, "INVALID_MPIN"),
            CampusPayError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            CampusPayError::AccountFrozen(_) => (StatusCode::FORBIDDEN, "ACCOUNT_FROZEN"),
            CampusPayError::AccountSuspended => (StatusCode::FORBIDDEN, "ACCOUNT_SUSPENDED"),
            CampusPayError::KycRequired => (StatusCode::FORBIDDEN, "KYC_REQUIRED"),
            CampusPayError::MpinNotSet => (StatusCode::FORBIDDEN, "MPIN_NOT_SET"),
            CampusPayError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            CampusPayError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            CampusPayError::QrAlreadyUsed(_) => (StatusCode::CONFLICT, "QR_ALREADY_USED"),
            CampusPayError::QrExpired(_) => (StatusCode::GONE, "QR_EXPIRED"),
            CampusPayError::InsufficientBalance { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_BALANCE")
            }
            CampusPayError::MpinLocked => (StatusCode::LOCKED, "MPIN_LOCKED"),
            CampusPayError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
            CampusPayError::CacheError(_) | CampusPayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

// Malformed bodies, paths and query strings are client errors like any
// other validation failure, and get the same envelope.
impl From<JsonRejection> for CampusPayError {
    fn from(rejection: JsonRejection) -> Self {
        CampusPayError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for CampusPayError {
    fn from(rejection: PathRejection) -> Self {
        CampusPayError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for CampusPayError {
    fn from(rejection: QueryRejection) -> Self {
        CampusPayError::Validation(rejection.body_text())
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for CampusPayError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status, error_code) = self.status_and_code();

        // Internal details stay in the logs.
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        if status.is_server_error() {
            tracing::error!(
                error = ?self,
                error_code = error_code,
                request_id = %request_id,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error = %self,
                error_code = error_code,
                request_id = %request_id,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            success: false,
            error,
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let cases = [
            (CampusPayError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (CampusPayError::QrAlreadyUsed("TID1".into()), StatusCode::CONFLICT),
            (CampusPayError::QrExpired("TID1".into()), StatusCode::GONE),
            (CampusPayError::MpinLocked, StatusCode::LOCKED),
            (
                CampusPayError::InsufficientBalance {
                    available: Amount::from_paise(100),
                    requested: Amount::from_paise(200),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CampusPayError::CacheError("redis".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (CampusPayError::RateLimitExceeded, StatusCode::TOO_MANY_REQUESTS),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_and_code().0, expected, "{error}");
        }
    }

    #[test]
    fn response_carries_error_code() {
        let response = CampusPayError::AccountSuspended.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
