use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub redis: bool,
    pub store_persistent: bool,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PaymentStats {
    pub payments_total: u64,
    pub payments_failed: u64,
    pub volume_paise: u64,
    pub payments_today: u64,
    pub uptime_seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserCounts {
    pub students: u64,
    pub vendors: u64,
    pub admins: u64,
    pub sub_admins: u64,
    pub frozen: u64,
    pub suspended: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DashboardStats {
    pub users: UserCounts,
    pub wallet_float: crate::models::Amount,
    pub transactions: u64,
    pub pending_redeems: u64,
    pub pending_kyc: u64,
    pub open_complaints: u64,
    pub payments: PaymentStats,
}
