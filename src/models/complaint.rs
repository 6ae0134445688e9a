use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    Open,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub description: String,
    pub transaction_reference: Option<String>,
    pub status: ComplaintStatus,
    pub response: Option<String>,
    pub responded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewComplaint {
    pub subject: String,
    pub description: String,
    pub transaction_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComplaintResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct ComplaintFilter {
    pub status: Option<ComplaintStatus>,
}
