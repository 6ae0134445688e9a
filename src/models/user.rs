use crate::models::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Student,
    Vendor,
    Admin,
    SubAdmin,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::SubAdmin)
    }

    pub fn holds_wallet(self) -> bool {
        matches!(self, Role::Student | Role::Vendor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Student => "student",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
            Role::SubAdmin => "sub-admin",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Aadhaar,
    Pan,
    StudentId,
    DrivingLicense,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycRecord {
    pub status: KycStatus,
    pub document_type: DocumentType,
    pub document_number: String,
    /// Opaque handle to the uploaded document.
    pub document_ref: String,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub password_hash: String,
    pub mpin_hash: Option<String>,
    pub balance: Amount,
    pub is_frozen: bool,
    pub is_suspended: bool,
    pub kyc: Option<KycRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        email: String,
        phone: Option<String>,
        role: Role,
        password_hash: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            role,
            password_hash,
            mpin_hash: None,
            balance: Amount::ZERO,
            is_frozen: false,
            is_suspended: false,
            kyc: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kyc_status(&self) -> Option<KycStatus> {
        self.kyc.as_ref().map(|k| k.status)
    }

    pub fn is_kyc_verified(&self) -> bool {
        self.kyc_status() == Some(KycStatus::Verified)
    }

    /// Frozen or suspended accounts cannot move money.
    pub fn can_transact(&self) -> bool {
        !self.is_frozen && !self.is_suspended
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// User document without credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub balance: Amount,
    pub is_frozen: bool,
    pub is_suspended: bool,
    pub mpin_set: bool,
    pub kyc_status: Option<KycStatus>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            balance: user.balance,
            is_frozen: user.is_frozen,
            is_suspended: user.is_suspended,
            mpin_set: user.mpin_hash.is_some(),
            kyc_status: user.kyc_status(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingKyc {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub kyc: KycRecord,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct SetMpinRequest {
    pub password: String,
    pub mpin: String,
}

#[derive(Debug, Deserialize)]
pub struct KycSubmission {
    pub document_type: DocumentType,
    pub document_number: String,
    pub document_ref: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycDecision {
    Verified,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct KycStatusUpdate {
    pub user_id: Uuid,
    pub status: KycDecision,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubAdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct FreezeRequest {
    pub frozen: bool,
}

#[derive(Debug, Deserialize)]
pub struct SuspendRequest {
    pub suspended: bool,
}

#[derive(Debug, Deserialize)]
pub struct RoleFilter {
    pub role: Option<Role>,
}
