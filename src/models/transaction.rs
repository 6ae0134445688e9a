use crate::models::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// QR scan-to-pay.
    Payment,
    /// MPIN-confirmed wallet-to-wallet transfer without a QR.
    Transfer,
    /// Funds added by an administrator (top-up).
    Credit,
    /// Funds removed by an administrator.
    Debit,
    /// Vendor withdrawal to a bank account.
    Redeem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub reference: String,
    pub kind: TransactionKind,
    pub from: Option<Uuid>,
    pub to: Option<Uuid>,
    pub amount: Amount,
    pub status: TransactionStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        reference: String,
        kind: TransactionKind,
        from: Option<Uuid>,
        to: Option<Uuid>,
        amount: Amount,
        status: TransactionStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            reference,
            kind,
            from,
            to,
            amount,
            status,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn involves(&self, user: Uuid) -> bool {
        self.from == Some(user) || self.to == Some(user)
    }
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub to: Uuid,
    pub amount: Amount,
    pub mpin: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FundsRequest {
    pub amount: Amount,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Balance {
    pub user_id: Uuid,
    pub balance: Amount,
    pub is_frozen: bool,
}
