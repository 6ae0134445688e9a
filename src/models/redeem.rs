use crate::models::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BankAccount {
    pub account_holder: String,
    pub account_number: String,
    pub ifsc: String,
}

impl BankAccount {
    pub fn validate(&self) -> Result<(), String> {
        if self.account_holder.trim().is_empty() {
            return Err("account holder is required".to_string());
        }
        let number_len = self.account_number.len();
        if !(9..=18).contains(&number_len)
            || !self.account_number.bytes().all(|b| b.is_ascii_digit())
        {
            return Err("account number must be 9 to 18 digits".to_string());
        }
        // Indian Financial System Code: 4 letters, a zero, 6 alphanumerics.
        let ifsc = self.ifsc.as_bytes();
        let valid_ifsc = ifsc.len() == 11
            && ifsc[..4].iter().all(|b| b.is_ascii_uppercase())
            && ifsc[4] == b'0'
            && ifsc[5..].iter().all(|b| b.is_ascii_alphanumeric());
        if !valid_ifsc {
            return Err(format!("invalid IFSC code: {}", self.ifsc));
        }
        Ok(())
    }

    /// Account number with all but the last four digits hidden.
    pub fn masked(&self) -> BankAccount {
        let visible = self.account_number.len().saturating_sub(4);
        let masked: String = self
            .account_number
            .chars()
            .enumerate()
            .map(|(i, c)| if i < visible { 'X' } else { c })
            .collect();
        BankAccount {
            account_holder: self.account_holder.clone(),
            account_number: masked,
            ifsc: self.ifsc.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedeemStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub amount: Amount,
    pub bank: BankAccount,
    pub status: RedeemStatus,
    pub transaction_id: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRedeemRequest {
    pub amount: Amount,
    pub bank: BankAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedeemDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct RedeemStatusUpdate {
    pub id: Uuid,
    pub status: RedeemDecision,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemFilter {
    pub status: Option<RedeemStatus>,
}
