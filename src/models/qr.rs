//! Scan-to-pay QR payloads.
//!
//! Vendors display a code whose text is
//! `Campuspay::"<vendorId>,amt:<amount>,tid:<txid>"`. The payload itself
//! carries no authority: the `tid` must match an intent the server issued,
//! and that intent can be verified exactly once.

use crate::models::{Amount, AmountError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

pub const QR_PREFIX: &str = "Campuspay::";
const AMOUNT_TAG: &str = "amt:";
const TID_TAG: &str = "tid:";
const TID_MIN_LEN: usize = 6;
const TID_MAX_LEN: usize = 64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QrError {
    #[error("payload does not start with Campuspay::")]
    MissingPrefix,

    #[error("payload body must be enclosed in double quotes")]
    Unquoted,

    #[error("payload must have exactly three fields, found {0}")]
    FieldCount(usize),

    #[error("invalid vendor id: {0}")]
    InvalidVendor(String),

    #[error("missing or malformed amount field")]
    MissingAmount,

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("missing or malformed tid field")]
    MissingTid,

    #[error("tid must be 6-64 alphanumeric characters")]
    InvalidTid,

    #[error("payload does not match the issued QR code")]
    Tampered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPayload {
    pub vendor_id: Uuid,
    pub amount: Amount,
    pub tid: String,
}

impl QrPayload {
    pub fn parse(raw: &str) -> Result<Self, QrError> {
        let body = raw
            .trim()
            .strip_prefix(QR_PREFIX)
            .ok_or(QrError::MissingPrefix)?;

        let inner = body
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .ok_or(QrError::Unquoted)?;
        if inner.contains('"') {
            return Err(QrError::Unquoted);
        }

        let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
        let [vendor, amount, tid] = fields.as_slice() else {
            return Err(QrError::FieldCount(fields.len()));
        };

        let vendor_id = Uuid::parse_str(vendor)
            .map_err(|_| QrError::InvalidVendor(vendor.to_string()))?;

        let amount: Amount = amount
            .strip_prefix(AMOUNT_TAG)
            .ok_or(QrError::MissingAmount)?
            .parse()?;
        if amount.is_zero() {
            return Err(QrError::ZeroAmount);
        }

        let tid = tid.strip_prefix(TID_TAG).ok_or(QrError::MissingTid)?;
        if !is_valid_tid(tid) {
            return Err(QrError::InvalidTid);
        }

        Ok(Self {
            vendor_id,
            amount,
            tid: tid.to_string(),
        })
    }
}

pub fn is_valid_tid(tid: &str) -> bool {
    (TID_MIN_LEN..=TID_MAX_LEN).contains(&tid.len())
        && tid.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl FromStr for QrPayload {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for QrPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\"{},{}{},{}{}\"",
            QR_PREFIX, self.vendor_id, AMOUNT_TAG, self.amount, TID_TAG, self.tid
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum QrState {
    Issued,
    Verified {
        payer: Uuid,
        verified_at: DateTime<Utc>,
    },
    Paid {
        payer: Uuid,
        transaction_id: Uuid,
        paid_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrIntent {
    pub tid: String,
    pub vendor_id: Uuid,
    pub amount: Amount,
    pub state: QrState,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl QrIntent {
    pub fn payload(&self) -> QrPayload {
        QrPayload {
            vendor_id: self.vendor_id,
            amount: self.amount,
            tid: self.tid.clone(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_paid(&self) -> bool {
        matches!(self.state, QrState::Paid { .. })
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateQrRequest {
    pub amount: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratedQr {
    pub tid: String,
    pub payload: String,
    pub amount: Amount,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyQrRequest {
    pub payload: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifiedQr {
    pub tid: String,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub amount: Amount,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PayQrRequest {
    pub tid: String,
    pub mpin: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VENDOR: &str = "6f1c2e2a-8a47-4e55-9a7b-0c5d3f1e2b44";

    #[test]
    fn parses_canonical_payload() {
        let raw = format!("Campuspay::\"{VENDOR},amt:120.50,tid:TXN8F3A2B1C\"");
        let payload = QrPayload::parse(&raw).unwrap();

        assert_eq!(payload.vendor_id.to_string(), VENDOR);
        assert_eq!(payload.amount, Amount::from_paise(12_050));
        assert_eq!(payload.tid, "TXN8F3A2B1C");
        assert_eq!(payload.to_string(), raw);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let raw = format!("  Campuspay::\"{VENDOR}, amt:5, tid:ABCDEF\"\n");
        let payload = QrPayload::parse(&raw).unwrap();
        assert_eq!(payload.amount, Amount::from_paise(500));
    }

    #[test]
    fn rejects_malformed_payloads() {
        let cases = [
            (format!("Paytm::\"{VENDOR},amt:5,tid:ABCDEF\""), QrError::MissingPrefix),
            (format!("Campuspay::{VENDOR},amt:5,tid:ABCDEF"), QrError::Unquoted),
            (format!("Campuspay::\"{VENDOR},amt:5\""), QrError::FieldCount(2)),
            (format!("Campuspay::\"{VENDOR},amt:5,tid:ABCDEF,x\""), QrError::FieldCount(4)),
            (
                "Campuspay::\"vendor-1,amt:5,tid:ABCDEF\"".to_string(),
                QrError::InvalidVendor("vendor-1".into()),
            ),
            (format!("Campuspay::\"{VENDOR},amount:5,tid:ABCDEF\""), QrError::MissingAmount),
            (format!("Campuspay::\"{VENDOR},amt:0,tid:ABCDEF\""), QrError::ZeroAmount),
            (format!("Campuspay::\"{VENDOR},amt:5,txid:ABCDEF\""), QrError::MissingTid),
            (format!("Campuspay::\"{VENDOR},amt:5,tid:AB\""), QrError::InvalidTid),
            (format!("Campuspay::\"{VENDOR},amt:5,tid:ABC-DEF\""), QrError::InvalidTid),
        ];

        for (raw, expected) in cases {
            assert_eq!(QrPayload::parse(&raw), Err(expected), "{raw}");
        }

        assert!(matches!(
            QrPayload::parse(&format!("Campuspay::\"{VENDOR},amt:1.234,tid:ABCDEF\"")),
            Err(QrError::InvalidAmount(_))
        ));
    }

    #[test]
    fn intent_state_serializes_with_tag() {
        let state = QrState::Issued;
        assert_eq!(serde_json::to_value(&state).unwrap()["state"], "issued");
    }
}
