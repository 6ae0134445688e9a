//! Single-use QR payment intents.
//!
//! A vendor issues an intent; one student verifies it (`issued` ->
//! `verified`); the same student pays it (`verified` -> `paid`). Each step is
//! a conditional update inside one store write, so two concurrent scans of
//! the same code cannot both succeed.

use crate::{
    error::{CampusPayError, Result},
    models::{
        Amount, GeneratedQr, QrError, QrIntent, QrPayload, QrState, Role, Transaction,
        TransactionKind, VerifiedQr,
    },
    services::{wallet::{new_reference, post_transfer}, Analytics, AuthService, Store},
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct QrService {
    store: Arc<Store>,
    auth: Arc<AuthService>,
    analytics: Arc<Analytics>,
    ttl: ChronoDuration,
}

impl QrService {
    pub fn new(
        store: Arc<Store>,
        auth: Arc<AuthService>,
        analytics: Arc<Analytics>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            auth,
            analytics,
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::minutes(5)),
        }
    }

    pub async fn issue(&self, vendor_id: Uuid, amount: Amount) -> Result<GeneratedQr> {
        if amount.is_zero() {
            return Err(CampusPayError::Validation("amount must be greater than zero".to_string()));
        }

        let now = Utc::now();
        let expires_at = now + self.ttl;

        let intent = self
            .store
            .write(|db| {
                let vendor = db
                    .users
                    .get(&vendor_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("vendor {}", vendor_id)))?;
                if vendor.role != Role::Vendor {
                    return Err(CampusPayError::Forbidden(
                        "only vendors can generate payment QR codes".to_string(),
                    ));
                }
                if !vendor.is_kyc_verified() {
                    return Err(CampusPayError::KycRequired);
                }
                if vendor.is_suspended {
                    return Err(CampusPayError::AccountSuspended);
                }
                if vendor.is_frozen {
                    return Err(CampusPayError::AccountFrozen(vendor_id));
                }

                let mut tid = new_reference("CP");
                while db.qr_intents.contains_key(&tid) {
                    tid = new_reference("CP");
                }

                let intent = QrIntent {
                    tid: tid.clone(),
                    vendor_id,
                    amount,
                    state: QrState::Issued,
                    created_at: now,
                    expires_at,
                };
                db.qr_intents.insert(tid, intent.clone());
                Ok(intent)
            })
            .await?;

        tracing::info!(tid = %intent.tid, vendor_id = %vendor_id, amount = %amount, "QR issued");

        Ok(GeneratedQr {
            payload: intent.payload().to_string(),
            tid: intent.tid,
            amount: intent.amount,
            expires_at: intent.expires_at,
        })
    }

    /// Claims the QR code for `payer_id`. Succeeds at most once per tid.
    pub async fn verify(&self, payer_id: Uuid, raw_payload: &str) -> Result<VerifiedQr> {
        let payload = QrPayload::parse(raw_payload)?;
        let now = Utc::now();

        let verified = self
            .store
            .write(|db| {
                let payer = db
                    .users
                    .get(&payer_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("user {}", payer_id)))?;
                if payer.is_suspended {
                    return Err(CampusPayError::AccountSuspended);
                }
                if payer.is_frozen {
                    return Err(CampusPayError::AccountFrozen(payer_id));
                }

                let (vendor_name, vendor_active) = db
                    .users
                    .get(&payload.vendor_id)
                    .filter(|v| v.role == Role::Vendor)
                    .map(|v| (v.name.clone(), v.can_transact()))
                    .ok_or_else(|| {
                        CampusPayError::NotFound(format!("vendor {}", payload.vendor_id))
                    })?;

                let intent = db
                    .qr_intents
                    .get_mut(&payload.tid)
                    .ok_or_else(|| CampusPayError::NotFound(format!("QR code {}", payload.tid)))?;

                if intent.vendor_id != payload.vendor_id || intent.amount != payload.amount {
                    return Err(CampusPayError::InvalidQr(QrError::Tampered));
                }
                if intent.state != QrState::Issued {
                    return Err(CampusPayError::QrAlreadyUsed(payload.tid.clone()));
                }
                if intent.is_expired(now) {
                    return Err(CampusPayError::QrExpired(payload.tid.clone()));
                }
                if payer_id == intent.vendor_id {
                    return Err(CampusPayError::Validation("cannot pay yourself".to_string()));
                }
                if !vendor_active {
                    return Err(CampusPayError::AccountFrozen(intent.vendor_id));
                }

                intent.state = QrState::Verified {
                    payer: payer_id,
                    verified_at: now,
                };

                Ok(VerifiedQr {
                    tid: intent.tid.clone(),
                    vendor_id: intent.vendor_id,
                    vendor_name,
                    amount: intent.amount,
                    expires_at: intent.expires_at,
                })
            })
            .await?;

        tracing::info!(tid = %verified.tid, payer = %payer_id, "QR verified");
        Ok(verified)
    }

    /// Posts the payment for a QR code this payer has verified.
    pub async fn pay(&self, payer_id: Uuid, tid: &str, mpin: &str) -> Result<Transaction> {
        self.auth.verify_mpin(payer_id, mpin).await?;
        let now = Utc::now();

        let result = self
            .store
            .write(|db| {
                let intent = db
                    .qr_intents
                    .get(tid)
                    .ok_or_else(|| CampusPayError::NotFound(format!("QR code {}", tid)))?;

                match &intent.state {
                    QrState::Issued => {
                        return Err(CampusPayError::Validation(
                            "QR code must be verified before payment".to_string(),
                        ));
                    }
                    QrState::Verified { payer, .. } if *payer != payer_id => {
                        return Err(CampusPayError::QrAlreadyUsed(tid.to_string()));
                    }
                    QrState::Verified { .. } => {}
                    QrState::Paid { .. } => {
                        return Err(CampusPayError::QrAlreadyUsed(tid.to_string()));
                    }
                }
                if intent.is_expired(now) {
                    return Err(CampusPayError::QrExpired(tid.to_string()));
                }

                let (vendor_id, amount) = (intent.vendor_id, intent.amount);
                let tx = post_transfer(
                    db,
                    payer_id,
                    vendor_id,
                    amount,
                    TransactionKind::Payment,
                    tid.to_string(),
                    None,
                )?;

                if let Some(intent) = db.qr_intents.get_mut(tid) {
                    intent.state = QrState::Paid {
                        payer: payer_id,
                        transaction_id: tx.id,
                        paid_at: now,
                    };
                }
                Ok(tx)
            })
            .await;

        match &result {
            Ok(tx) => {
                tracing::info!(
                    tid = %tid,
                    payer = %payer_id,
                    vendor = ?tx.to,
                    amount = %tx.amount,
                    "QR payment posted"
                );
                self.analytics.record_payment(tx.amount, "payment").await;
            }
            Err(CampusPayError::InsufficientBalance { .. }) => {
                self.analytics.record_failure("payment").await;
            }
            Err(_) => {}
        }

        result
    }

    /// Drops intents that expired without being paid. Returns how many.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        self.store
            .write(|db| {
                let before = db.qr_intents.len();
                db.qr_intents
                    .retain(|_, intent| intent.is_paid() || !intent.is_expired(now));
                before - db.qr_intents.len()
            })
            .await
    }
}
