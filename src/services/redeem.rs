use crate::{
    error::{CampusPayError, Result},
    models::{
        Amount, BankAccount, RedeemDecision, RedeemRequest, RedeemStatus, Role, Transaction,
        TransactionKind, TransactionStatus,
    },
    services::{wallet::new_reference, Store},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct RedeemService {
    store: Arc<Store>,
}

impl RedeemService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn request(
        &self,
        vendor_id: Uuid,
        amount: Amount,
        bank: BankAccount,
    ) -> Result<RedeemRequest> {
        if amount.is_zero() {
            return Err(CampusPayError::Validation("amount must be greater than zero".to_string()));
        }
        bank.validate().map_err(CampusPayError::Validation)?;

        let request = self
            .store
            .write(|db| {
                let vendor = db
                    .users
                    .get(&vendor_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("vendor {}", vendor_id)))?;
                if vendor.role != Role::Vendor {
                    return Err(CampusPayError::Forbidden(
                        "only vendors can redeem balance".to_string(),
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

                // Pending requests already spoken for count against the balance.
                let reserved = db
                    .redeem_requests
                    .values()
                    .filter(|r| r.vendor_id == vendor_id && r.status == RedeemStatus::Pending)
                    .try_fold(Amount::ZERO, |acc, r| acc.checked_add(r.amount))
                    .ok_or_else(|| CampusPayError::Validation("amount overflow".to_string()))?;
                let requested = reserved
                    .checked_add(amount)
                    .ok_or_else(|| CampusPayError::Validation("amount overflow".to_string()))?;
                if requested > vendor.balance {
                    return Err(CampusPayError::InsufficientBalance {
                        available: vendor.balance.checked_sub(reserved).unwrap_or(Amount::ZERO),
                        requested: amount,
                    });
                }

                let tx = Transaction::new(
                    new_reference("RDM"),
                    TransactionKind::Redeem,
                    Some(vendor_id),
                    None,
                    amount,
                    TransactionStatus::Pending,
                )
                .with_note(format!("to {}", bank.masked().account_number));

                let now = Utc::now();
                let request = RedeemRequest {
                    id: Uuid::new_v4(),
                    vendor_id,
                    amount,
                    bank,
                    status: RedeemStatus::Pending,
                    transaction_id: tx.id,
                    reviewed_by: None,
                    remarks: None,
                    created_at: now,
                    updated_at: now,
                };

                db.transactions.push(tx);
                db.redeem_requests.insert(request.id, request.clone());
                Ok(request)
            })
            .await?;

        tracing::info!(
            request_id = %request.id,
            vendor_id = %vendor_id,
            amount = %amount,
            "Redeem requested"
        );
        Ok(request)
    }

    pub async fn update_status(
        &self,
        admin_id: Uuid,
        request_id: Uuid,
        decision: RedeemDecision,
        remarks: Option<String>,
    ) -> Result<RedeemRequest> {
        let remarks = remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if decision == RedeemDecision::Rejected && remarks.is_none() {
            return Err(CampusPayError::Validation(
                "remarks are required when rejecting".to_string(),
            ));
        }

        let updated = self
            .store
            .write(|db| {
                let request = db
                    .redeem_requests
                    .get(&request_id)
                    .ok_or_else(|| {
                        CampusPayError::NotFound(format!("redeem request {}", request_id))
                    })?;
                if request.status != RedeemStatus::Pending {
                    return Err(CampusPayError::Conflict(format!(
                        "redeem request {} is already {:?}",
                        request_id, request.status
                    )));
                }
                let (vendor_id, amount, tx_id) =
                    (request.vendor_id, request.amount, request.transaction_id);

                let (status, tx_status) = match decision {
                    RedeemDecision::Approved => {
                        let vendor = db.users.get_mut(&vendor_id).ok_or_else(|| {
                            CampusPayError::NotFound(format!("vendor {}", vendor_id))
                        })?;
                        let remaining = vendor.balance.checked_sub(amount).ok_or(
                            CampusPayError::InsufficientBalance {
                                available: vendor.balance,
                                requested: amount,
                            },
                        )?;
                        vendor.balance = remaining;
                        vendor.touch();
                        (RedeemStatus::Approved, TransactionStatus::Success)
                    }
                    RedeemDecision::Rejected => (RedeemStatus::Rejected, TransactionStatus::Failed),
                };

                if let Some(tx) = db.transaction_mut(tx_id) {
                    tx.status = tx_status;
                    tx.updated_at = Utc::now();
                }

                let request = db
                    .redeem_requests
                    .get_mut(&request_id)
                    .ok_or_else(|| {
                        CampusPayError::NotFound(format!("redeem request {}", request_id))
                    })?;
                request.status = status;
                request.reviewed_by = Some(admin_id);
                request.remarks = remarks;
                request.updated_at = Utc::now();
                Ok(request.clone())
            })
            .await?;

        tracing::info!(
            request_id = %request_id,
            admin_id = %admin_id,
            status = ?updated.status,
            amount = %updated.amount,
            "Redeem request reviewed"
        );
        Ok(updated)
    }

    pub async fn list_for_vendor(&self, vendor_id: Uuid) -> Vec<RedeemRequest> {
        self.list_where(|r| r.vendor_id == vendor_id).await
    }

    pub async fn list(&self, status: Option<RedeemStatus>) -> Vec<RedeemRequest> {
        self.list_where(|r| status.map_or(true, |s| r.status == s))
            .await
    }

    async fn list_where(&self, keep: impl Fn(&RedeemRequest) -> bool) -> Vec<RedeemRequest> {
        let mut requests: Vec<RedeemRequest> = self
            .store
            .read(|db| db.redeem_requests.values().filter(|r| keep(r)).cloned().collect())
            .await;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentType, KycRecord, KycStatus, User};

    fn bank() -> BankAccount {
        BankAccount {
            account_holder: "Campus Canteen".into(),
            account_number: "123456789012".into(),
            ifsc: "SBIN0001234".into(),
        }
    }

    async fn setup(balance: u64, verified: bool) -> (RedeemService, Arc<Store>, Uuid) {
        let store = Arc::new(Store::in_memory());
        let mut vendor = User::new(
            "Canteen".into(),
            "canteen@campus.edu".into(),
            None,
            Role::Vendor,
            "hash".into(),
        );
        vendor.balance = Amount::from_paise(balance);
        if verified {
            vendor.kyc = Some(KycRecord {
                status: KycStatus::Verified,
                document_type: DocumentType::Pan,
                document_number: "ABCDE1234F".into(),
                document_ref: "kyc/canteen.pdf".into(),
                submitted_at: Utc::now(),
                reviewed_by: None,
                reviewed_at: None,
                rejection_reason: None,
            });
        }
        let id = vendor.id;
        store.write(|db| db.users.insert(id, vendor)).await;
        (RedeemService::new(store.clone()), store, id)
    }

    #[tokio::test]
    async fn pending_requests_reserve_balance() {
        let (redeem, _store, vendor) = setup(10_000, true).await;

        redeem.request(vendor, Amount::from_paise(6_000), bank()).await.unwrap();
        let second = redeem.request(vendor, Amount::from_paise(5_000), bank()).await;
        assert!(matches!(
            second,
            Err(CampusPayError::InsufficientBalance { available, .. })
                if available == Amount::from_paise(4_000)
        ));
        assert!(redeem.request(vendor, Amount::from_paise(4_000), bank()).await.is_ok());
    }

    #[tokio::test]
    async fn approval_debits_and_settles_transaction() {
        let (redeem, store, vendor) = setup(10_000, true).await;
        let admin = Uuid::new_v4();

        let request = redeem.request(vendor, Amount::from_paise(2_500), bank()).await.unwrap();
        let approved = redeem
            .update_status(admin, request.id, RedeemDecision::Approved, None)
            .await
            .unwrap();
        assert_eq!(approved.status, RedeemStatus::Approved);
        assert_eq!(approved.reviewed_by, Some(admin));

        let (balance, tx_status) = store
            .read(|db| {
                (
                    db.users[&vendor].balance,
                    db.transactions
                        .iter()
                        .find(|t| t.id == request.transaction_id)
                        .map(|t| t.status),
                )
            })
            .await;
        assert_eq!(balance, Amount::from_paise(7_500));
        assert_eq!(tx_status, Some(TransactionStatus::Success));

        let again = redeem
            .update_status(admin, request.id, RedeemDecision::Rejected, Some("dup".into()))
            .await;
        assert!(matches!(again, Err(CampusPayError::Conflict(_))));
    }

    #[tokio::test]
    async fn rejection_requires_remarks_and_keeps_balance() {
        let (redeem, store, vendor) = setup(10_000, true).await;
        let request = redeem.request(vendor, Amount::from_paise(2_500), bank()).await.unwrap();

        assert!(matches!(
            redeem
                .update_status(Uuid::new_v4(), request.id, RedeemDecision::Rejected, None)
                .await,
            Err(CampusPayError::Validation(_))
        ));

        let rejected = redeem
            .update_status(
                Uuid::new_v4(),
                request.id,
                RedeemDecision::Rejected,
                Some("bank details mismatch".into()),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, RedeemStatus::Rejected);
        assert_eq!(
            store.read(|db| db.users[&vendor].balance).await,
            Amount::from_paise(10_000)
        );
        assert!(redeem.list(Some(RedeemStatus::Pending)).await.is_empty());
        assert_eq!(redeem.list_for_vendor(vendor).await.len(), 1);
    }

    #[tokio::test]
    async fn unverified_vendor_cannot_redeem() {
        let (redeem, _store, vendor) = setup(10_000, false).await;
        assert!(matches!(
            redeem.request(vendor, Amount::from_paise(100), bank()).await,
            Err(CampusPayError::KycRequired)
        ));
    }
}
