use crate::{
    error::{CampusPayError, Result},
    models::{
        Amount, Balance, Transaction, TransactionKind, TransactionStatus, TransferRequest, User,
    },
    services::{store::Collections, Analytics, AuthService, Store},
};
use rand::RngCore;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 500;
const MAX_NOTE_LEN: usize = 200;

/// Random uppercase reference such as `TXN9F2C4A01B7E3`.
pub fn new_reference(prefix: &str) -> String {
    let mut bytes = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}{}", prefix, hex::encode_upper(bytes))
}

fn ensure_active(user: &User) -> Result<()> {
    if user.is_suspended {
        return Err(CampusPayError::AccountSuspended);
    }
    if user.is_frozen {
        return Err(CampusPayError::AccountFrozen(user.id));
    }
    Ok(())
}

fn clean_note(note: Option<String>) -> Result<Option<String>> {
    let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if let Some(n) = &note {
        if n.chars().count() > MAX_NOTE_LEN {
            return Err(CampusPayError::Validation(format!(
                "note must be at most {} characters",
                MAX_NOTE_LEN
            )));
        }
    }
    Ok(note)
}

/// Moves `amount` from `payer` to `payee` inside an open write transaction.
///
/// A shortfall appends a FAILED ledger entry before returning the error, so
/// callers must keep the store marked dirty even on failure.
pub(crate) fn post_transfer(
    db: &mut Collections,
    payer_id: Uuid,
    payee_id: Uuid,
    amount: Amount,
    kind: TransactionKind,
    reference: String,
    note: Option<String>,
) -> Result<Transaction> {
    if amount.is_zero() {
        return Err(CampusPayError::Validation("amount must be greater than zero".to_string()));
    }
    if payer_id == payee_id {
        return Err(CampusPayError::Validation("cannot pay yourself".to_string()));
    }

    let payer = db
        .users
        .get(&payer_id)
        .ok_or_else(|| CampusPayError::NotFound(format!("user {}", payer_id)))?;
    let payee = db
        .users
        .get(&payee_id)
        .ok_or_else(|| CampusPayError::NotFound(format!("recipient {}", payee_id)))?;

    if !payer.role.holds_wallet() {
        return Err(CampusPayError::Forbidden(format!("{} accounts have no wallet", payer.role)));
    }
    if !payee.role.holds_wallet() {
        return Err(CampusPayError::Validation(format!(
            "cannot pay a {} account",
            payee.role
        )));
    }
    ensure_active(payer)?;
    ensure_active(payee)?;

    let available = payer.balance;
    let new_payee_balance = payee
        .balance
        .checked_add(amount)
        .ok_or_else(|| CampusPayError::Validation("recipient balance would overflow".to_string()))?;

    let Some(new_payer_balance) = available.checked_sub(amount) else {
        let mut failed = Transaction::new(
            reference,
            kind,
            Some(payer_id),
            Some(payee_id),
            amount,
            TransactionStatus::Failed,
        )
        .with_note("insufficient balance");
        if let Some(note) = note {
            failed.note = Some(format!("insufficient balance; {}", note));
        }
        db.transactions.push(failed);
        return Err(CampusPayError::InsufficientBalance {
            available,
            requested: amount,
        });
    };

    if let Some(payer) = db.users.get_mut(&payer_id) {
        payer.balance = new_payer_balance;
        payer.touch();
    }
    if let Some(payee) = db.users.get_mut(&payee_id) {
        payee.balance = new_payee_balance;
        payee.touch();
    }

    let mut tx = Transaction::new(
        reference,
        kind,
        Some(payer_id),
        Some(payee_id),
        amount,
        TransactionStatus::Success,
    );
    tx.note = note;
    db.transactions.push(tx.clone());
    Ok(tx)
}

pub struct WalletService {
    store: Arc<Store>,
    auth: Arc<AuthService>,
    analytics: Arc<Analytics>,
}

impl WalletService {
    pub fn new(store: Arc<Store>, auth: Arc<AuthService>, analytics: Arc<Analytics>) -> Self {
        Self {
            store,
            auth,
            analytics,
        }
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<Balance> {
        self.store
            .read(|db| {
                db.users.get(&user_id).map(|u| Balance {
                    user_id: u.id,
                    balance: u.balance,
                    is_frozen: u.is_frozen,
                })
            })
            .await
            .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))
    }

    /// Ledger entries touching `user_id`, newest first.
    pub async fn history(&self, user_id: Uuid, limit: Option<usize>) -> Vec<Transaction> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        self.store
            .read(|db| {
                db.transactions
                    .iter()
                    .rev()
                    .filter(|t| t.involves(user_id))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .await
    }

    pub async fn direct_transfer(
        &self,
        payer_id: Uuid,
        req: TransferRequest,
    ) -> Result<Transaction> {
        let note = clean_note(req.note)?;
        if req.amount.is_zero() {
            return Err(CampusPayError::Validation("amount must be greater than zero".to_string()));
        }

        self.auth.verify_mpin(payer_id, &req.mpin).await?;

        let reference = new_reference("TRF");
        let result = self
            .store
            .write(|db| {
                post_transfer(
                    db,
                    payer_id,
                    req.to,
                    req.amount,
                    TransactionKind::Transfer,
                    reference,
                    note,
                )
            })
            .await;

        match &result {
            Ok(tx) => {
                tracing::info!(
                    reference = %tx.reference,
                    from = %payer_id,
                    to = %req.to,
                    amount = %tx.amount,
                    "Transfer posted"
                );
                self.analytics.record_payment(tx.amount, "transfer").await;
            }
            Err(CampusPayError::InsufficientBalance { .. }) => {
                self.analytics.record_failure("transfer").await;
            }
            Err(_) => {}
        }

        result
    }

    /// Admin top-up of a student or vendor wallet.
    pub async fn credit(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        amount: Amount,
        note: Option<String>,
    ) -> Result<Transaction> {
        self.adjust(admin_id, user_id, amount, note, TransactionKind::Credit)
            .await
    }

    pub async fn debit(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        amount: Amount,
        note: Option<String>,
    ) -> Result<Transaction> {
        self.adjust(admin_id, user_id, amount, note, TransactionKind::Debit)
            .await
    }

    async fn adjust(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        amount: Amount,
        note: Option<String>,
        kind: TransactionKind,
    ) -> Result<Transaction> {
        let note = clean_note(note)?;
        if amount.is_zero() {
            return Err(CampusPayError::Validation("amount must be greater than zero".to_string()));
        }

        let tx = self
            .store
            .write(|db| {
                let user = db
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))?;
                if !user.role.holds_wallet() {
                    return Err(CampusPayError::Validation(format!(
                        "{} accounts have no wallet",
                        user.role
                    )));
                }

                let (from, to, new_balance) = match kind {
                    TransactionKind::Credit => (
                        None,
                        Some(user_id),
                        user.balance.checked_add(amount).ok_or_else(|| {
                            CampusPayError::Validation("balance would overflow".to_string())
                        })?,
                    ),
                    _ => (
                        Some(user_id),
                        None,
                        user.balance.checked_sub(amount).ok_or(
                            CampusPayError::InsufficientBalance {
                                available: user.balance,
                                requested: amount,
                            },
                        )?,
                    ),
                };

                user.balance = new_balance;
                user.touch();

                let prefix = if kind == TransactionKind::Credit {
                    "CRD"
                } else {
                    "DBT"
                };
                let reference = new_reference(prefix);
                let mut tx = Transaction::new(
                    reference,
                    kind,
                    from,
                    to,
                    amount,
                    TransactionStatus::Success,
                );
                tx.note = Some(match note {
                    Some(note) => format!("by admin {}: {}", admin_id, note),
                    None => format!("by admin {}", admin_id),
                });
                db.transactions.push(tx.clone());
                Ok(tx)
            })
            .await?;

        tracing::info!(
            reference = %tx.reference,
            user_id = %user_id,
            admin_id = %admin_id,
            kind = ?kind,
            amount = %amount,
            "Wallet adjusted"
        );
        Ok(tx)
    }
}
