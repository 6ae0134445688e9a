use crate::{
    error::{CampusPayError, Result},
    models::{KycDecision, KycRecord, KycStatus, KycSubmission, PendingKyc, UserProfile},
    services::Store,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const MAX_DOCUMENT_REF_LEN: usize = 256;

pub struct KycService {
    store: Arc<Store>,
}

impl KycService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, user_id: Uuid, submission: KycSubmission) -> Result<UserProfile> {
        let document_number = submission.document_number.trim().to_uppercase();
        if !(4..=32).contains(&document_number.len())
            || !document_number.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(CampusPayError::Validation(
                "document number must be 4-32 alphanumeric characters".to_string(),
            ));
        }
        let document_ref = submission.document_ref.trim().to_string();
        if document_ref.is_empty() || document_ref.len() > MAX_DOCUMENT_REF_LEN {
            return Err(CampusPayError::Validation(
                "document reference is required".to_string(),
            ));
        }

        let profile = self
            .store
            .write(|db| {
                let user = db
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))?;
                if !user.role.holds_wallet() {
                    return Err(CampusPayError::Forbidden(
                        "staff accounts do not submit KYC".to_string(),
                    ));
                }
                match user.kyc_status() {
                    Some(KycStatus::Pending) => {
                        return Err(CampusPayError::Conflict(
                            "KYC is already awaiting review".to_string(),
                        ))
                    }
                    Some(KycStatus::Verified) => {
                        return Err(CampusPayError::Conflict("KYC is already verified".to_string()))
                    }
                    Some(KycStatus::Rejected) | None => {}
                }

                user.kyc = Some(KycRecord {
                    status: KycStatus::Pending,
                    document_type: submission.document_type,
                    document_number,
                    document_ref,
                    submitted_at: Utc::now(),
                    reviewed_by: None,
                    reviewed_at: None,
                    rejection_reason: None,
                });
                user.touch();
                Ok(UserProfile::from(&*user))
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            document_type = ?submission.document_type,
            "KYC submitted"
        );
        Ok(profile)
    }

    pub async fn update_status(
        &self,
        reviewer_id: Uuid,
        user_id: Uuid,
        decision: KycDecision,
        reason: Option<String>,
    ) -> Result<UserProfile> {
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if decision == KycDecision::Rejected && reason.is_none() {
            return Err(CampusPayError::Validation(
                "a reason is required when rejecting KYC".to_string(),
            ));
        }

        let profile = self
            .store
            .write(|db| {
                let user = db
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))?;
                let kyc = user
                    .kyc
                    .as_mut()
                    .ok_or_else(|| CampusPayError::NotFound(format!("KYC for user {}", user_id)))?;
                if kyc.status != KycStatus::Pending {
                    return Err(CampusPayError::Conflict(format!(
                        "KYC is already {:?}",
                        kyc.status
                    )));
                }

                kyc.status = match decision {
                    KycDecision::Verified => KycStatus::Verified,
                    KycDecision::Rejected => KycStatus::Rejected,
                };
                kyc.reviewed_by = Some(reviewer_id);
                kyc.reviewed_at = Some(Utc::now());
                kyc.rejection_reason = reason;
                user.touch();
                Ok(UserProfile::from(&*user))
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            reviewer_id = %reviewer_id,
            status = ?profile.kyc_status,
            "KYC reviewed"
        );
        Ok(profile)
    }

    /// Submissions awaiting review, oldest first.
    pub async fn pending(&self) -> Vec<PendingKyc> {
        let mut pending: Vec<PendingKyc> = self
            .store
            .read(|db| {
                db.users
                    .values()
                    .filter_map(|u| {
                        let kyc = u.kyc.as_ref().filter(|k| k.status == KycStatus::Pending)?;
                        Some(PendingKyc {
                            user_id: u.id,
                            name: u.name.clone(),
                            email: u.email.clone(),
                            role: u.role,
                            kyc: kyc.clone(),
                        })
                    })
                    .collect()
            })
            .await;
        pending.sort_by_key(|p| p.kyc.submitted_at);
        pending
    }
}
