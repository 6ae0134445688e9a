use crate::{
    error::{CampusPayError, Result},
    models::{Complaint, ComplaintStatus, NewComplaint},
    services::Store,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const MAX_SUBJECT_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 2_000;
const MAX_RESPONSE_LEN: usize = 2_000;

fn required_text(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CampusPayError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(CampusPayError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

pub struct ComplaintService {
    store: Arc<Store>,
}

impl ComplaintService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn file(&self, user_id: Uuid, complaint: NewComplaint) -> Result<Complaint> {
        let subject = required_text("subject", &complaint.subject, MAX_SUBJECT_LEN)?;
        let description =
            required_text("description", &complaint.description, MAX_DESCRIPTION_LEN)?;
        let transaction_reference = complaint
            .transaction_reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let filed = self
            .store
            .write(|db| {
                if !db.users.contains_key(&user_id) {
                    return Err(CampusPayError::NotFound(format!("user {}", user_id)));
                }
                if let Some(reference) = &transaction_reference {
                    let known = db
                        .transactions
                        .iter()
                        .any(|t| &t.reference == reference && t.involves(user_id));
                    if !known {
                        return Err(CampusPayError::Validation(format!(
                            "unknown transaction reference: {}",
                            reference
                        )));
                    }
                }

                let now = Utc::now();
                let complaint = Complaint {
                    id: Uuid::new_v4(),
                    user_id,
                    subject,
                    description,
                    transaction_reference,
                    status: ComplaintStatus::Open,
                    response: None,
                    responded_by: None,
                    created_at: now,
                    updated_at: now,
                };
                db.complaints.insert(complaint.id, complaint.clone());
                Ok(complaint)
            })
            .await?;

        tracing::info!(complaint_id = %filed.id, user_id = %user_id, "Complaint filed");
        Ok(filed)
    }

    pub async fn respond(
        &self,
        reviewer_id: Uuid,
        complaint_id: Uuid,
        response: &str,
    ) -> Result<Complaint> {
        let response = required_text("response", response, MAX_RESPONSE_LEN)?;

        let resolved = self
            .store
            .write(|db| {
                let complaint = db
                    .complaints
                    .get_mut(&complaint_id)
                    .ok_or_else(|| {
                        CampusPayError::NotFound(format!("complaint {}", complaint_id))
                    })?;
                if complaint.status == ComplaintStatus::Resolved {
                    return Err(CampusPayError::Conflict(format!(
                        "complaint {} is already resolved",
                        complaint_id
                    )));
                }
                complaint.status = ComplaintStatus::Resolved;
                complaint.response = Some(response);
                complaint.responded_by = Some(reviewer_id);
                complaint.updated_at = Utc::now();
                Ok(complaint.clone())
            })
            .await?;

        tracing::info!(
            complaint_id = %complaint_id,
            reviewer_id = %reviewer_id,
            "Complaint resolved"
        );
        Ok(resolved)
    }

    pub async fn mine(&self, user_id: Uuid) -> Vec<Complaint> {
        self.list_where(|c| c.user_id == user_id).await
    }

    pub async fn list(&self, status: Option<ComplaintStatus>) -> Vec<Complaint> {
        self.list_where(|c| status.map_or(true, |s| c.status == s))
            .await
    }

    async fn list_where(&self, keep: impl Fn(&Complaint) -> bool) -> Vec<Complaint> {
        let mut complaints: Vec<Complaint> = self
            .store
            .read(|db| db.complaints.values().filter(|c| keep(c)).cloned().collect())
            .await;
        complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        complaints
    }
}
