use crate::{
    error::{CampusPayError, Result},
    models::{NewNotification, Notification, Role},
    services::Store,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const MAX_TITLE_LEN: usize = 120;
const MAX_MESSAGE_LEN: usize = 2_000;

pub struct NotificationService {
    store: Arc<Store>,
}

impl NotificationService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn add(&self, author_id: Uuid, new: NewNotification) -> Result<Notification> {
        let title = new.title.trim().to_string();
        let message = new.message.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(CampusPayError::Validation(format!(
                "title must be 1-{} characters",
                MAX_TITLE_LEN
            )));
        }
        if message.is_empty() || message.chars().count() > MAX_MESSAGE_LEN {
            return Err(CampusPayError::Validation(format!(
                "message must be 1-{} characters",
                MAX_MESSAGE_LEN
            )));
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            title,
            message,
            audience: new.audience,
            created_by: author_id,
            created_at: Utc::now(),
        };

        self.store
            .write(|db| db.notifications.push(notification.clone()))
            .await;

        tracing::info!(
            notification_id = %notification.id,
            audience = ?notification.audience,
            "Notification published"
        );
        Ok(notification)
    }

    /// Every notification, newest first.
    pub async fn list_all(&self) -> Vec<Notification> {
        self.store
            .read(|db| db.notifications.iter().rev().cloned().collect())
            .await
    }

    /// Notifications addressed to `role`; staff see everything.
    pub async fn feed(&self, role: Role) -> Vec<Notification> {
        if role.is_staff() {
            return self.list_all().await;
        }
        self.store
            .read(|db| {
                db.notifications
                    .iter()
                    .rev()
                    .filter(|n| n.audience.reaches(role))
                    .cloned()
                    .collect()
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self
            .store
            .write(|db| {
                let before = db.notifications.len();
                db.notifications.retain(|n| n.id != id);
                before != db.notifications.len()
            })
            .await;

        if !removed {
            return Err(CampusPayError::NotFound(format!("notification {}", id)));
        }
        tracing::info!(notification_id = %id, "Notification deleted");
        Ok(())
    }
}
