use crate::models::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    All,
    Students,
    Vendors,
}

impl Audience {
    pub fn reaches(self, role: Role) -> bool {
        match self {
            Audience::All => true,
            Audience::Students => role == Role::Student,
            Audience::Vendors => role == Role::Vendor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub audience: Audience,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    #[serde(default = "default_audience")]
    pub audience: Audience,
}

fn default_audience() -> Audience {
    Audience::All
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_matches_roles() {
        assert!(Audience::All.reaches(Role::Vendor));
        assert!(Audience::Students.reaches(Role::Student));
        assert!(!Audience::Students.reaches(Role::Vendor));
        assert!(!Audience::Vendors.reaches(Role::Student));
    }
}
