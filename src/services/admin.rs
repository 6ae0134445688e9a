use crate::{
    error::{CampusPayError, Result},
    models::{
        Amount, ComplaintStatus, CreateSubAdminRequest, DashboardStats, KycStatus, RedeemStatus,
        Role, UserCounts, UserProfile,
    },
    services::{Analytics, AuthService, Store},
};
use std::sync::Arc;
use uuid::Uuid;

pub struct AdminService {
    store: Arc<Store>,
    auth: Arc<AuthService>,
    analytics: Arc<Analytics>,
}

impl AdminService {
    pub fn new(store: Arc<Store>, auth: Arc<AuthService>, analytics: Arc<Analytics>) -> Self {
        Self {
            store,
            auth,
            analytics,
        }
    }

    pub async fn list_users(&self, role: Option<Role>) -> Vec<UserProfile> {
        let mut users: Vec<UserProfile> = self
            .store
            .read(|db| {
                db.users
                    .values()
                    .filter(|u| role.map_or(true, |r| u.role == r))
                    .map(UserProfile::from)
                    .collect()
            })
            .await;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserProfile> {
        self.store
            .read(|db| db.users.get(&user_id).map(UserProfile::from))
            .await
            .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))
    }

    /// Freezing blocks money movement but still allows login.
    pub async fn set_frozen(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        frozen: bool,
    ) -> Result<UserProfile> {
        let profile = self
            .store
            .write(|db| {
                let user = db
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))?;
                if user.role.is_staff() {
                    return Err(CampusPayError::Forbidden(
                        "staff accounts cannot be frozen".to_string(),
                    ));
                }
                user.is_frozen = frozen;
                user.touch();
                Ok(UserProfile::from(&*user))
            })
            .await?;

        tracing::info!(user_id = %user_id, actor_id = %actor_id, frozen, "Account freeze updated");
        Ok(profile)
    }

    /// Suspended accounts can neither log in nor transact.
    pub async fn set_suspended(
        &self,
        actor_id: Uuid,
        user_id: Uuid,
        suspended: bool,
    ) -> Result<UserProfile> {
        if actor_id == user_id {
            return Err(CampusPayError::Forbidden(
                "cannot suspend your own account".to_string(),
            ));
        }

        let profile = self
            .store
            .write(|db| {
                let user = db
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))?;
                if user.role == Role::Admin {
                    return Err(CampusPayError::Forbidden(
                        "admin accounts cannot be suspended".to_string(),
                    ));
                }
                user.is_suspended = suspended;
                user.touch();
                Ok(UserProfile::from(&*user))
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            actor_id = %actor_id,
            suspended,
            "Account suspension updated"
        );
        Ok(profile)
    }

    pub async fn create_sub_admin(
        &self,
        actor_id: Uuid,
        req: CreateSubAdminRequest,
    ) -> Result<UserProfile> {
        let user = self
            .auth
            .create_user(req.name, req.email, None, Role::SubAdmin, req.password)
            .await?;
        tracing::info!(user_id = %user.id, actor_id = %actor_id, "Sub-admin created");
        Ok(UserProfile::from(&user))
    }

    pub async fn dashboard_stats(&self) -> DashboardStats {
        let payments = self.analytics.get_stats().await;

        self.store
            .read(|db| {
                let mut users = UserCounts::default();
                let mut wallet_float = Amount::ZERO;
                let mut pending_kyc = 0;

                for user in db.users.values() {
                    match user.role {
                        Role::Student => users.students += 1,
                        Role::Vendor => users.vendors += 1,
                        Role::Admin => users.admins += 1,
                        Role::SubAdmin => users.sub_admins += 1,
                    }
                    users.frozen += u64::from(user.is_frozen);
                    users.suspended += u64::from(user.is_suspended);
                    pending_kyc += u64::from(user.kyc_status() == Some(KycStatus::Pending));
                    wallet_float = wallet_float
                        .checked_add(user.balance)
                        .unwrap_or(Amount::from_paise(u64::MAX));
                }

                DashboardStats {
                    users,
                    wallet_float,
                    transactions: db.transactions.len() as u64,
                    pending_redeems: db
                        .redeem_requests
                        .values()
                        .filter(|r| r.status == RedeemStatus::Pending)
                        .count() as u64,
                    pending_kyc,
                    open_complaints: db
                        .complaints
                        .values()
                        .filter(|c| c.status == ComplaintStatus::Open)
                        .count() as u64,
                    payments,
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, models::User, services::CacheService};

    struct Fixture {
        admin: AdminService,
        store: Arc<Store>,
        admin_id: Uuid,
        student_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let config = Config {
            password_iterations: 1_000,
            ..Config::default()
        };
        let store = Arc::new(Store::in_memory());
        let cache = Arc::new(CacheService::memory_only());
        let auth = Arc::new(AuthService::new(&config, store.clone(), cache.clone()));
        let analytics = Arc::new(Analytics::new(cache));

        let admin_user = User::new(
            "Root".into(),
            "root@campus.edu".into(),
            None,
            Role::Admin,
            "h".into(),
        );
        let mut student = User::new(
            "Asha".into(),
            "asha@campus.edu".into(),
            None,
            Role::Student,
            "h".into(),
        );
        student.balance = Amount::from_paise(12_345);
        let (admin_id, student_id) = (admin_user.id, student.id);
        store
            .write(|db| {
                db.users.insert(admin_id, admin_user);
                db.users.insert(student_id, student);
            })
            .await;

        Fixture {
            admin: AdminService::new(store.clone(), auth, analytics),
            store,
            admin_id,
            student_id,
        }
    }

    #[tokio::test]
    async fn freeze_and_suspend_toggle_flags() {
        let f = fixture().await;

        let frozen = f.admin.set_frozen(f.admin_id, f.student_id, true).await.unwrap();
        assert!(frozen.is_frozen);
        let suspended = f.admin.set_suspended(f.admin_id, f.student_id, true).await.unwrap();
        assert!(suspended.is_suspended);

        let thawed = f.admin.set_frozen(f.admin_id, f.student_id, false).await.unwrap();
        assert!(!thawed.is_frozen);
        assert!(f.store.read(|db| db.users[&f.student_id].is_suspended).await);
    }

    #[tokio::test]
    async fn staff_cannot_be_frozen_or_admins_suspended() {
        let f = fixture().await;
        assert!(matches!(
            f.admin.set_frozen(Uuid::new_v4(), f.admin_id, true).await,
            Err(CampusPayError::Forbidden(_))
        ));
        assert!(matches!(
            f.admin.set_suspended(f.admin_id, f.admin_id, true).await,
            Err(CampusPayError::Forbidden(_))
        ));
        assert!(matches!(
            f.admin.set_frozen(f.admin_id, Uuid::new_v4(), true).await,
            Err(CampusPayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sub_admins_are_listed_by_role() {
        let f = fixture().await;
        let created = f
            .admin
            .create_sub_admin(
                f.admin_id,
                CreateSubAdminRequest {
                    name: "Desk".into(),
                    email: "desk@campus.edu".into(),
                    password: "desk-password".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.role, Role::SubAdmin);

        let subs = f.admin.list_users(Some(Role::SubAdmin)).await;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].email, "desk@campus.edu");
        assert_eq!(f.admin.list_users(None).await.len(), 3);
    }

    #[tokio::test]
    async fn dashboard_counts_users_and_float() {
        let f = fixture().await;
        f.admin.set_frozen(f.admin_id, f.student_id, true).await.unwrap();

        let stats = f.admin.dashboard_stats().await;
        assert_eq!(stats.users.students, 1);
        assert_eq!(stats.users.admins, 1);
        assert_eq!(stats.users.frozen, 1);
        assert_eq!(stats.wallet_float, Amount::from_paise(12_345));
        assert_eq!(stats.pending_redeems, 0);
    }
}
