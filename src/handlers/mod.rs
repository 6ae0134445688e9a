pub mod admin;
pub mod auth;
pub mod complaint;
pub mod dashboard;
pub mod extract;
pub mod health;
pub mod kyc;
pub mod notification;
pub mod redeem;
pub mod transaction;
pub mod wallet;

use crate::{
    config::Config,
    services::{
        AdminService, Analytics, AuthService, CacheService, ComplaintService, KycService,
        NotificationService, QrService, RedeemService, Store, WalletService,
    },
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<Store>,
    pub cache: Arc<CacheService>,
    pub analytics: Arc<Analytics>,
    pub auth: Arc<AuthService>,
    pub wallet: Arc<WalletService>,
    pub qr: Arc<QrService>,
    pub redeem: Arc<RedeemService>,
    pub kyc: Arc<KycService>,
    pub complaints: Arc<ComplaintService>,
    pub notifications: Arc<NotificationService>,
    pub admin: Arc<AdminService>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<Store>, cache: Arc<CacheService>) -> Self {
        let analytics = Arc::new(Analytics::new(cache.clone()));
        let auth = Arc::new(AuthService::new(&config, store.clone(), cache.clone()));
        let wallet = Arc::new(WalletService::new(
            store.clone(),
            auth.clone(),
            analytics.clone(),
        ));
        let qr = Arc::new(QrService::new(
            store.clone(),
            auth.clone(),
            analytics.clone(),
            config.qr_ttl,
        ));
        let admin = Arc::new(AdminService::new(
            store.clone(),
            auth.clone(),
            analytics.clone(),
        ));

        Self {
            redeem: Arc::new(RedeemService::new(store.clone())),
            kyc: Arc::new(KycService::new(store.clone())),
            complaints: Arc::new(ComplaintService::new(store.clone())),
            notifications: Arc::new(NotificationService::new(store.clone())),
            config: Arc::new(config),
            store,
            cache,
            analytics,
            auth,
            wallet,
            qr,
            admin,
        }
    }
}
