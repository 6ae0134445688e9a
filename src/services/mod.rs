pub mod admin;
pub mod analytics;
pub mod auth;
pub mod cache;
pub mod complaints;
pub mod kyc;
pub mod notifications;
pub mod qr;
pub mod redeem;
pub mod store;
pub mod wallet;

pub use admin::AdminService;
pub use analytics::Analytics;
pub use auth::AuthService;
pub use cache::CacheService;
pub use complaints::ComplaintService;
pub use kyc::KycService;
pub use notifications::NotificationService;
pub use qr::QrService;
pub use redeem::RedeemService;
pub use store::Store;
pub use wallet::WalletService;
