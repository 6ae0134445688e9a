pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    routing::{delete, get, post},
    Router,
};
use handlers::{
    admin, auth, complaint, dashboard, health, kyc, notification, redeem, transaction, wallet,
    AppState,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Full HTTP surface. Rate limiting is layered on separately in `main`
/// because it needs the peer address.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/mpin", post(auth::set_mpin))
        // Wallet
        .route("/wallet/balance", get(wallet::balance))
        .route("/wallet/transactions", get(wallet::transactions))
        // Payments
        .route("/transaction/generate-qr", post(transaction::generate_qr))
        .route("/transaction/verify-qr", post(transaction::verify_qr))
        .route("/transaction/pay", post(transaction::pay))
        .route("/transaction/transfer", post(transaction::transfer))
        // Redeem
        .route("/redeem/request", post(redeem::request))
        .route("/redeem/mine", get(redeem::mine))
        .route("/redeem/requests", get(redeem::list))
        .route("/redeem/update-status", post(redeem::update_status))
        // KYC
        .route("/kyc/submit", post(kyc::submit))
        .route("/kyc/pending", get(kyc::pending))
        .route("/kyc/update-status", post(kyc::update_status))
        // Complaints
        .route("/complaint", post(complaint::file))
        .route("/complaint/mine", get(complaint::mine))
        .route("/admin/complaints", get(complaint::list))
        .route("/admin/complaints/:id/respond", post(complaint::respond))
        // Notifications
        .route("/notifications", get(notification::feed))
        .route("/admin/notification/add", post(notification::add))
        .route("/admin/notifications", get(notification::list_all))
        .route("/admin/notification/:id", delete(notification::delete))
        // Administration
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id", get(admin::get_user))
        .route("/admin/users/:id/freeze", post(admin::freeze))
        .route("/admin/users/:id/suspend", post(admin::suspend))
        .route("/admin/users/:id/credit", post(admin::credit))
        .route("/admin/users/:id/debit", post(admin::debit))
        .route("/admin/sub-admins", post(admin::create_sub_admin))
        .route("/admin/stats", get(admin::stats))
        .route("/ws/admin/stats", get(dashboard::websocket_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
