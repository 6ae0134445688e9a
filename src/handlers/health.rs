use crate::{
    handlers::{extract::Json, AppState},
    models::HealthStatus,
};
use axum::extract::State;
use chrono::Utc;

pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let redis_ok = state.cache.ping().await.unwrap_or(false);

    // Redis is optional; without it counters live in process memory.
    let status = if redis_ok || !state.cache.has_redis() {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        redis: redis_ok,
        store_persistent: state.store.is_persistent(),
        uptime_seconds: state.analytics.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
