use crate::{
    models::{Amount, PaymentStats},
    services::CacheService,
};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DAILY_COUNTER_TTL: Duration = Duration::from_secs(2 * 86_400);

pub struct Analytics {
    cache: Arc<CacheService>,
    payments_total: AtomicU64,
    payments_failed: AtomicU64,
    volume_paise: AtomicU64,
    start_time: Instant,
}

impl Analytics {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self {
            cache,
            payments_total: AtomicU64::new(0),
            payments_failed: AtomicU64::new(0),
            volume_paise: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub async fn record_payment(&self, amount: Amount, kind: &str) {
        self.payments_total.fetch_add(1, Ordering::SeqCst);
        self.volume_paise.fetch_add(amount.paise(), Ordering::SeqCst);

        let date = Utc::now().format("%Y-%m-%d").to_string();

        let _ = self
            .cache
            .increment(&format!("analytics:payments:{}", date), 1, DAILY_COUNTER_TTL)
            .await;
        let _ = self
            .cache
            .increment(&format!("analytics:kind:{}:{}", kind, date), 1, DAILY_COUNTER_TTL)
            .await;

        tracing::info!(amount = %amount, kind, "Payment recorded");
    }

    pub async fn record_failure(&self, kind: &str) {
        self.payments_failed.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(kind, "Failed payment recorded");
    }

    pub async fn get_stats(&self) -> PaymentStats {
        let date = Utc::now().format("%Y-%m-%d").to_string();

        let payments_today = self
            .cache
            .counter(&format!("analytics:payments:{}", date))
            .await
            .unwrap_or(0)
            .max(0) as u64;

        PaymentStats {
            payments_total: self.payments_total.load(Ordering::SeqCst),
            payments_failed: self.payments_failed.load(Ordering::SeqCst),
            volume_paise: self.volume_paise.load(Ordering::SeqCst),
            payments_today,
            uptime_seconds: self.uptime_seconds(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_payments_and_volume() {
        let analytics = Analytics::new(Arc::new(CacheService::memory_only()));

        analytics.record_payment(Amount::from_paise(2_500), "payment").await;
        analytics.record_payment(Amount::from_paise(500), "transfer").await;
        analytics.record_failure("payment").await;

        let stats = analytics.get_stats().await;
        assert_eq!(stats.payments_total, 2);
        assert_eq!(stats.payments_failed, 1);
        assert_eq!(stats.volume_paise, 3_000);
        assert_eq!(stats.payments_today, 2);
    }
}
