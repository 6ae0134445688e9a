use anyhow::Result;
use moka::{future::Cache, Expiry};
use redis::AsyncCommands;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Counter {
    ttl: Duration,
    value: AtomicI64,
}

struct CounterExpiry;

impl Expiry<String, Arc<Counter>> for CounterExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Arc<Counter>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Redis-backed windowed counters with an in-process fallback.
///
/// When Redis is unreachable everything still works against the local
/// moka cache, just without sharing state between instances.
pub struct CacheService {
    redis: Option<redis::aio::ConnectionManager>,
    counters: Arc<Cache<String, Arc<Counter>>>,
}

impl CacheService {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let redis = match redis::Client::open(redis_url) {
            Ok(client) => {
                match client.get_connection_manager().await {
                    Ok(conn) => {
                        tracing::info!("Redis connected successfully");
                        Some(conn)
                    }
                    Err(e) => {
                        tracing::warn!("Redis connection failed: {}, using memory cache only", e);
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Redis client creation failed: {}, using memory cache only", e);
                None
            }
        };

        Ok(Self::with_redis(redis))
    }

    pub fn memory_only() -> Self {
        Self::with_redis(None)
    }

    fn with_redis(redis: Option<redis::aio::ConnectionManager>) -> Self {
        // Counter windows start at the first increment.
        let counters = Arc::new(
            Cache::builder()
                .max_capacity(100_000)
                .expire_after(CounterExpiry)
                .build()
        );

        Self { redis, counters }
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Adds `delta` to a counter. The counter expires `ttl` after its
    /// first increment; later increments do not extend the window.
    pub async fn increment(&self, key: &str, delta: i64, ttl: Duration) -> Result<i64> {
        if let Some(mut redis) = self.redis.clone() {
            match windowed_incr(key, delta, ttl)
                .query_async::<_, (i64,)>(&mut redis)
                .await
            {
                Ok((value,)) => return Ok(value),
                Err(e) => tracing::warn!("Redis increment error: {}, using memory counter", e),
            }
        }

        let counter = self
            .counters
            .get_with(key.to_string(), async move {
                Arc::new(Counter {
                    ttl,
                    value: AtomicI64::new(0),
                })
            })
            .await;
        Ok(counter.value.fetch_add(delta, Ordering::SeqCst) + delta)
    }

    pub async fn counter(&self, key: &str) -> Result<i64> {
        if let Some(mut redis) = self.redis.clone() {
            match redis.get::<_, Option<i64>>(key).await {
                Ok(value) => return Ok(value.unwrap_or(0)),
                Err(e) => tracing::warn!("Redis get error: {}, using memory counter", e),
            }
        }

        Ok(self
            .counters
            .get(key)
            .await
            .map(|c| c.value.load(Ordering::SeqCst))
            .unwrap_or(0))
    }

    pub async fn reset(&self, key: &str) -> Result<()> {
        self.counters.invalidate(key).await;

        if let Some(mut redis) = self.redis.clone() {
            if let Err(e) = redis.del::<_, ()>(key).await {
                tracing::warn!("Redis delete error: {}", e);
            }
        }

        Ok(())
    }

    pub async fn ping(&self) -> Result<bool> {
        if let Some(mut redis) = self.redis.clone() {
            match redis::cmd("PING").query_async::<_, String>(&mut redis).await {
                Ok(_) => Ok(true),
                Err(_) => Ok(false),
            }
        } else {
            Ok(false)
        }
    }
}

/// Creates the key with its expiry if absent, then increments, as one
/// MULTI/EXEC block so a counter can never exist without a TTL.
fn windowed_incr(key: &str, delta: i64, ttl: Duration) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(key)
        .arg(0)
        .arg("EX")
        .arg(ttl.as_secs().max(1))
        .arg("NX")
        .ignore()
        .incr(key, delta);
    pipe
}
