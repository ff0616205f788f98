use async_trait::async_trait;
use dashmap::DashMap;
use redis::{aio::ConnectionManager, Client};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use crate::config::RedisConfig;

/// Revoked credential ids, each kept until its credential would have expired anyway.
#[async_trait]
pub trait TokenDenyList: Send + Sync {
    async fn deny(&self, jti: &str, ttl_seconds: u64) -> Result<(), anyhow::Error>;
    async fn is_denied(&self, jti: &str) -> Result<bool, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisDenyList {
    manager: ConnectionManager,
}

impl RedisDenyList {
    pub async fn new(config: &RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!("Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to get Redis connection manager");
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");
        Ok(Self { manager })
    }

    fn key(jti: &str) -> String {
        format!("denylist:{}", jti)
    }
}

#[async_trait]
impl TokenDenyList for RedisDenyList {
    async fn deny(&self, jti: &str, ttl_seconds: u64) -> Result<(), anyhow::Error> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(Self::key(jti))
            .arg("revoked")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to deny token: {}", e))
    }

    async fn is_denied(&self, jti: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("EXISTS")
            .arg(Self::key(jti))
            .query_async::<_, bool>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check deny-list: {}", e))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// Per-process deny-list. Entries lapse at their deadline; lapsed entries are
/// swept on every insert and dropped on lookup.
#[derive(Default)]
pub struct InMemoryDenyList {
    entries: DashMap<String, Instant>,
    unavailable: AtomicBool,
}

impl InMemoryDenyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, as an unreachable Redis would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), anyhow::Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            anyhow::bail!("deny-list unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl TokenDenyList for InMemoryDenyList {
    async fn deny(&self, jti: &str, ttl_seconds: u64) -> Result<(), anyhow::Error> {
        self.check_available()?;
        let now = Instant::now();
        self.entries.retain(|_, deadline| *deadline > now);
        if ttl_seconds == 0 {
            return Ok(());
        }
        self.entries
            .insert(jti.to_string(), now + Duration::from_secs(ttl_seconds));
        Ok(())
    }

    async fn is_denied(&self, jti: &str) -> Result<bool, anyhow::Error> {
        self.check_available()?;
        let now = Instant::now();
        let live = match self.entries.get(jti) {
            Some(deadline) => *deadline > now,
            None => return Ok(false),
        };
        if !live {
            self.entries.remove(jti);
        }
        Ok(live)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        self.check_available()
    }
}
