//! Process-wide platform-settings cache.
//!
//! Feature flags and emergency numbers live in parko-admin's
//! `platform_settings` table. Services hold one `SettingsCache` in
//! their `AppState` and read snapshots from it; the cache refreshes
//! itself by refetching the full settings from parko-admin's internal
//! endpoint whenever a `settings.updated` event arrives. The event
//! payload is never diffed — any settings event invalidates the whole
//! snapshot and triggers one refetch.

use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::clients::rabbitmq::RabbitMQClient;
use crate::types::event::routing_keys;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSettings {
    pub reports_enabled: bool,
    pub chat_enabled: bool,
    pub friend_requests_enabled: bool,
    pub maintenance_mode: bool,
    pub emergency_police: String,
    pub emergency_ambulance: String,
    pub emergency_fire: String,
    pub emergency_road_assist: String,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            reports_enabled: true,
            chat_enabled: true,
            friend_requests_enabled: true,
            maintenance_mode: false,
            emergency_police: "112".to_string(),
            emergency_ambulance: "112".to_string(),
            emergency_fire: "112".to_string(),
            emergency_road_assist: "1287".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct SettingsCache {
    snapshot: Arc<RwLock<PlatformSettings>>,
    source_url: String,
    http: reqwest::Client,
}

impl SettingsCache {
    /// `source_url` is parko-admin's internal settings endpoint. The
    /// cache serves defaults until the first refresh lands.
    pub fn new(source_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(PlatformSettings::default())),
            source_url: source_url.into(),
            http,
        }
    }

    /// Current snapshot. Cheap clone; callers never hold the lock.
    pub async fn get(&self) -> PlatformSettings {
        self.snapshot.read().await.clone()
    }

    pub async fn set(&self, settings: PlatformSettings) {
        *self.snapshot.write().await = settings;
    }

    /// Refetch the full settings from the source endpoint and swap the
    /// snapshot.
    pub async fn refresh(&self) -> anyhow::Result<()> {
        let fresh: PlatformSettings = self
            .http
            .get(&self.source_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        self.set(fresh).await;
        tracing::debug!(source = %self.source_url, "platform settings refreshed");
        Ok(())
    }

    /// Consume `settings.updated` events and refetch on each one. Runs
    /// until the consumer stream ends; spawn it from the service main.
    pub async fn run_refresh_loop(
        &self,
        rabbitmq: &RabbitMQClient,
        queue_name: &str,
    ) -> anyhow::Result<()> {
        let mut consumer = rabbitmq
            .subscribe(queue_name, &[routing_keys::SETTINGS_UPDATED])
            .await?;

        // Prime the snapshot so consumers don't run on defaults longer
        // than the first round-trip.
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "initial settings fetch failed, serving defaults");
        }

        tracing::info!(queue = %queue_name, "listening for settings.updated events");

        while let Some(delivery) = consumer.next().await {
            match delivery {
                Ok(delivery) => {
                    if let Err(e) = self.refresh().await {
                        tracing::error!(error = %e, "settings refresh failed");
                    }
                    let _ = delivery.ack(BasicAckOptions::default()).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "settings consumer error");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_defaults_until_refreshed() {
        let cache = SettingsCache::new("http://localhost:0/internal/settings", reqwest::Client::new());
        let snap = cache.get().await;
        assert!(snap.reports_enabled);
        assert!(!snap.maintenance_mode);
        assert_eq!(snap.emergency_police, "112");
    }

    #[tokio::test]
    async fn set_swaps_the_snapshot() {
        let cache = SettingsCache::new("http://localhost:0/internal/settings", reqwest::Client::new());

        let mut updated = PlatformSettings::default();
        updated.maintenance_mode = true;
        updated.chat_enabled = false;
        cache.set(updated.clone()).await;

        assert_eq!(cache.get().await, updated);
    }
}
