//! Settings are read far more often than they are written (every outgoing e-mail reads the SMTP settings), so reads
//! go through a [`SettingsCache`] with a five minute time-to-live.
//!
//! The cache is an explicit object owned by [`SettingsApi`] and shared between clones of the API (one per HTTP
//! worker) by reference counting. Writes go straight to storage:
//! * [`SettingsApi::update_setting`] does **not** invalidate the cache. A cached read inside the TTL window keeps
//!   returning the old value until the cache expires or is cleared.
//! * [`SettingsApi::bulk_update_settings`] clears the cache once all updates are stored.
//! * [`SettingsApi::clear_cache`] invalidates explicitly.
use std::{collections::HashMap, sync::Arc, time::Duration};

use log::*;
use sf_common::helpers::setting_is_enabled;
use tokio::{sync::RwLock, time::Instant};

use crate::{
    db_types::{Setting, SettingType, MASKED_VALUE},
    traits::{SettingsApiError, SettingsManagement},
};

pub const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// The settings the rest of the system reads through the cache.
pub const CACHED_SETTING_KEYS: [&str; 17] = [
    "store_name",
    "store_email",
    "store_phone",
    "store_address",
    "store_logo",
    "smtp_host",
    "smtp_port",
    "smtp_user",
    "smtp_password",
    "smtp_secure",
    "smtp_from_email",
    "smtp_from_name",
    "email_notifications_enabled",
    "order_confirmation_email_enabled",
    "payment_confirmation_email_enabled",
    "order_status_email_enabled",
    "maintenance_mode",
];

#[derive(Debug)]
pub struct SettingsCache {
    entries: HashMap<String, String>,
    refreshed_at: Option<Instant>,
    ttl: Duration,
}

impl SettingsCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: HashMap::new(), refreshed_at: None, ttl }
    }

    /// The cached values, if the cache is populated and younger than its TTL at `now`.
    pub fn fresh_entries(&self, now: Instant) -> Option<&HashMap<String, String>> {
        match self.refreshed_at {
            Some(at) if now.saturating_duration_since(at) < self.ttl => Some(&self.entries),
            _ => None,
        }
    }

    pub fn store(&mut self, entries: HashMap<String, String>, now: Instant) {
        self.entries = entries;
        self.refreshed_at = Some(now);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.refreshed_at = None;
    }

    pub fn is_populated(&self) -> bool {
        self.refreshed_at.is_some()
    }
}

#[derive(Clone)]
pub struct SettingsApi<B> {
    db: B,
    cache: Arc<RwLock<SettingsCache>>,
}

impl<B> SettingsApi<B> {
    pub fn new(db: B) -> Self {
        Self::with_cache_ttl(db, SETTINGS_CACHE_TTL)
    }

    pub fn with_cache_ttl(db: B, ttl: Duration) -> Self {
        Self { db, cache: Arc::new(RwLock::new(SettingsCache::new(ttl))) }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        debug!("⚙️ Settings cache cleared");
    }
}

impl<B> SettingsApi<B>
where B: SettingsManagement
{
    /// The cached settings, keyed by setting key. Refreshed from storage when the cache is empty or stale.
    pub async fn fetch_settings(&self) -> Result<HashMap<String, String>, SettingsApiError> {
        if let Some(entries) = self.cache.read().await.fresh_entries(Instant::now()) {
            trace!("⚙️ Settings served from cache");
            return Ok(entries.clone());
        }
        let settings = self.db.fetch_settings_for_keys(&CACHED_SETTING_KEYS).await?;
        let entries = settings.into_iter().map(|s| (s.key, s.value.unwrap_or_default())).collect::<HashMap<_, _>>();
        self.cache.write().await.store(entries.clone(), Instant::now());
        debug!("⚙️ Settings cache refreshed with {} entries", entries.len());
        Ok(entries)
    }

    /// A single value, read through the cache.
    pub async fn setting_value(&self, key: &str) -> Result<Option<String>, SettingsApiError> {
        Ok(self.fetch_settings().await?.get(key).cloned())
    }

    /// Whether a boolean setting is on, read through the cache. Missing settings are off.
    pub async fn is_enabled(&self, key: &str) -> Result<bool, SettingsApiError> {
        Ok(setting_is_enabled(self.setting_value(key).await?.as_deref()))
    }

    /// A single setting, straight from storage.
    pub async fn fetch_setting(&self, key: &str) -> Result<Setting, SettingsApiError> {
        self.db.fetch_setting(key).await?.ok_or_else(|| SettingsApiError::SettingNotFound(key.to_string()))
    }

    /// Every setting, with password values masked.
    pub async fn fetch_all_settings(&self) -> Result<Vec<Setting>, SettingsApiError> {
        let settings = self.db.fetch_all_settings().await?;
        Ok(settings.iter().map(Setting::masked).collect())
    }

    pub async fn fetch_public_settings(&self) -> Result<Vec<Setting>, SettingsApiError> {
        self.db.fetch_public_settings().await
    }

    /// Writes a single setting to storage. The cache is left untouched.
    ///
    /// Submitting the password mask unchanged is a no-op, so that a back-office form can be saved without re-entering
    /// secrets.
    pub async fn update_setting(&self, key: &str, value: &str) -> Result<Setting, SettingsApiError> {
        let current = self.fetch_setting(key).await?;
        if is_unchanged_secret(&current, value) {
            trace!("⚙️ Password setting {key} submitted masked. Keeping the stored value.");
            return Ok(current.masked());
        }
        validate_value(&current, value)?;
        let updated = self.db.update_setting(key, value).await?;
        info!("⚙️ Setting {key} updated. The settings cache was not invalidated.");
        Ok(updated.masked())
    }

    /// Writes several settings in one transaction, then clears the cache.
    pub async fn bulk_update_settings(
        &self,
        updates: Vec<(String, String)>,
    ) -> Result<Vec<Setting>, SettingsApiError> {
        let current = self
            .db
            .fetch_all_settings()
            .await?
            .into_iter()
            .map(|s| (s.key.clone(), s))
            .collect::<HashMap<_, _>>();
        let mut to_write = Vec::with_capacity(updates.len());
        for (key, value) in updates {
            let setting = current.get(&key).ok_or_else(|| SettingsApiError::SettingNotFound(key.clone()))?;
            if is_unchanged_secret(setting, &value) {
                continue;
            }
            validate_value(setting, &value)?;
            to_write.push((key, value));
        }
        let updated = self.db.bulk_update_settings(&to_write).await?;
        self.clear_cache().await;
        info!("⚙️ {} settings updated and the settings cache cleared", updated.len());
        Ok(updated.iter().map(Setting::masked).collect())
    }
}

fn is_unchanged_secret(setting: &Setting, value: &str) -> bool {
    setting.setting_type == SettingType::Password && value == MASKED_VALUE
}

fn validate_value(setting: &Setting, value: &str) -> Result<(), SettingsApiError> {
    if setting.setting_type == SettingType::Boolean && !matches!(value, "true" | "false") {
        return Err(SettingsApiError::InvalidValue {
            key: setting.key.clone(),
            reason: "expected true or false".to_string(),
        });
    }
    Ok(())
}
