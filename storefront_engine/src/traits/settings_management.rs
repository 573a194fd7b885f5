use thiserror::Error;

use crate::db_types::Setting;

/// The key/value settings store.
#[allow(async_fn_in_trait)]
pub trait SettingsManagement: Clone {
    async fn fetch_all_settings(&self) -> Result<Vec<Setting>, SettingsApiError>;

    async fn fetch_public_settings(&self) -> Result<Vec<Setting>, SettingsApiError>;

    async fn fetch_settings_for_keys(&self, keys: &[&str]) -> Result<Vec<Setting>, SettingsApiError>;

    async fn fetch_setting(&self, key: &str) -> Result<Option<Setting>, SettingsApiError>;

    /// Updates a single existing setting. Unknown keys are an error; settings are never created on write.
    async fn update_setting(&self, key: &str, value: &str) -> Result<Setting, SettingsApiError>;

    /// Updates several settings in one transaction. If any key is unknown, nothing is written.
    async fn bulk_update_settings(&self, updates: &[(String, String)]) -> Result<Vec<Setting>, SettingsApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum SettingsApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Setting {0} does not exist")]
    SettingNotFound(String),
    #[error("Invalid value for setting {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl From<sqlx::Error> for SettingsApiError {
    fn from(e: sqlx::Error) -> Self {
        SettingsApiError::DatabaseError(e.to_string())
    }
}
