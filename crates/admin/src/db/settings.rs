//! Site settings storage.
//!
//! Settings are one JSON document under a fixed key in `site_settings`.
//! Missing fields fall back to `SiteSettings::default()`, so a fresh database
//! serves sensible values without a seed.

use serde_json::Value as JsonValue;
use sqlx::PgPool;

use modvault_core::UserId;
use modvault_core::validation::SiteSettings;

/// Key of the site-wide settings row.
pub const SITE_SETTINGS_KEY: &str = "site";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Get a raw setting value.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn get_setting(pool: &PgPool, key: &str) -> Result<Option<JsonValue>, SettingsError> {
    let value = sqlx::query_scalar::<_, JsonValue>("SELECT value FROM site_settings WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

/// Upsert a raw setting value.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn set_setting(
    pool: &PgPool,
    key: &str,
    value: &JsonValue,
    updated_by: UserId,
) -> Result<(), SettingsError> {
    sqlx::query(
        "INSERT INTO site_settings (key, value, updated_by)
         VALUES ($1, $2, $3)
         ON CONFLICT (key) DO UPDATE
         SET value = EXCLUDED.value, updated_by = EXCLUDED.updated_by, updated_at = NOW()",
    )
    .bind(key)
    .bind(value)
    .bind(updated_by)
    .execute(pool)
    .await?;
    Ok(())
}

/// Current site settings.
///
/// # Errors
///
/// Returns an error if the query fails or the stored document is not an object.
pub async fn site_settings(pool: &PgPool) -> Result<SiteSettings, SettingsError> {
    match get_setting(pool, SITE_SETTINGS_KEY).await? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(SiteSettings::default()),
    }
}

/// Replace the site settings. Callers validate first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn save_site_settings(
    pool: &PgPool,
    settings: &SiteSettings,
    updated_by: UserId,
) -> Result<(), SettingsError> {
    let value = serde_json::to_value(settings)?;
    set_setting(pool, SITE_SETTINGS_KEY, &value, updated_by).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_fills_defaults() {
        let stored = serde_json::json!({ "maintenance_mode": true });
        let settings: SiteSettings = serde_json::from_value(stored).unwrap();
        assert!(settings.maintenance_mode);
        assert_eq!(settings.site_name, SiteSettings::default().site_name);
    }
}
