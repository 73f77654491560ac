use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{sea_query::OnConflict, ConnectionTrait, EntityTrait, Set};
use serde::Serialize;

use super::catalog::{self, SettingCategory, SettingType, CATALOG};
use super::{Settings, SharedSettings};
use crate::entities::app_setting;
use crate::error::{AppError, AppResult};

const MASK: &str = "********";

/// A catalog entry with its effective value, as shown to operators
#[derive(Debug, Serialize)]
pub struct SettingView {
    pub key: &'static str,
    pub value: String,
    pub setting_type: SettingType,
    pub category: SettingCategory,
    pub description: &'static str,
    pub required: bool,
    pub sensitive: bool,
    pub is_default: bool,
}

pub struct SettingsStore;

impl SettingsStore {
    /// Read the stored values into a snapshot. An unreadable table yields the
    /// defaults so bookings can still be taken.
    pub async fn load<C: ConnectionTrait>(db: &C) -> Settings {
        match Self::stored_values(db).await {
            Ok(values) => {
                tracing::debug!(count = values.len(), "Loaded settings from database");
                Settings::from_values(&values)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not load settings, using defaults");
                Settings::default()
            }
        }
    }

    /// Load a fresh snapshot and make it the current one
    pub async fn refresh<C: ConnectionTrait>(db: &C, shared: &SharedSettings) -> Arc<Settings> {
        let snapshot = shared.replace(Self::load(db).await);
        tracing::info!(gst_percent = %snapshot.gst_percent, "Settings refreshed");
        snapshot
    }

    /// Validate and store one value. Takes effect on the next refresh.
    pub async fn set<C: ConnectionTrait>(db: &C, key: &str, value: &str) -> AppResult<()> {
        let def = catalog::find(key)
            .ok_or_else(|| AppError::NotFound(format!("Unknown setting: {}", key)))?;
        let value = value.trim();
        def.validate(value).map_err(AppError::Validation)?;

        let row = app_setting::ActiveModel {
            key: Set(def.key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(Utc::now().into()),
        };

        app_setting::Entity::insert(row)
            .on_conflict(
                OnConflict::column(app_setting::Column::Key)
                    .update_columns([app_setting::Column::Value, app_setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        tracing::info!(key = def.key, "Setting updated");
        Ok(())
    }

    /// Every catalog entry with its effective value; sensitive values masked
    pub async fn list<C: ConnectionTrait>(db: &C) -> AppResult<Vec<SettingView>> {
        let stored = Self::stored_values(db).await?;

        Ok(CATALOG
            .iter()
            .map(|def| {
                let stored_value = stored.get(def.key);
                let value = stored_value.map(String::as_str).unwrap_or(def.default);
                SettingView {
                    key: def.key,
                    value: if def.sensitive && !value.is_empty() {
                        MASK.to_string()
                    } else {
                        value.to_string()
                    },
                    setting_type: def.setting_type,
                    category: def.category,
                    description: def.description,
                    required: def.required,
                    sensitive: def.sensitive,
                    is_default: stored_value.is_none(),
                }
            })
            .collect())
    }

    async fn stored_values<C: ConnectionTrait>(db: &C) -> AppResult<HashMap<String, String>> {
        let rows = app_setting::Entity::find().all(db).await?;
        Ok(rows.into_iter().map(|r| (r.key, r.value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use sea_orm::ConnectionTrait;

    use super::*;
    use crate::db::test_connection;

    #[tokio::test]
    async fn test_set_then_refresh() {
        let db = test_connection().await;
        let shared = SharedSettings::new(SettingsStore::load(&db).await);
        assert_eq!(shared.current().gst_percent, dec!(5));

        SettingsStore::set(&db, "gst_percent", " 18 ").await.unwrap();
        // Not visible until refreshed
        assert_eq!(shared.current().gst_percent, dec!(5));

        let snapshot = SettingsStore::refresh(&db, &shared).await;
        assert_eq!(snapshot.gst_percent, dec!(18));
        assert_eq!(shared.current().gst_percent, dec!(18));

        // Upsert over an existing row
        SettingsStore::set(&db, "gst_percent", "12").await.unwrap();
        assert_eq!(SettingsStore::load(&db).await.gst_percent, dec!(12));
    }

    #[tokio::test]
    async fn test_set_rejects_invalid_and_unknown() {
        let db = test_connection().await;

        let err = SettingsStore::set(&db, "gst_percent", "abc").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = SettingsStore::set(&db, "no_such_key", "1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_masks_sensitive_values() {
        let db = test_connection().await;
        SettingsStore::set(&db, "green_api_token", "secret-token").await.unwrap();

        let views = SettingsStore::list(&db).await.unwrap();
        let token = views.iter().find(|v| v.key == "green_api_token").unwrap();
        assert_eq!(token.value, MASK);
        assert!(!token.is_default);

        let name = views.iter().find(|v| v.key == "agency_name").unwrap();
        assert_eq!(name.value, "Himanshi Travels");
        assert!(name.is_default);
    }

    #[tokio::test]
    async fn test_load_falls_back_when_table_missing() {
        let db = test_connection().await;
        db.execute_unprepared("DROP TABLE app_settings").await.unwrap();

        assert_eq!(SettingsStore::load(&db).await, Settings::default());
    }
}
