//! 店铺设置（单条记录的 bundle）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoutiqueSDKError, Result};
use crate::resource::{Resource, ResourceKind};

/// 未配置时的低库存阈值
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub id: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDraft {
    pub store_name: String,
    pub currency: String,
    pub language: String,
    pub theme: String,
    pub notifications_enabled: bool,
    pub low_stock_threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i64>,
}

impl Resource for StoreSettings {
    type Draft = SettingsDraft;
    type Patch = SettingsPatch;

    const KIND: ResourceKind = ResourceKind::Settings;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: SettingsDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            store_name: draft.store_name,
            currency: draft.currency,
            language: draft.language,
            theme: draft.theme,
            notifications_enabled: draft.notifications_enabled,
            low_stock_threshold: draft.low_stock_threshold,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &SettingsPatch) {
        if let Some(v) = &patch.store_name {
            self.store_name = v.clone();
        }
        if let Some(v) = &patch.currency {
            self.currency = v.clone();
        }
        if let Some(v) = &patch.language {
            self.language = v.clone();
        }
        if let Some(v) = &patch.theme {
            self.theme = v.clone();
        }
        if let Some(v) = patch.notifications_enabled {
            self.notifications_enabled = v;
        }
        if let Some(v) = patch.low_stock_threshold {
            self.low_stock_threshold = v;
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn validate_draft(draft: &SettingsDraft) -> Result<()> {
        if draft.low_stock_threshold < 0 {
            return Err(BoutiqueSDKError::validation(
                "lowStockThreshold",
                "must not be negative",
            ));
        }
        Ok(())
    }

    fn validate_patch(patch: &SettingsPatch) -> Result<()> {
        match patch.low_stock_threshold {
            Some(threshold) if threshold < 0 => Err(BoutiqueSDKError::validation(
                "lowStockThreshold",
                "must not be negative",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_from_sparse_payload() {
        let settings: StoreSettings =
            serde_json::from_value(serde_json::json!({"id": "s1", "storeName": "Maison"}))
                .unwrap();
        assert_eq!(settings.low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.store_name, "Maison");
    }
}
