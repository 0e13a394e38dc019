//! AI 功能开关（聊天自动回复、评论自动回复）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceKind, Toggleable};

pub const FLAG_AI_CHAT: &str = "ai_chat";
pub const FLAG_AI_COMMENT: &str = "ai_comment";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub id: String,
    #[serde(default)]
    pub ai_chat_enabled: bool,
    #[serde(default)]
    pub ai_comment_enabled: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiSettingsDraft {
    pub ai_chat_enabled: bool,
    pub ai_comment_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_chat_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_comment_enabled: Option<bool>,
}

impl Resource for AiSettings {
    type Draft = AiSettingsDraft;
    type Patch = AiSettingsPatch;

    const KIND: ResourceKind = ResourceKind::AiSettings;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: AiSettingsDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            ai_chat_enabled: draft.ai_chat_enabled,
            ai_comment_enabled: draft.ai_comment_enabled,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &AiSettingsPatch) {
        if let Some(v) = patch.ai_chat_enabled {
            self.ai_chat_enabled = v;
        }
        if let Some(v) = patch.ai_comment_enabled {
            self.ai_comment_enabled = v;
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Toggleable for AiSettings {
    const FLAGS: &'static [&'static str] = &[FLAG_AI_CHAT, FLAG_AI_COMMENT];

    fn flag(&self, name: &str) -> Option<bool> {
        match name {
            FLAG_AI_CHAT => Some(self.ai_chat_enabled),
            FLAG_AI_COMMENT => Some(self.ai_comment_enabled),
            _ => None,
        }
    }

    fn set_flag(&mut self, name: &str, value: bool) -> bool {
        match name {
            FLAG_AI_CHAT => self.ai_chat_enabled = value,
            FLAG_AI_COMMENT => self.ai_comment_enabled = value,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut settings =
            AiSettings::from_draft("ai".into(), AiSettingsDraft::default(), Utc::now());
        assert_eq!(settings.flag(FLAG_AI_CHAT), Some(false));
        assert!(settings.set_flag(FLAG_AI_CHAT, true));
        assert!(settings.ai_chat_enabled);
        assert!(!settings.set_flag("ai_voice", true));
        assert_eq!(settings.flag("ai_voice"), None);
    }
}
