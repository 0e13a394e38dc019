//! 商品分类

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoutiqueSDKError, Result};
use crate::resource::{Resource, ResourceKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Resource for Category {
    type Draft = CategoryDraft;
    type Patch = CategoryPatch;

    const KIND: ResourceKind = ResourceKind::Categories;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: CategoryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &CategoryPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn validate_draft(draft: &CategoryDraft) -> Result<()> {
        if draft.name.trim().is_empty() {
            return Err(BoutiqueSDKError::validation("name", "must not be empty"));
        }
        Ok(())
    }

    fn validate_patch(patch: &CategoryPatch) -> Result<()> {
        match &patch.name {
            Some(name) if name.trim().is_empty() => {
                Err(BoutiqueSDKError::validation("name", "must not be empty"))
            }
            _ => Ok(()),
        }
    }
}
