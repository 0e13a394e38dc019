//! 订单

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoutiqueSDKError, Result};
use crate::resource::{Resource, ResourceKind};

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderDraft {
    /// 订单总额（服务器确认前用于本地记录）
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

fn validate_items(items: &[OrderItem]) -> Result<()> {
    for item in items {
        if item.quantity <= 0 {
            return Err(BoutiqueSDKError::validation(
                "items.quantity",
                "must be greater than zero",
            ));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(BoutiqueSDKError::validation(
                "items.unitPrice",
                "must be a non-negative number",
            ));
        }
    }
    Ok(())
}

impl Resource for Order {
    type Draft = OrderDraft;
    type Patch = OrderPatch;

    const KIND: ResourceKind = ResourceKind::Orders;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: OrderDraft, now: DateTime<Utc>) -> Self {
        let total = draft.total();
        Self {
            id,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            items: draft.items,
            total,
            status: OrderStatus::Pending,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &OrderPatch) {
        if let Some(name) = &patch.customer_name {
            self.customer_name = name.clone();
        }
        if let Some(phone) = &patch.customer_phone {
            self.customer_phone = Some(phone.clone());
        }
        if let Some(items) = &patch.items {
            self.items = items.clone();
            self.total = self.items.iter().map(OrderItem::line_total).sum();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn validate_draft(draft: &OrderDraft) -> Result<()> {
        if draft.customer_name.trim().is_empty() {
            return Err(BoutiqueSDKError::validation(
                "customerName",
                "must not be empty",
            ));
        }
        if draft.items.is_empty() {
            return Err(BoutiqueSDKError::validation(
                "items",
                "order must contain at least one item",
            ));
        }
        validate_items(&draft.items)
    }

    fn validate_patch(patch: &OrderPatch) -> Result<()> {
        match &patch.items {
            Some(items) if items.is_empty() => Err(BoutiqueSDKError::validation(
                "items",
                "order must contain at least one item",
            )),
            Some(items) => validate_items(items),
            None => Ok(()),
        }
    }
}
