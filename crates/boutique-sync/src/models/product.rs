//! 商品

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BoutiqueSDKError, Result};
use crate::resource::{Resource, ResourceKind};

/// 商品可售状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    InStock,
    OutOfStock,
    PreOrder,
    Discontinued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub availability: Availability,
    /// 按日期（YYYY-MM-DD）的库存
    #[serde(default)]
    pub stock_by_date: BTreeMap<String, i64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub category: String,
    pub tags: Vec<String>,
    pub availability: Availability,
    pub stock_by_date: BTreeMap<String, i64>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_by_date: Option<BTreeMap<String, i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn quantity(quantity: i64) -> Self {
        Self {
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    pub fn price(price: f64) -> Self {
        Self {
            price: Some(price),
            ..Default::default()
        }
    }
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(BoutiqueSDKError::validation(
            "price",
            "must be a non-negative number",
        ));
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(BoutiqueSDKError::validation(
            "quantity",
            "must not be negative",
        ));
    }
    Ok(())
}

fn validate_stock(stock: &BTreeMap<String, i64>) -> Result<()> {
    if let Some((date, _)) = stock.iter().find(|(_, qty)| **qty < 0) {
        return Err(BoutiqueSDKError::validation(
            "stockByDate",
            &format!("stock for {} must not be negative", date),
        ));
    }
    Ok(())
}

impl Resource for Product {
    type Draft = ProductDraft;
    type Patch = ProductPatch;

    const KIND: ResourceKind = ResourceKind::Products;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: ProductDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            sku: draft.sku,
            price: draft.price,
            quantity: draft.quantity,
            category: draft.category,
            tags: draft.tags,
            availability: draft.availability,
            stock_by_date: draft.stock_by_date,
            images: draft.images,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(sku) = &patch.sku {
            self.sku = Some(sku.clone());
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(availability) = patch.availability {
            self.availability = availability;
        }
        if let Some(stock) = &patch.stock_by_date {
            self.stock_by_date = stock.clone();
        }
        if let Some(images) = &patch.images {
            self.images = images.clone();
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn validate_draft(draft: &ProductDraft) -> Result<()> {
        if draft.name.trim().is_empty() {
            return Err(BoutiqueSDKError::validation("name", "must not be empty"));
        }
        validate_price(draft.price)?;
        validate_quantity(draft.quantity)?;
        validate_stock(&draft.stock_by_date)
    }

    fn validate_patch(patch: &ProductPatch) -> Result<()> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(BoutiqueSDKError::validation("name", "must not be empty"));
            }
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
        }
        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(stock) = &patch.stock_by_date {
            validate_stock(stock)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_wire_format() {
        let product: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Linen dress",
            "price": 120.0,
            "quantity": 4,
            "category": "dresses",
            "tags": ["summer"],
            "availability": "pre_order",
            "stockByDate": {"2024-06-01": 2},
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-02T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(product.availability, Availability::PreOrder);
        assert_eq!(product.stock_by_date.get("2024-06-01"), Some(&2));
        assert!(product.sku.is_none());

        let value = serde_json::to_value(&product).unwrap();
        assert!(value.get("stockByDate").is_some());
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn test_patch_only_serializes_present_fields() {
        let value = serde_json::to_value(ProductPatch::quantity(3)).unwrap();
        assert_eq!(value, json!({"quantity": 3}));
    }

    #[test]
    fn test_validation_rejects_malformed_values() {
        assert!(Product::validate_patch(&ProductPatch::quantity(-1)).is_err());
        assert!(Product::validate_patch(&ProductPatch::price(f64::NAN)).is_err());
        assert!(Product::validate_patch(&ProductPatch::quantity(0)).is_ok());

        let draft = ProductDraft {
            name: "  ".into(),
            price: 10.0,
            ..Default::default()
        };
        assert!(Product::validate_draft(&draft).is_err());
    }

    #[test]
    fn test_apply_patch_keeps_untouched_fields() {
        let now = Utc::now();
        let mut product = Product::from_draft(
            "p1".into(),
            ProductDraft {
                name: "Scarf".into(),
                price: 30.0,
                quantity: 5,
                category: "accessories".into(),
                ..Default::default()
            },
            now,
        );
        product.apply_patch(&ProductPatch::quantity(2));
        assert_eq!(product.quantity, 2);
        assert_eq!(product.name, "Scarf");
        assert_eq!(product.category, "accessories");
    }
}
