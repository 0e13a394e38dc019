//! 派生查询
//!
//! 对 Store 快照做纯函数过滤，不修改数据。所有过滤条件按 AND 组合，结果保持原顺序。

use serde::{Deserialize, Serialize};

use crate::models::{Availability, Order, OrderStatus, Product};

/// 商品过滤条件，未设置的条件不参与过滤
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// 命中任意一个标签即可；为空时不过滤
    pub tags: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub availability: Option<Availability>,
    /// 只保留 `0 < quantity <= threshold` 的商品
    pub low_stock_threshold: Option<i64>,
    /// 名称、描述、SKU 的不区分大小写子串匹配
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn availability(mut self, availability: Availability) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn low_stock(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| product.tags.contains(tag)) {
            return false;
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        if let Some(availability) = self.availability {
            if product.availability != availability {
                return false;
            }
        }
        if let Some(threshold) = self.low_stock_threshold {
            if !is_low_stock(product, threshold) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => matches_search(product, &query.to_lowercase()),
            _ => true,
        }
    }
}

/// 低库存：有货但不超过阈值，零库存不算
pub fn is_low_stock(product: &Product, threshold: i64) -> bool {
    product.quantity > 0 && product.quantity <= threshold
}

fn matches_search(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
        || product
            .sku
            .as_deref()
            .is_some_and(|sku| sku.to_lowercase().contains(needle))
}

pub fn select_filtered_products<'a>(
    products: &'a [Product],
    filter: &ProductFilter,
) -> Vec<&'a Product> {
    products.iter().filter(|p| filter.matches(p)).collect()
}

pub fn select_low_stock(products: &[Product], threshold: i64) -> Vec<&Product> {
    products
        .iter()
        .filter(|p| is_low_stock(p, threshold))
        .collect()
}

pub fn search_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return products.iter().collect();
    }
    products
        .iter()
        .filter(|p| matches_search(p, &needle))
        .collect()
}

pub fn select_by_id<'a>(products: &'a [Product], id: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.id == id)
}

pub fn select_by_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.category == category).collect()
}

pub fn select_orders_by_status(orders: &[Order], status: OrderStatus) -> Vec<&Order> {
    orders.iter().filter(|o| o.status == status).collect()
}

/// 按客户姓名、电话或订单号搜索
pub fn search_orders<'a>(orders: &'a [Order], query: &str) -> Vec<&'a Order> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return orders.iter().collect();
    }
    orders
        .iter()
        .filter(|o| {
            o.customer_name.to_lowercase().contains(&needle)
                || o.id.to_lowercase().contains(&needle)
                || o
                    .customer_phone
                    .as_deref()
                    .is_some_and(|phone| phone.contains(&needle))
        })
        .collect()
}

/// 首页概览
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub product_count: usize,
    pub low_stock_count: usize,
    pub out_of_stock_count: usize,
    pub pending_orders: usize,
    /// 未取消订单的总额
    pub revenue: f64,
}

pub fn dashboard_summary(
    products: &[Product],
    orders: &[Order],
    low_stock_threshold: i64,
) -> DashboardSummary {
    DashboardSummary {
        product_count: products.len(),
        low_stock_count: select_low_stock(products, low_stock_threshold).len(),
        out_of_stock_count: products.iter().filter(|p| p.quantity <= 0).count(),
        pending_orders: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        revenue: orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .map(|o| o.total)
            .sum(),
    }
}
