//! 资源抽象
//!
//! 每种资源（商品、订单、分类、店铺设置、AI 开关）实现 [`Resource`]，
//! Store / Gateway / Scheduler 只依赖该 trait，不感知具体字段。

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::Result;

/// 本地临时 ID 前缀（离线创建时生成，等待下一次全量刷新替换）
pub const LOCAL_ID_PREFIX: &str = "local-";

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Products,
    Orders,
    Categories,
    Settings,
    AiSettings,
}

impl ResourceKind {
    /// REST 路径段：`/api/<path>`
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Products => "products",
            ResourceKind::Orders => "orders",
            ResourceKind::Categories => "categories",
            ResourceKind::Settings => "settings",
            ResourceKind::AiSettings => "ai-settings",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Products => "products",
            ResourceKind::Orders => "orders",
            ResourceKind::Categories => "categories",
            ResourceKind::Settings => "settings",
            ResourceKind::AiSettings => "ai_settings",
        }
    }

    /// 首次加载失败时展示给用户的提示
    pub fn load_error_message(&self) -> String {
        format!("Failed to load {}", self.display_name())
    }

    /// 变更被回滚时展示给用户的提示，`action` 如 `update` / `delete`
    pub fn mutation_error_message(&self, action: &str) -> String {
        format!("Failed to {} {}", action, self.display_name())
    }

    /// 面向用户的名称
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Products => "products",
            ResourceKind::Orders => "orders",
            ResourceKind::Categories => "categories",
            ResourceKind::Settings => "settings",
            ResourceKind::AiSettings => "AI settings",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条记录的同步状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// 与服务器一致
    #[default]
    Synced,
    /// 本地创建，服务器尚未确认
    PendingCreate,
    /// 本地已修改，等待服务器确认
    PendingUpdate,
    /// 本地已删除，等待服务器确认
    PendingDelete,
}

impl SyncStatus {
    pub fn is_pending(&self) -> bool {
        !matches!(self, SyncStatus::Synced)
    }
}

/// Store 可以持有的资源记录
pub trait Resource:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 创建请求体
    type Draft: Clone + Debug + Serialize + Send + Sync + 'static;
    /// 局部更新请求体（字段均为可选）
    type Patch: Clone + Debug + Serialize + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> &str;

    /// 网络失败时用创建请求体合成本地记录
    fn from_draft(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// 将 patch 中出现的字段写入记录（不修改 updated_at）
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// 刷新 updated_at
    fn touch(&mut self, now: DateTime<Utc>);

    fn validate_draft(_draft: &Self::Draft) -> Result<()> {
        Ok(())
    }

    fn validate_patch(_patch: &Self::Patch) -> Result<()> {
        Ok(())
    }
}

/// 带布尔开关的资源（AI 设置等），开关通过 `POST /api/<resource>/toggle/{flag}` 切换
pub trait Toggleable: Resource {
    /// 支持的开关名
    const FLAGS: &'static [&'static str];

    fn flag(&self, name: &str) -> Option<bool>;

    /// 设置开关，未知开关返回 false
    fn set_flag(&mut self, name: &str, value: bool) -> bool;
}

/// 生成本地临时 ID
pub fn local_id() -> String {
    format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4())
}

/// 是否为本地临时 ID
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}
