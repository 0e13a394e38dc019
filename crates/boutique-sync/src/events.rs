//! 事件系统模块 - 本地状态变化通知
//!
//! 功能包括：
//! - Store 快照变化事件（刷新、乐观写入、提交、回滚）
//! - 网络连通性变化事件
//! - 同步周期完成事件
//! - 事件广播和订阅机制

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::resource::ResourceKind;

/// Store 快照的变化类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum StoreChange {
    /// 全量刷新成功，快照被替换
    Refreshed { count: usize },
    /// 全量刷新失败，快照保持不变
    RefreshFailed { error: String },
    /// 新记录插入；`local` 表示是离线合成的本地记录
    Created { id: String, local: bool },
    /// 乐观写入已应用（尚未确认）
    Applied { id: String },
    /// 服务器已确认
    Committed { id: String },
    /// 服务器拒绝或网络失败，已回滚
    RolledBack { id: String, error: String },
    /// 记录已从快照中移除（乐观）
    Removed { id: String },
    /// 从本地缓存恢复
    Hydrated { count: usize },
}

/// SDK 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SDKEvent {
    /// Store 快照变化
    StoreChanged {
        kind: ResourceKind,
        change: StoreChange,
        timestamp: u64,
    },
    /// 有效在线状态变化
    ConnectivityChanged {
        was_online: bool,
        is_online: bool,
        timestamp: u64,
    },
    /// 一轮全量同步结束
    SyncCycleCompleted {
        succeeded: Vec<String>,
        failed: Vec<String>,
        timestamp: u64,
    },
}

impl SDKEvent {
    /// 获取事件类型名称
    pub fn event_type(&self) -> &'static str {
        match self {
            SDKEvent::StoreChanged { .. } => "store_changed",
            SDKEvent::ConnectivityChanged { .. } => "connectivity_changed",
            SDKEvent::SyncCycleCompleted { .. } => "sync_cycle_completed",
        }
    }

    /// 获取事件时间戳（UTC 毫秒）
    pub fn timestamp(&self) -> u64 {
        match self {
            SDKEvent::StoreChanged { timestamp, .. }
            | SDKEvent::ConnectivityChanged { timestamp, .. }
            | SDKEvent::SyncCycleCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// 事件关联的资源类型
    pub fn resource_kind(&self) -> Option<ResourceKind> {
        match self {
            SDKEvent::StoreChanged { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// 事件监听器类型
pub type EventListener = Box<dyn Fn(&SDKEvent) + Send + Sync>;

/// 事件管理器
pub struct EventManager {
    /// 广播发送器
    sender: broadcast::Sender<SDKEvent>,
    /// 事件监听器映射
    listeners: Arc<tokio::sync::RwLock<HashMap<String, Vec<EventListener>>>>,
    /// 事件统计
    stats: Arc<tokio::sync::RwLock<EventStats>>,
}

/// 事件统计信息
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    /// 总事件数
    pub total_events: u64,
    /// 按类型分组的事件数
    pub events_by_type: HashMap<String, u64>,
    /// 监听器数量
    pub listener_count: usize,
    /// 最后事件时间
    pub last_event_time: Option<u64>,
}

impl EventManager {
    /// 创建新的事件管理器
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self {
            sender,
            listeners: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            stats: Arc::new(tokio::sync::RwLock::new(EventStats::default())),
        }
    }

    /// 发布事件
    pub async fn emit(&self, event: SDKEvent) {
        debug!("Emitting event: {}", event.event_type());

        {
            let mut stats = self.stats.write().await;
            stats.total_events += 1;
            *stats
                .events_by_type
                .entry(event.event_type().to_string())
                .or_insert(0) += 1;
            stats.last_event_time = Some(event.timestamp());
        }

        // 无订阅者时 send 会失败，属正常场景
        if let Err(e) = self.sender.send(event.clone()) {
            debug!("Failed to broadcast event (no active receivers): {}", e);
        }

        let listeners = self.listeners.read().await;
        if let Some(event_listeners) = listeners.get(event.event_type()) {
            for listener in event_listeners {
                listener(&event);
            }
        }
        if let Some(general_listeners) = listeners.get("*") {
            for listener in general_listeners {
                listener(&event);
            }
        }
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<SDKEvent> {
        self.sender.subscribe()
    }

    /// 添加事件监听器，`"*"` 监听所有类型
    pub async fn add_listener<F>(&self, event_type: &str, listener: F)
    where
        F: Fn(&SDKEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write().await;
        listeners
            .entry(event_type.to_string())
            .or_insert_with(Vec::new)
            .push(Box::new(listener));

        let mut stats = self.stats.write().await;
        stats.listener_count = listeners.values().map(|v| v.len()).sum();

        info!("Added listener for event type: {}", event_type);
    }

    /// 移除所有监听器
    pub async fn clear_listeners(&self) {
        let mut listeners = self.listeners.write().await;
        listeners.clear();

        let mut stats = self.stats.write().await;
        stats.listener_count = 0;

        info!("Cleared all event listeners");
    }

    /// 获取事件统计
    pub async fn get_stats(&self) -> EventStats {
        self.stats.read().await.clone()
    }

    /// 获取活跃订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(256)
    }
}

/// 事件生成器 - 辅助函数
pub mod event_builders {
    use super::*;

    fn now_millis() -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }

    pub fn store_changed(kind: ResourceKind, change: StoreChange) -> SDKEvent {
        SDKEvent::StoreChanged {
            kind,
            change,
            timestamp: now_millis(),
        }
    }

    pub fn connectivity_changed(was_online: bool, is_online: bool) -> SDKEvent {
        SDKEvent::ConnectivityChanged {
            was_online,
            is_online,
            timestamp: now_millis(),
        }
    }

    pub fn sync_cycle_completed(succeeded: Vec<String>, failed: Vec<String>) -> SDKEvent {
        SDKEvent::SyncCycleCompleted {
            succeeded,
            failed,
            timestamp: now_millis(),
        }
    }
}
