//! Store 内部状态与对外只读快照

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::resource::{Resource, SyncStatus};

/// 对外只读模型：完整集合 + 加载/在线/错误标记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot<R> {
    pub items: Vec<R>,
    pub is_loading: bool,
    pub is_online: bool,
    pub error: Option<String>,
    pub last_fetched: Option<DateTime<Utc>>,
    pub pending_changes: usize,
}

/// 回滚点：只包含集合与记录级同步标记，不包含在线/加载标记
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint<R> {
    items: Vec<R>,
    statuses: HashMap<String, SyncStatus>,
}

#[derive(Debug)]
pub(crate) struct StoreState<R> {
    pub(crate) items: Vec<R>,
    /// 仅记录非 Synced 的条目
    pub(crate) statuses: HashMap<String, SyncStatus>,
    pub(crate) in_flight: usize,
    pub(crate) is_online: bool,
    pub(crate) error: Option<String>,
    pub(crate) last_fetched: Option<DateTime<Utc>>,
    pub(crate) has_fetched: bool,
}

impl<R: Resource> StoreState<R> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            statuses: HashMap::new(),
            in_flight: 0,
            is_online: true,
            error: None,
            last_fetched: None,
            has_fetched: false,
        }
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint<R> {
        Checkpoint {
            items: self.items.clone(),
            statuses: self.statuses.clone(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint<R>) {
        self.items = checkpoint.items;
        self.statuses = checkpoint.statuses;
    }

    /// 整体替换集合，所有记录视为已同步
    pub(crate) fn replace(&mut self, items: Vec<R>) {
        self.items = items;
        self.statuses.clear();
    }

    pub(crate) fn set_status(&mut self, id: &str, status: SyncStatus) {
        if status.is_pending() {
            self.statuses.insert(id.to_string(), status);
        } else {
            self.statuses.remove(id);
        }
    }

    pub(crate) fn status(&self, id: &str) -> SyncStatus {
        self.statuses.get(id).copied().unwrap_or_default()
    }

    pub(crate) fn pending_changes(&self) -> usize {
        self.statuses.len()
    }

    pub(crate) fn snapshot(&self) -> StoreSnapshot<R> {
        StoreSnapshot {
            items: self.items.clone(),
            is_loading: self.in_flight > 0,
            is_online: self.is_online,
            error: self.error.clone(),
            last_fetched: self.last_fetched,
            pending_changes: self.pending_changes(),
        }
    }
}
