//! App 生命周期管理
//!
//! 前后台切换时按注册顺序通知各模块；同步调度通过 [`SyncLifecycleHook`]
//! 在前台启动、后台停止。

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;

/// App 当前所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    Foreground,
    Background,
}

impl AppState {
    fn as_str(&self) -> &'static str {
        match self {
            AppState::Foreground => "前台",
            AppState::Background => "后台",
        }
    }
}

/// 生命周期回调 Hook
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Hook 名称，用于日志
    fn name(&self) -> &str;

    /// App 切换到后台时调用
    async fn on_background(&self) -> Result<()>;

    /// App 切换到前台时调用
    async fn on_foreground(&self) -> Result<()>;
}

/// 生命周期管理器
pub struct LifecycleManager {
    hooks: Vec<Arc<dyn LifecycleHook>>,
    state: Mutex<Option<AppState>>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self {
            hooks: Vec::new(),
            state: Mutex::new(None),
        }
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// 最近一次通知的阶段，尚未通知过为 `None`
    pub fn state(&self) -> Option<AppState> {
        *self.state.lock()
    }

    /// 注册生命周期回调 Hook
    pub fn register_hook(&mut self, hook: Arc<dyn LifecycleHook>) {
        info!("✅ 生命周期 Hook 已注册: {}", hook.name());
        self.hooks.push(hook);
    }

    /// 通知所有 Hook：App 切换到后台
    pub async fn notify_background(&self) -> Result<()> {
        self.notify(AppState::Background).await
    }

    /// 通知所有 Hook：App 切换到前台
    pub async fn notify_foreground(&self) -> Result<()> {
        self.notify(AppState::Foreground).await
    }

    /// 按注册顺序执行；某个 Hook 失败只记录，其余 Hook 照常执行，最后返回第一个错误
    async fn notify(&self, next: AppState) -> Result<()> {
        *self.state.lock() = Some(next);
        info!("🔄 通知所有模块：App 切换到{}", next.as_str());

        let mut first_error = None;
        let mut failures = 0usize;

        for hook in &self.hooks {
            let result = match next {
                AppState::Foreground => hook.on_foreground().await,
                AppState::Background => hook.on_background().await,
            };
            if let Err(e) = result {
                warn!("⚠️ Hook {} {}切换失败: {}", hook.name(), next.as_str(), e);
                failures += 1;
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => {
                warn!("⚠️ {} 个模块{}切换失败，但所有模块都已尝试执行", failures, next.as_str());
                Err(e)
            }
            None => {
                info!("✅ 所有模块{}切换完成", next.as_str());
                Ok(())
            }
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

mod sync_hook;
pub use sync_hook::SyncLifecycleHook;
