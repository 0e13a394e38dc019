//! 后台同步
//!
//! - [`Refreshable`]：可被调度器全量刷新的目标（各资源 Store）
//! - [`SyncScheduler`]：固定间隔轮询 + 立即同步 + 重叠保护
//!
//! 调度器不做重试与退避，单个目标失败只影响它自己的在线标记。

pub mod scheduler;

pub use scheduler::{SyncReport, SyncScheduler};

use async_trait::async_trait;

/// 调度器的刷新目标
#[async_trait]
pub trait Refreshable: Send + Sync {
    /// 目标名称（日志与同步报告中使用）
    fn name(&self) -> &str;

    /// 执行一次全量刷新，返回是否成功
    async fn refresh(&self) -> bool;

    fn is_online(&self) -> bool;

    /// 尚未被服务器确认的本地变更数
    fn pending_changes(&self) -> usize;

    /// 网络恢复时是否需要补一次同步
    fn needs_catch_up(&self) -> bool {
        !self.is_online() || self.pending_changes() > 0
    }
}
