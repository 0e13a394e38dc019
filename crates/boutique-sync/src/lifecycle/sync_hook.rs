//! 同步调度的生命周期 Hook
//!
//! 前台启动调度（立即同步一轮），后台停止定时器。

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::lifecycle::LifecycleHook;
use crate::sync::SyncScheduler;

pub struct SyncLifecycleHook {
    scheduler: Arc<SyncScheduler>,
}

impl SyncLifecycleHook {
    pub fn new(scheduler: Arc<SyncScheduler>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl LifecycleHook for SyncLifecycleHook {
    fn name(&self) -> &str {
        "sync"
    }

    async fn on_background(&self) -> Result<()> {
        info!("[Sync Hook] App 切换到后台，停止同步调度");
        self.scheduler.stop();
        Ok(())
    }

    async fn on_foreground(&self) -> Result<()> {
        info!("[Sync Hook] App 切换到前台，启动同步调度");
        self.scheduler.start().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventManager;
    use crate::lifecycle::LifecycleManager;
    use crate::sync::scheduler::test_helpers::CountingTarget;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_foreground_starts_and_background_stops() {
        let target = CountingTarget::new("products");
        let scheduler = Arc::new(SyncScheduler::new(
            vec![target.clone()],
            Duration::from_secs(10),
            Arc::new(EventManager::default()),
        ));
        let mut manager = LifecycleManager::new();
        manager.register_hook(Arc::new(SyncLifecycleHook::new(scheduler.clone())));

        manager.notify_foreground().await.unwrap();
        assert!(scheduler.is_running());
        assert_eq!(target.count(), 1);

        // 重复的前台通知不会再立即同步
        manager.notify_foreground().await.unwrap();
        assert_eq!(target.count(), 1);

        manager.notify_background().await.unwrap();
        assert!(!scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(target.count(), 1);
    }
}
