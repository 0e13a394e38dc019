//! 网络连通性监控
//!
//! 平台层通过 [`NetworkStatusListener`] 提供可达性读数，
//! [`ConnectivityMonitor`] 把读数归约为「有效在线」布尔值：
//! `is_connected && is_internet_reachable == Some(true)`，可达性未知按离线处理。
//! 从离线恢复到在线时，如果有 Store 离线或有未确认变更，触发一次全量同步。

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{event_builders, EventManager};
use crate::sync::SyncScheduler;

/// 平台上报的网络可达性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkReachability {
    pub is_connected: bool,
    /// `None` 表示平台尚未确定
    pub is_internet_reachable: Option<bool>,
}

impl NetworkReachability {
    pub fn online() -> Self {
        Self {
            is_connected: true,
            is_internet_reachable: Some(true),
        }
    }

    pub fn offline() -> Self {
        Self {
            is_connected: false,
            is_internet_reachable: Some(false),
        }
    }

    pub fn is_effectively_online(&self) -> bool {
        self.is_connected && self.is_internet_reachable == Some(true)
    }
}

/// 有效在线状态变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityEvent {
    pub was_online: bool,
    pub is_online: bool,
    pub reachability: NetworkReachability,
    pub timestamp: u64,
}

/// 网络状态监听器trait（由平台层实现，如 Android/iOS）
#[async_trait]
pub trait NetworkStatusListener: Send + Sync + std::fmt::Debug {
    /// 当前读数
    async fn current_reachability(&self) -> NetworkReachability;

    /// 开始监听，返回读数流
    async fn start_monitoring(&self) -> Result<broadcast::Receiver<NetworkReachability>>;

    /// 停止监听
    async fn stop_monitoring(&self);
}

/// 连通性监控
pub struct ConnectivityMonitor {
    scheduler: Arc<SyncScheduler>,
    events: Arc<EventManager>,
    status_sender: broadcast::Sender<ConnectivityEvent>,
    /// 首个读数之前为 `None`，此时视为在线
    online: Mutex<Option<bool>>,
    listener: Mutex<Option<Arc<dyn NetworkStatusListener>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectivityMonitor {
    pub fn new(scheduler: Arc<SyncScheduler>, events: Arc<EventManager>) -> Self {
        let (status_sender, _) = broadcast::channel(100);

        Self {
            scheduler,
            events,
            status_sender,
            online: Mutex::new(None),
            listener: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.lock().unwrap_or(true)
    }

    /// 订阅有效在线状态变化
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.status_sender.subscribe()
    }

    /// 处理一次可达性读数，返回是否触发了补同步
    pub async fn update(&self, reachability: NetworkReachability) -> bool {
        let is_online = reachability.is_effectively_online();
        let previous = self.online.lock().replace(is_online);
        let was_online = previous.unwrap_or(true);

        if previous == Some(is_online) {
            return false;
        }

        if was_online != is_online {
            info!(
                "🌐 网络状态变化: {} -> {}",
                if was_online { "online" } else { "offline" },
                if is_online { "online" } else { "offline" }
            );
            let event = ConnectivityEvent {
                was_online,
                is_online,
                reachability,
                timestamp: chrono::Utc::now().timestamp_millis().max(0) as u64,
            };
            // 无订阅者时 send 会失败，属正常场景
            let _ = self.status_sender.send(event);
            self.events
                .emit(event_builders::connectivity_changed(was_online, is_online))
                .await;
        }

        // 只有明确经历过离线才补同步
        if previous == Some(false) && is_online {
            if self.scheduler.needs_catch_up() {
                info!("🔄 网络恢复，补同步所有资源");
                return self.scheduler.refresh_all().await.is_some();
            }
            debug!("网络恢复，所有资源均已同步");
        }
        false
    }

    /// 接入平台监听器：先处理当前读数，再在后台任务中消费读数流
    pub async fn start(self: &Arc<Self>, listener: Arc<dyn NetworkStatusListener>) -> Result<()> {
        self.stop().await;

        let mut receiver = listener.start_monitoring().await?;
        let initial = listener.current_reachability().await;
        *self.listener.lock() = Some(listener);
        self.update(initial).await;

        let monitor: Weak<Self> = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(reading) => {
                        let Some(monitor) = monitor.upgrade() else {
                            break;
                        };
                        monitor.update(reading).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("网络读数积压，丢弃 {} 条", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("网络监听任务结束");
        });
        *self.task.lock() = Some(task);
        Ok(())
    }

    /// 停止监听
    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.stop_monitoring().await;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_helpers::ScriptedNetworkListener;
    use super::*;
    use crate::models::Product;
    use crate::store::test_helpers::{product, FakeApi};
    use crate::store::ResourceStore;
    use crate::sync::scheduler::test_helpers::CountingTarget;
    use crate::sync::Refreshable;
    use std::time::Duration;

    fn monitor_for(targets: Vec<Arc<dyn Refreshable>>) -> Arc<ConnectivityMonitor> {
        let events = Arc::new(EventManager::default());
        let scheduler = Arc::new(SyncScheduler::new(
            targets,
            Duration::from_secs(10),
            events.clone(),
        ));
        Arc::new(ConnectivityMonitor::new(scheduler, events))
    }

    #[test]
    fn test_effective_online() {
        assert!(NetworkReachability::online().is_effectively_online());
        assert!(!NetworkReachability::offline().is_effectively_online());
        let unknown = NetworkReachability {
            is_connected: true,
            is_internet_reachable: None,
        };
        assert!(!unknown.is_effectively_online());
        let captive = NetworkReachability {
            is_connected: true,
            is_internet_reachable: Some(false),
        };
        assert!(!captive.is_effectively_online());
    }

    #[tokio::test]
    async fn test_reconnect_refreshes_offline_store() {
        let api = FakeApi::new(vec![product("1", "A", 2)]);
        api.set_failing(true);
        let store = Arc::new(ResourceStore::<Product>::new(
            api.clone(),
            Arc::new(EventManager::default()),
        ));
        assert!(!store.refresh().await);
        assert!(!store.is_online());

        let monitor = monitor_for(vec![store.clone()]);
        assert!(!monitor.update(NetworkReachability::offline()).await);
        assert!(!monitor.is_online());

        api.set_failing(false);
        assert!(monitor.update(NetworkReachability::online()).await);

        assert_eq!(api.count("list"), 2);
        assert!(store.is_online());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_skips_when_everything_synced() {
        let target = CountingTarget::new("products");
        let monitor = monitor_for(vec![target.clone()]);

        monitor.update(NetworkReachability::offline()).await;
        assert!(!monitor.update(NetworkReachability::online()).await);
        assert_eq!(target.count(), 0);

        // 有未确认的本地变更时需要补同步
        target.pending.store(1, std::sync::atomic::Ordering::SeqCst);
        monitor.update(NetworkReachability::offline()).await;
        assert!(monitor.update(NetworkReachability::online()).await);
        assert_eq!(target.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_during_running_cycle_reports_no_catch_up() {
        let target = CountingTarget::slow("products", Duration::from_secs(5));
        target.online.store(false, std::sync::atomic::Ordering::SeqCst);
        let monitor = monitor_for(vec![target.clone()]);

        let cycle = {
            let scheduler = monitor.scheduler.clone();
            tokio::spawn(async move { scheduler.refresh_all().await })
        };
        tokio::task::yield_now().await;

        monitor.update(NetworkReachability::offline()).await;
        assert!(!monitor.update(NetworkReachability::online()).await);

        assert!(cycle.await.unwrap().is_some());
        assert_eq!(target.count(), 1);
    }

    #[tokio::test]
    async fn test_repeated_readings_do_not_broadcast() {
        let monitor = monitor_for(vec![]);
        let mut rx = monitor.subscribe();

        monitor.update(NetworkReachability::online()).await;
        monitor.update(NetworkReachability::online()).await;
        monitor.update(NetworkReachability::offline()).await;
        monitor.update(NetworkReachability::offline()).await;

        let event = rx.recv().await.unwrap();
        assert!(event.was_online);
        assert!(!event.is_online);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_listener_stream_drives_monitor() {
        let target = CountingTarget::new("orders");
        target.online.store(false, std::sync::atomic::Ordering::SeqCst);
        let monitor = monitor_for(vec![target.clone()]);
        let mut rx = monitor.subscribe();

        let listener = ScriptedNetworkListener::new(NetworkReachability::offline());
        monitor.start(listener.clone()).await.unwrap();
        assert!(!monitor.is_online());
        let went_offline = rx.recv().await.unwrap();
        assert!(!went_offline.is_online);

        listener.push(NetworkReachability::online());
        let back_online = rx.recv().await.unwrap();
        assert!(back_online.is_online);

        // 事件在补同步之前发出，等待后台任务完成
        for _ in 0..50 {
            if target.count() > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(target.count(), 1);

        monitor.stop().await;
    }
}
