//! 同步调度器
//!
//! `start()` 先同步执行一轮全量刷新，再启动固定间隔的定时器；
//! `stop()` 只取消定时器，正在进行的一轮不会被中断。
//! 同一时刻最多一轮刷新，重叠的请求直接跳过。

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::Refreshable;
use crate::events::{event_builders, EventManager};

/// 一轮全量刷新的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 调度会话：运行标记、最近一次完成时间、定时器句柄
#[derive(Debug, Default)]
struct SyncSession {
    running: bool,
    /// 每次 start 递增，用于识别立即同步期间发生的 stop/start
    generation: u64,
    last_synced: Option<DateTime<Utc>>,
    timer: Option<JoinHandle<()>>,
}

/// 离开作用域时释放「正在刷新」标记
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SyncScheduler {
    targets: Vec<Arc<dyn Refreshable>>,
    interval: Duration,
    events: Arc<EventManager>,
    session: Mutex<SyncSession>,
    cycle_running: AtomicBool,
}

impl SyncScheduler {
    pub fn new(
        targets: Vec<Arc<dyn Refreshable>>,
        interval: Duration,
        events: Arc<EventManager>,
    ) -> Self {
        Self {
            targets,
            interval,
            events,
            session: Mutex::new(SyncSession::default()),
            cycle_running: AtomicBool::new(false),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn targets(&self) -> &[Arc<dyn Refreshable>] {
        &self.targets
    }

    pub fn is_running(&self) -> bool {
        self.session.lock().running
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.session.lock().last_synced
    }

    /// 是否有目标处于离线或存在未确认的变更
    pub fn needs_catch_up(&self) -> bool {
        self.targets.iter().any(|target| target.needs_catch_up())
    }

    /// 启动调度：立即同步一轮，然后按固定间隔重复。已在运行时为 no-op
    pub async fn start(self: &Arc<Self>) {
        let generation = {
            let mut session = self.session.lock();
            if session.running {
                debug!("同步调度已在运行，忽略 start");
                return;
            }
            session.running = true;
            session.generation += 1;
            session.generation
        };
        info!("🔄 同步调度已启动，间隔 {:?}", self.interval);

        self.refresh_all().await;

        let mut session = self.session.lock();
        if !session.running || session.generation != generation {
            debug!("立即同步期间调度已停止，不再启动定时器");
            return;
        }

        let weak = Arc::downgrade(self);
        let period = self.interval;
        session.timer = Some(tokio::spawn(Self::run_timer(weak, period)));
    }

    /// 停止调度；幂等，不中断正在进行的一轮
    pub fn stop(&self) {
        let mut session = self.session.lock();
        if let Some(timer) = session.timer.take() {
            timer.abort();
        }
        if session.running {
            session.running = false;
            info!("⏸️ 同步调度已停止");
        }
    }

    /// 并发刷新所有目标并等待全部结束；已有一轮在进行时返回 `None`
    pub async fn refresh_all(&self) -> Option<SyncReport> {
        if self
            .cycle_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("上一轮同步尚未结束，跳过");
            return None;
        }
        let _cycle = CycleGuard(&self.cycle_running);

        let results = join_all(self.targets.iter().map(|target| async move {
            (target.name().to_string(), target.refresh().await)
        }))
        .await;

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (name, ok) in results {
            if ok {
                succeeded.push(name);
            } else {
                failed.push(name);
            }
        }

        let completed_at = Utc::now();
        self.session.lock().last_synced = Some(completed_at);

        if failed.is_empty() {
            debug!("✅ 同步完成: {:?}", succeeded);
        } else {
            warn!("⚠️ 同步部分失败: 成功 {:?}，失败 {:?}", succeeded, failed);
        }

        self.events
            .emit(event_builders::sync_cycle_completed(
                succeeded.clone(),
                failed.clone(),
            ))
            .await;

        Some(SyncReport {
            succeeded,
            failed,
            completed_at,
        })
    }

    async fn run_timer(scheduler: Weak<Self>, period: Duration) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(scheduler) = scheduler.upgrade() else {
                break;
            };
            // 每轮放到独立任务里，stop() 取消定时器时不影响进行中的一轮
            tokio::spawn(async move {
                scheduler.refresh_all().await;
            });
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.session.get_mut().timer.take() {
            timer.abort();
        }
    }
}
