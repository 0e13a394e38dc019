//! 本地资源 Store
//!
//! 每种资源一个 [`ResourceStore`]，它是该资源快照的唯一持有者与修改者：
//! - `refresh`：全量拉取并整体替换快照
//! - `create` / `update` / `delete` / `toggle`：先乐观写入本地快照，再等待服务器确认，
//!   失败时回滚到写入前的快照
//! - 网络失败不会以错误形式返回给调用方，而是体现在 `is_online` / `error` 标记上
//!
//! 状态锁为 `parking_lot::RwLock`，只在同步代码段内持有，从不跨越 `.await`。

mod snapshot;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use snapshot::StoreSnapshot;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{BoutiqueSDKError, Result};
use crate::events::{event_builders, EventManager, StoreChange};
use crate::http_client::ResourceApi;
use crate::resource::{local_id, Resource, ResourceKind, SyncStatus, Toggleable};
use crate::storage::KvStore;
use crate::sync::Refreshable;

use snapshot::StoreState;

/// 一次乐观变更的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// 服务器已确认，快照中为服务器返回的记录
    Committed,
    /// 服务器拒绝或网络失败，快照已恢复到变更前
    RolledBack,
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed)
    }
}

/// 请求在途计数，离开作用域时自动递减
struct InFlight<'a, R: Resource> {
    state: &'a RwLock<StoreState<R>>,
}

impl<'a, R: Resource> InFlight<'a, R> {
    fn begin(state: &'a RwLock<StoreState<R>>) -> Self {
        state.write().in_flight += 1;
        Self { state }
    }
}

impl<R: Resource> Drop for InFlight<'_, R> {
    fn drop(&mut self) {
        let mut state = self.state.write();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

/// 单一资源的本地 Store
pub struct ResourceStore<R: Resource> {
    api: Arc<dyn ResourceApi<R>>,
    events: Arc<EventManager>,
    cache: Option<KvStore>,
    state: RwLock<StoreState<R>>,
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(api: Arc<dyn ResourceApi<R>>, events: Arc<EventManager>) -> Self {
        Self {
            api,
            events,
            cache: None,
            state: RwLock::new(StoreState::new()),
        }
    }

    /// 挂载快照缓存：刷新成功后写回，`hydrate` 时读取
    pub fn with_cache(mut self, cache: KvStore) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn kind(&self) -> ResourceKind {
        R::KIND
    }

    // ========== 读取 ==========

    pub fn snapshot(&self) -> StoreSnapshot<R> {
        self.state.read().snapshot()
    }

    pub fn items(&self) -> Vec<R> {
        self.state.read().items.clone()
    }

    pub fn get(&self, id: &str) -> Option<R> {
        self.state
            .read()
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    pub fn is_online(&self) -> bool {
        self.state.read().is_online
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.state.read().last_fetched
    }

    /// 单条记录的同步状态；未知 id 视为 `Synced`
    pub fn sync_status(&self, id: &str) -> SyncStatus {
        self.state.read().status(id)
    }

    /// 尚未被服务器确认的记录数
    pub fn pending_changes(&self) -> usize {
        self.state.read().pending_changes()
    }

    pub fn clear_error(&self) {
        self.state.write().error = None;
    }

    // ========== 全量刷新 ==========

    /// 全量拉取；成功时整体替换快照并返回 true
    pub async fn refresh(&self) -> bool {
        let result = {
            let _in_flight = InFlight::begin(&self.state);
            self.api.list().await
        };

        match result {
            Ok(items) => {
                let count = items.len();
                {
                    let mut state = self.state.write();
                    state.replace(items.clone());
                    state.is_online = true;
                    state.error = None;
                    state.last_fetched = Some(Utc::now());
                    state.has_fetched = true;
                }
                debug!("✅ {} 刷新完成: {} 条", R::KIND, count);

                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.save_collection(&items).await {
                        warn!("⚠️ 写入 {} 快照缓存失败: {}", R::KIND, e);
                    }
                }

                self.emit(StoreChange::Refreshed { count }).await;
                true
            }
            Err(e) => {
                {
                    let mut state = self.state.write();
                    state.is_online = false;
                    // 只有从未成功加载过时才提示用户
                    if !state.has_fetched {
                        state.error = Some(R::KIND.load_error_message());
                    }
                }
                match e.status() {
                    Some(status) => warn!("❌ {} 刷新失败: HTTP {}", R::KIND, status),
                    None if e.is_remote() => warn!("❌ {} 刷新失败: {}", R::KIND, e),
                    None => error!("❌ {} 刷新失败（本地错误）: {}", R::KIND, e),
                }
                self.emit(StoreChange::RefreshFailed {
                    error: e.to_string(),
                })
                .await;
                false
            }
        }
    }

    /// 拉取单条记录并合并进快照
    pub async fn fetch_one(&self, id: &str) -> bool {
        let result = {
            let _in_flight = InFlight::begin(&self.state);
            self.api.get(id).await
        };

        match result {
            Ok(record) => {
                let id = record.id().to_string();
                {
                    let mut state = self.state.write();
                    match state.position(&id) {
                        Some(index) => state.items[index] = record,
                        None => state.items.push(record),
                    }
                    state.set_status(&id, SyncStatus::Synced);
                    state.is_online = true;
                }
                self.emit(StoreChange::Committed { id }).await;
                true
            }
            Err(e) => {
                self.state.write().is_online = false;
                warn!("❌ {} 拉取 {} 失败: {}", R::KIND, id, e);
                false
            }
        }
    }

    /// 从快照缓存恢复；已经成功刷新过则不覆盖。返回恢复的条数
    pub async fn hydrate(&self) -> Result<usize> {
        let Some(cache) = &self.cache else {
            return Ok(0);
        };
        let Some(items) = cache.load_collection::<R>().await? else {
            return Ok(0);
        };

        let count = items.len();
        {
            let mut state = self.state.write();
            if state.has_fetched {
                return Ok(0);
            }
            state.replace(items);
        }
        info!("📦 {} 从缓存恢复 {} 条", R::KIND, count);
        self.emit(StoreChange::Hydrated { count }).await;
        Ok(count)
    }

    // ========== 变更 ==========

    /// 创建记录。网络失败时合成本地记录（临时 id），标记为 `PendingCreate`
    pub async fn create(&self, draft: R::Draft) -> Result<R> {
        R::validate_draft(&draft)?;

        let result = {
            let _in_flight = InFlight::begin(&self.state);
            self.api.create(&draft).await
        };

        match result {
            Ok(record) => {
                {
                    let mut state = self.state.write();
                    state.items.insert(0, record.clone());
                    state.set_status(record.id(), SyncStatus::Synced);
                    state.is_online = true;
                }
                info!("✅ {} 已创建: {}", R::KIND, record.id());
                self.emit(StoreChange::Created {
                    id: record.id().to_string(),
                    local: false,
                })
                .await;
                Ok(record)
            }
            Err(e) => {
                let record = R::from_draft(local_id(), draft, Utc::now());
                {
                    let mut state = self.state.write();
                    state.items.insert(0, record.clone());
                    state.set_status(record.id(), SyncStatus::PendingCreate);
                    state.is_online = false;
                }
                warn!("⚠️ {} 创建失败，已保留本地记录 {}: {}", R::KIND, record.id(), e);
                self.emit(StoreChange::Created {
                    id: record.id().to_string(),
                    local: true,
                })
                .await;
                Ok(record)
            }
        }
    }

    /// 局部更新。补丁立即可见，服务器拒绝时恢复变更前的快照
    pub async fn update(&self, id: &str, patch: R::Patch) -> Result<MutationOutcome> {
        R::validate_patch(&patch)?;

        let checkpoint = {
            let mut state = self.state.write();
            let index = state
                .position(id)
                .ok_or_else(|| BoutiqueSDKError::NotFound(format!("{} {}", R::KIND, id)))?;
            let checkpoint = state.checkpoint();
            let record = &mut state.items[index];
            record.apply_patch(&patch);
            record.touch(Utc::now());
            state.set_status(id, SyncStatus::PendingUpdate);
            checkpoint
        };
        self.emit(StoreChange::Applied { id: id.to_string() }).await;

        let result = {
            let _in_flight = InFlight::begin(&self.state);
            self.api.update(id, &patch).await
        };

        match result {
            Ok(record) => {
                {
                    let mut state = self.state.write();
                    if let Some(index) = state.position(id) {
                        state.items[index] = record;
                    }
                    state.set_status(id, SyncStatus::Synced);
                    state.is_online = true;
                }
                self.emit(StoreChange::Committed { id: id.to_string() }).await;
                Ok(MutationOutcome::Committed)
            }
            Err(e) => {
                {
                    let mut state = self.state.write();
                    state.restore(checkpoint);
                    state.error = Some(R::KIND.mutation_error_message("update"));
                    state.is_online = false;
                }
                warn!("↩️ {} 更新 {} 失败，已回滚: {}", R::KIND, id, e);
                self.emit(StoreChange::RolledBack {
                    id: id.to_string(),
                    error: e.to_string(),
                })
                .await;
                Ok(MutationOutcome::RolledBack)
            }
        }
    }

    /// 删除记录。立即从快照移除，失败时插回原位置
    pub async fn delete(&self, id: &str) -> Result<MutationOutcome> {
        let (index, removed, prior_status) = {
            let mut state = self.state.write();
            let index = state
                .position(id)
                .ok_or_else(|| BoutiqueSDKError::NotFound(format!("{} {}", R::KIND, id)))?;
            let removed = state.items.remove(index);
            let prior_status = state.status(id);
            state.set_status(id, SyncStatus::PendingDelete);
            (index, removed, prior_status)
        };
        self.emit(StoreChange::Removed { id: id.to_string() }).await;

        let result = {
            let _in_flight = InFlight::begin(&self.state);
            self.api.delete(id).await
        };

        match result {
            Ok(()) => {
                {
                    let mut state = self.state.write();
                    state.set_status(id, SyncStatus::Synced);
                    state.is_online = true;
                }
                self.emit(StoreChange::Committed { id: id.to_string() }).await;
                Ok(MutationOutcome::Committed)
            }
            Err(e) => {
                {
                    let mut state = self.state.write();
                    // 期间的全量刷新可能已把记录带回
                    if state.position(id).is_none() {
                        let index = index.min(state.items.len());
                        state.items.insert(index, removed);
                        state.set_status(id, prior_status);
                    }
                    state.error = Some(R::KIND.mutation_error_message("delete"));
                    state.is_online = false;
                }
                warn!("↩️ {} 删除 {} 失败，已恢复: {}", R::KIND, id, e);
                self.emit(StoreChange::RolledBack {
                    id: id.to_string(),
                    error: e.to_string(),
                })
                .await;
                Ok(MutationOutcome::RolledBack)
            }
        }
    }

    async fn emit(&self, change: StoreChange) {
        self.events
            .emit(event_builders::store_changed(R::KIND, change))
            .await;
    }
}

impl<R: Toggleable> ResourceStore<R> {
    /// 切换配置包上的布尔开关，以服务器返回的值为准
    pub async fn toggle(&self, flag: &str) -> Result<MutationOutcome> {
        if !R::FLAGS.iter().any(|known| *known == flag) {
            return Err(BoutiqueSDKError::validation(
                "flag",
                &format!("unknown flag {}", flag),
            ));
        }

        let (id, checkpoint) = {
            let mut state = self.state.write();
            let checkpoint = state.checkpoint();
            let record = state
                .items
                .first_mut()
                .ok_or_else(|| BoutiqueSDKError::NotFound(R::KIND.to_string()))?;
            let current = record.flag(flag).unwrap_or(false);
            record.set_flag(flag, !current);
            record.touch(Utc::now());
            let id = record.id().to_string();
            state.set_status(&id, SyncStatus::PendingUpdate);
            (id, checkpoint)
        };
        self.emit(StoreChange::Applied { id: id.clone() }).await;

        let result = {
            let _in_flight = InFlight::begin(&self.state);
            self.api.toggle(flag).await
        };

        match result {
            Ok(enabled) => {
                {
                    let mut state = self.state.write();
                    if let Some(index) = state.position(&id) {
                        state.items[index].set_flag(flag, enabled);
                    }
                    state.set_status(&id, SyncStatus::Synced);
                    state.is_online = true;
                }
                info!("✅ {} 开关 {} = {}", R::KIND, flag, enabled);
                self.emit(StoreChange::Committed { id }).await;
                Ok(MutationOutcome::Committed)
            }
            Err(e) => {
                {
                    let mut state = self.state.write();
                    state.restore(checkpoint);
                    state.error = Some(R::KIND.mutation_error_message("update"));
                    state.is_online = false;
                }
                warn!("↩️ {} 切换 {} 失败，已回滚: {}", R::KIND, flag, e);
                self.emit(StoreChange::RolledBack {
                    id,
                    error: e.to_string(),
                })
                .await;
                Ok(MutationOutcome::RolledBack)
            }
        }
    }
}

#[async_trait]
impl<R: Resource> Refreshable for ResourceStore<R> {
    fn name(&self) -> &str {
        R::KIND.as_str()
    }

    async fn refresh(&self) -> bool {
        ResourceStore::refresh(self).await
    }

    fn is_online(&self) -> bool {
        ResourceStore::is_online(self)
    }

    fn pending_changes(&self) -> usize {
        ResourceStore::pending_changes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::{product, FakeApi};
    use super::*;
    use crate::models::{
        AiSettings, AiSettingsDraft, Product, ProductDraft, ProductPatch, FLAG_AI_CHAT,
    };
    use tempfile::TempDir;

    fn store_with(api: Arc<FakeApi<Product>>) -> Arc<ResourceStore<Product>> {
        Arc::new(ResourceStore::new(api, Arc::new(EventManager::default())))
    }

    async fn loaded_store(
        records: Vec<Product>,
    ) -> (Arc<FakeApi<Product>>, Arc<ResourceStore<Product>>) {
        let api = FakeApi::new(records);
        let store = store_with(api.clone());
        assert!(store.refresh().await);
        (api, store)
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection() {
        let (api, store) = loaded_store(vec![product("1", "A", 3), product("2", "B", 4)]).await;
        assert_eq!(store.len(), 2);
        assert!(store.last_fetched().is_some());

        api.set_records(vec![product("3", "C", 1)]);
        assert!(store.refresh().await);

        let ids: Vec<String> = store.items().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["3".to_string()]);
        assert!(store.is_online());
        assert!(!store.is_loading());
        assert_eq!(store.pending_changes(), 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_snapshot() {
        let (api, store) = loaded_store(vec![product("1", "A", 3)]).await;
        let before = store.items();

        api.set_failing(true);
        assert!(!store.refresh().await);

        assert_eq!(store.items(), before);
        assert!(!store.is_online());
        // 之前成功加载过，不再提示
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_first_fetch_failure_sets_error() {
        let api = FakeApi::<Product>::new(vec![]);
        api.set_failing(true);
        let store = store_with(api.clone());

        assert!(!store.refresh().await);
        assert_eq!(store.error().as_deref(), Some("Failed to load products"));
        assert!(!store.is_online());

        store.clear_error();
        assert!(store.error().is_none());

        api.set_failing(false);
        assert!(store.refresh().await);
        assert!(store.is_online());
    }

    #[tokio::test]
    async fn test_optimistic_update_visible_before_confirmation() {
        let (api, store) = loaded_store(vec![product("1", "A", 3)]).await;
        let before = store.get("1").unwrap();
        api.set_server_patch(ProductPatch {
            name: Some("A (server)".into()),
            ..Default::default()
        });
        let gate = api.hold();

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.update("1", ProductPatch::quantity(9)).await })
        };
        api.entered().await;

        let pending = store.get("1").unwrap();
        assert_eq!(pending.quantity, 9);
        assert_eq!(pending.name, "A");
        assert!(pending.updated_at >= before.updated_at);
        assert_eq!(store.sync_status("1"), SyncStatus::PendingUpdate);
        assert!(store.is_loading());

        gate.add_permits(1);
        let outcome = task.await.unwrap().unwrap();

        assert_eq!(outcome, MutationOutcome::Committed);
        // 确认后以服务器返回的记录为准
        let committed = store.get("1").unwrap();
        assert_eq!(committed.quantity, 9);
        assert_eq!(committed.name, "A (server)");
        assert_eq!(store.sync_status("1"), SyncStatus::Synced);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_failed_update_restores_prior_snapshot() {
        let (api, store) = loaded_store(vec![product("1", "A", 3), product("2", "B", 4)]).await;
        let before = store.items();

        api.set_failing(true);
        let outcome = store.update("2", ProductPatch::quantity(0)).await.unwrap();

        assert_eq!(outcome, MutationOutcome::RolledBack);
        assert_eq!(store.items(), before);
        assert_eq!(store.sync_status("2"), SyncStatus::Synced);
        assert_eq!(store.error().as_deref(), Some("Failed to update products"));
        assert!(!store.is_online());
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_id_and_invalid_patch() {
        let (api, store) = loaded_store(vec![product("1", "A", 3)]).await;
        let before = store.snapshot();

        let err = store
            .update("missing", ProductPatch::quantity(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BoutiqueSDKError::NotFound(_)));

        let err = store
            .update("1", ProductPatch::quantity(-5))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert_eq!(store.snapshot(), before);
        assert_eq!(api.count("update"), 0);
    }

    #[tokio::test]
    async fn test_failed_delete_reinserts_at_original_index() {
        let (api, store) = loaded_store(vec![
            product("1", "A", 1),
            product("2", "B", 2),
            product("3", "C", 3),
        ])
        .await;
        let before = store.items();
        let gate = api.hold();
        api.set_failing(true);

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.delete("2").await })
        };
        api.entered().await;
        assert!(store.get("2").is_none());
        assert_eq!(store.sync_status("2"), SyncStatus::PendingDelete);

        gate.add_permits(1);
        let outcome = task.await.unwrap().unwrap();

        assert_eq!(outcome, MutationOutcome::RolledBack);
        assert_eq!(store.items(), before);
        assert_eq!(store.pending_changes(), 0);
        assert_eq!(store.error().as_deref(), Some("Failed to delete products"));
    }

    #[tokio::test]
    async fn test_failed_delete_after_refresh_keeps_single_copy() {
        let (api, store) = loaded_store(vec![
            product("1", "A", 1),
            product("2", "B", 2),
            product("3", "C", 3),
        ])
        .await;
        let gate = api.hold_only("delete");
        api.fail_only("delete");

        let task = {
            let store = store.clone();
            tokio::spawn(async move { store.delete("2").await })
        };
        api.entered().await;

        // 删除未确认时定时刷新把记录带回
        assert!(store.refresh().await);
        assert!(store.get("2").is_some());

        gate.add_permits(1);
        let outcome = task.await.unwrap().unwrap();

        assert_eq!(outcome, MutationOutcome::RolledBack);
        let ids: Vec<String> = store.items().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(store.sync_status("2"), SyncStatus::Synced);
        assert_eq!(store.pending_changes(), 0);
    }

    #[tokio::test]
    async fn test_delete_commits() {
        let (api, store) = loaded_store(vec![product("1", "A", 1), product("2", "B", 2)]).await;

        let outcome = store.delete("1").await.unwrap();
        assert!(outcome.is_committed());
        assert_eq!(store.len(), 1);
        assert_eq!(store.pending_changes(), 0);
        assert_eq!(api.calls().last().map(String::as_str), Some("delete:1"));
    }

    #[tokio::test]
    async fn test_create_prepends_server_record() {
        let (_api, store) = loaded_store(vec![product("1", "A", 1)]).await;

        let created = store
            .create(ProductDraft {
                name: "Silk scarf".into(),
                price: 25.0,
                quantity: 2,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created.id, "srv-1");
        assert_eq!(store.items()[0].id, "srv-1");
        assert_eq!(store.sync_status("srv-1"), SyncStatus::Synced);
    }

    #[tokio::test]
    async fn test_create_offline_keeps_local_record() {
        let (api, store) = loaded_store(vec![product("1", "A", 1)]).await;
        api.set_failing(true);

        let created = store
            .create(ProductDraft {
                name: "Silk scarf".into(),
                price: 25.0,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(crate::resource::is_local_id(&created.id));
        assert_eq!(store.items()[0], created);
        assert_eq!(store.sync_status(&created.id), SyncStatus::PendingCreate);
        assert_eq!(store.pending_changes(), 1);
        assert!(!store.is_online());

        // 下一次全量刷新以服务器为准，本地记录被替换
        api.set_failing(false);
        assert!(store.refresh().await);
        assert!(store.get(&created.id).is_none());
        assert_eq!(store.pending_changes(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_draft() {
        let (api, store) = loaded_store(vec![]).await;
        let err = store.create(ProductDraft::default()).await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty());
        assert_eq!(api.count("create"), 0);
    }

    #[tokio::test]
    async fn test_fetch_one_upserts() {
        let (api, store) = loaded_store(vec![product("1", "A", 1)]).await;
        let mut remote = product("1", "A", 7);
        remote.name = "A2".into();
        api.set_records(vec![remote, product("2", "B", 2)]);

        assert!(store.fetch_one("1").await);
        assert!(store.fetch_one("2").await);
        assert_eq!(store.get("1").unwrap().name, "A2");
        assert_eq!(store.len(), 2);

        assert!(!store.fetch_one("9").await);
        assert!(!store.is_online());
    }

    #[tokio::test]
    async fn test_toggle_uses_server_value() {
        let settings =
            AiSettings::from_draft("ai".into(), AiSettingsDraft::default(), Utc::now());
        let api = FakeApi::new(vec![settings]);
        let store =
            ResourceStore::<AiSettings>::new(api.clone(), Arc::new(EventManager::default()));
        assert!(store.refresh().await);
        assert!(!store.items()[0].ai_chat_enabled);

        // 服务端已是开启状态，本地乐观值为 true，回显为 false
        api.set_flag(FLAG_AI_CHAT, true);
        let outcome = store.toggle(FLAG_AI_CHAT).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Committed);
        assert!(!store.items()[0].ai_chat_enabled);

        api.set_failing(true);
        let outcome = store.toggle(FLAG_AI_CHAT).await.unwrap();
        assert_eq!(outcome, MutationOutcome::RolledBack);
        assert!(!store.items()[0].ai_chat_enabled);
        assert_eq!(store.error().as_deref(), Some("Failed to update AI settings"));

        assert!(store.toggle("ai_voice").await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_toggle_on_empty_store() {
        let api = FakeApi::<AiSettings>::new(vec![]);
        let store = ResourceStore::<AiSettings>::new(api, Arc::new(EventManager::default()));
        let err = store.toggle(FLAG_AI_CHAT).await.unwrap_err();
        assert!(matches!(err, BoutiqueSDKError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mutations_publish_events() {
        let api = FakeApi::new(vec![product("1", "A", 1)]);
        let events = Arc::new(EventManager::new(32));
        let mut rx = events.subscribe();
        let store = ResourceStore::<Product>::new(api.clone(), events);

        assert!(store.refresh().await);
        api.set_failing(true);
        store.update("1", ProductPatch::quantity(5)).await.unwrap();

        let mut changes = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let crate::events::SDKEvent::StoreChanged { change, .. } = event {
                changes.push(change);
            }
        }
        assert_eq!(changes[0], StoreChange::Refreshed { count: 1 });
        assert_eq!(changes[1], StoreChange::Applied { id: "1".into() });
        assert!(matches!(changes[2], StoreChange::RolledBack { .. }));
    }

    #[tokio::test]
    async fn test_hydrate_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let kv = KvStore::new(temp_dir.path()).await.unwrap();

        let api = FakeApi::new(vec![product("1", "A", 1), product("2", "B", 2)]);
        let store = ResourceStore::<Product>::new(api.clone(), Arc::new(EventManager::default()))
            .with_cache(kv.clone());
        assert!(store.refresh().await);

        // 新进程：服务器不可达，从缓存恢复
        let offline = FakeApi::<Product>::new(vec![]);
        offline.set_failing(true);
        let cold = ResourceStore::<Product>::new(offline, Arc::new(EventManager::default()))
            .with_cache(kv);
        assert_eq!(cold.hydrate().await.unwrap(), 2);
        assert_eq!(cold.len(), 2);
        assert!(cold.is_online());
        assert!(cold.last_fetched().is_none());
    }
}
