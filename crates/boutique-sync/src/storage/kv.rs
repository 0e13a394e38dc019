//! KV 存储模块 - 基于 sled 的本地持久化边界
//!
//! 本模块提供：
//! - 用户偏好（语言、主题）的持久化，跨进程重启保留
//! - 资源集合的最近一次全量快照缓存（仅用于冷启动展示，不是发件箱）

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sled::{Db, Tree};

use crate::error::{BoutiqueSDKError, Result};
use crate::resource::{Resource, ResourceKind};
use crate::storage::UserPreferences;

const TREE_NAME: &str = "boutique";

/// KV 存储组件
#[derive(Debug, Clone)]
pub struct KvStore {
    base_path: PathBuf,
    db: Arc<Db>,
    tree: Tree,
}

impl KvStore {
    /// 打开（或创建）`<base_path>/kv` 下的 sled 数据库
    pub async fn new(base_path: &Path) -> Result<Self> {
        let base_path = base_path.to_path_buf();
        let kv_path = base_path.join("kv");

        tokio::fs::create_dir_all(&kv_path).await?;

        // 上一个进程实例可能刚释放文件锁，重试多次带退避
        const MAX_OPEN_RETRIES: u32 = 5;
        const RETRY_DELAY_MS: u64 = 200;
        let mut db_opt: Option<sled::Db> = None;
        let mut last_err: Option<sled::Error> = None;
        for attempt in 0..MAX_OPEN_RETRIES {
            match sled::open(&kv_path) {
                Ok(d) => {
                    db_opt = Some(d);
                    break;
                }
                Err(e) => {
                    let msg = format!("{}", e);
                    last_err = Some(e);
                    let is_lock = msg.contains("could not acquire lock")
                        || msg.contains("Resource temporarily unavailable")
                        || msg.contains("WouldBlock");
                    if is_lock && attempt + 1 < MAX_OPEN_RETRIES {
                        let delay_ms = RETRY_DELAY_MS * (1 << attempt);
                        tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                    } else {
                        break;
                    }
                }
            }
        }
        let db = db_opt.ok_or_else(|| {
            BoutiqueSDKError::KvStore(
                last_err
                    .map(|e| format!("打开 sled 数据库失败: {}", e))
                    .unwrap_or_else(|| "打开 sled 数据库失败".to_string()),
            )
        })?;

        let tree = db
            .open_tree(TREE_NAME)
            .map_err(|e| BoutiqueSDKError::KvStore(format!("打开 Tree 失败: {}", e)))?;

        tracing::info!("✅ KV 存储已打开: {}", kv_path.display());

        Ok(Self {
            base_path,
            db: Arc::new(db),
            tree,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 设置键值对（JSON 编码）
    pub async fn set<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: Serialize,
    {
        let value_bytes = serde_json::to_vec(value)?;
        self.tree.insert(key, value_bytes)?;
        Ok(())
    }

    /// 获取键值对
    pub async fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: for<'de> Deserialize<'de>,
    {
        match self.tree.get(key)? {
            Some(value_bytes) => Ok(Some(serde_json::from_slice(&value_bytes)?)),
            None => Ok(None),
        }
    }

    /// 删除键值对，返回是否存在
    pub async fn delete<K>(&self, key: K) -> Result<bool>
    where
        K: AsRef<[u8]>,
    {
        Ok(self.tree.remove(key)?.is_some())
    }

    /// 检查键是否存在
    pub async fn exists<K>(&self, key: K) -> Result<bool>
    where
        K: AsRef<[u8]>,
    {
        Ok(self.tree.contains_key(key)?)
    }

    /// 刷盘
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    /// 保存用户偏好（语言、主题）
    pub async fn save_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.set(keys::PREFERENCES, preferences).await?;
        self.flush().await
    }

    /// 读取用户偏好，未保存过返回默认值
    pub async fn load_preferences(&self) -> Result<UserPreferences> {
        Ok(self.get(keys::PREFERENCES).await?.unwrap_or_default())
    }

    /// 缓存某资源的最近一次全量快照
    pub async fn save_collection<R: Resource>(&self, items: &[R]) -> Result<()> {
        self.set(keys::collection(R::KIND), &items).await
    }

    /// 读取缓存的资源快照
    pub async fn load_collection<R: Resource>(&self) -> Result<Option<Vec<R>>> {
        self.get(keys::collection(R::KIND)).await
    }
}

/// 常用的键
pub mod keys {
    use super::ResourceKind;

    /// 用户偏好
    pub const PREFERENCES: &str = "preferences";
    /// 资源快照缓存前缀
    pub const COLLECTION_CACHE: &str = "cache:";

    pub fn collection(kind: ResourceKind) -> String {
        format!("{}{}", COLLECTION_CACHE, kind.path())
    }
}
