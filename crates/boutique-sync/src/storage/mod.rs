//! 本地持久化边界
//!
//! 只持久化受限子集：用户偏好（语言、主题）与资源快照缓存。
//! 离线期间的变更不会写入这里。

pub mod kv;

pub use kv::KvStore;

use serde::{Deserialize, Serialize};

/// 跨进程保留的用户偏好
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// 语言，例如 `en`、`ar`
    pub locale: String,
    /// 主题，`light` / `dark` / `system`
    pub theme: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            theme: "system".to_string(),
        }
    }
}
