//! 日志初始化
//!
//! 宿主应用可以自行安装 subscriber；这里只提供一个开箱即用的 fmt 版本。

use tracing_subscriber::EnvFilter;

/// 安装 fmt subscriber，级别可通过 `RUST_LOG` 覆盖。
///
/// 重复调用是安全的，已安装时返回 false。
pub fn init_logging(debug_mode: bool) -> bool {
    let default_level = if debug_mode { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("boutique_sync={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
