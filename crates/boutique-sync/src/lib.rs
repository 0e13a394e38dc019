//! Boutique Sync - 精品店管理客户端的离线容忍本地状态同步层
//!
//! 本库提供：
//! - 📦 每种资源一个本地 Store：全量刷新、乐观写入、失败回滚
//! - 🔄 后台同步调度：前台启动、后台停止、固定间隔全量同步
//! - 📡 网络连通性监控：恢复在线时补同步
//! - 🔎 派生查询：分类、标签、价格区间、低库存、搜索
//! - ⚙️ 事件系统：Store 快照变化、连通性变化、同步周期
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use boutique_sync::{BoutiqueConfig, BoutiqueSDK, Environment, ProductFilter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BoutiqueConfig::builder()
//!         .environment(Environment::Development)
//!         .data_dir("/path/to/data")
//!         .build();
//!
//!     let sdk = BoutiqueSDK::initialize(config).await?;
//!
//!     // 回到前台：立即同步一轮，之后每 10 秒一轮
//!     sdk.on_foreground().await?;
//!
//!     let products = sdk.products().items();
//!     let filter = ProductFilter::new().category("dresses").tags(["summer"]);
//!     let summer_dresses = boutique_sync::selectors::select_filtered_products(&products, &filter);
//!     println!("{} summer dresses", summer_dresses.len());
//!
//!     sdk.on_background().await?;
//!     sdk.shutdown().await?;
//!     Ok(())
//! }
//! ```

// 导出核心模块
pub mod error;
pub mod events;
pub mod http_client;
pub mod lifecycle;
pub mod models;
pub mod network;
pub mod resource;
pub mod sdk;
pub mod selectors;
pub mod storage;
pub mod store;
pub mod sync;
pub mod utils;
pub mod version;

// 重新导出核心类型，方便使用
pub use error::{BoutiqueSDKError, Result};
pub use events::{EventManager, SDKEvent, StoreChange};
pub use http_client::{HttpGateway, ResourceApi};
pub use lifecycle::{AppState, LifecycleHook, LifecycleManager, SyncLifecycleHook};
pub use models::*;
pub use network::{
    ConnectivityEvent, ConnectivityMonitor, NetworkReachability, NetworkStatusListener,
};
pub use resource::{Resource, ResourceKind, SyncStatus, Toggleable};
pub use sdk::{
    BoutiqueConfig, BoutiqueConfigBuilder, BoutiqueSDK, Environment, HttpClientConfig, Platform,
    ServerConfig,
};
pub use selectors::{DashboardSummary, ProductFilter};
pub use storage::{KvStore, UserPreferences};
pub use store::{MutationOutcome, ResourceStore, StoreSnapshot};
pub use sync::{Refreshable, SyncReport, SyncScheduler};
pub use utils::init_logging;
pub use version::SDK_VERSION;
