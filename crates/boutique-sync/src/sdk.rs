//! SDK 主入口 - BoutiqueSDK
//!
//! 分层结构：
//! ```text
//! BoutiqueSDK (组装根)
//!   ├── HttpGateway (远端数据网关，base_url 启动时解析一次)
//!   ├── ResourceStore × 5 (商品、订单、分类、店铺设置、AI 开关)
//!   ├── SyncScheduler (固定间隔全量同步)
//!   ├── ConnectivityMonitor (网络恢复补同步)
//!   ├── LifecycleManager (前后台切换)
//!   ├── EventManager (状态变化通知)
//!   └── KvStore (偏好与快照缓存)
//! ```
//!
//! 所有组件显式构造并注入，没有全局单例。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::error::{BoutiqueSDKError, Result};
use crate::events::{EventManager, SDKEvent};
use crate::http_client::HttpGateway;
use crate::lifecycle::{LifecycleHook, LifecycleManager, SyncLifecycleHook};
use crate::models::{
    AiSettings, Category, Order, Product, StoreSettings, DEFAULT_LOW_STOCK_THRESHOLD,
};
use crate::network::{ConnectivityMonitor, NetworkReachability, NetworkStatusListener};
use crate::resource::Resource;
use crate::selectors::{dashboard_summary, DashboardSummary};
use crate::storage::{KvStore, UserPreferences};
use crate::store::ResourceStore;
use crate::sync::{Refreshable, SyncReport, SyncScheduler};

/// 运行环境
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Production,
    Development,
}

impl std::str::FromStr for Environment {
    type Err = BoutiqueSDKError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(BoutiqueSDKError::Config(format!("未知运行环境: {}", other))),
        }
    }
}

/// 客户端平台（仅影响开发环境下的服务器地址）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
    Web,
    Desktop,
}

/// 服务器地址配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 生产环境地址
    pub production_url: String,
    /// 开发环境地址
    pub development_url: String,
    /// Android 模拟器访问宿主机的地址
    pub android_emulator_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            production_url: "https://api.boutique.app".to_string(),
            development_url: "http://localhost:3000".to_string(),
            android_emulator_url: "http://10.0.2.2:3000".to_string(),
        }
    }
}

/// HTTP 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// 连接超时（秒）
    pub connect_timeout_secs: Option<u64>,
    /// 请求超时（秒），对所有请求统一生效
    pub request_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: Some(5),
            request_timeout_secs: 10,
        }
    }
}

/// Boutique SDK 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoutiqueConfig {
    pub environment: Environment,
    pub platform: Platform,
    pub server: ServerConfig,
    /// 显式指定服务器地址，优先于环境/平台推导
    pub api_url: Option<String>,
    pub http_client_config: HttpClientConfig,
    /// 后台同步间隔（秒）
    pub sync_interval_secs: u64,
    /// 数据存储目录（偏好与快照缓存）
    pub data_dir: PathBuf,
    /// 是否缓存资源快照用于冷启动展示
    pub persist_cache: bool,
    /// 事件广播缓冲区大小
    pub event_buffer_size: usize,
    pub debug_mode: bool,
}

impl Default for BoutiqueConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            platform: Platform::Desktop,
            server: ServerConfig::default(),
            api_url: None,
            http_client_config: HttpClientConfig::default(),
            sync_interval_secs: 10,
            data_dir: get_default_data_dir(),
            persist_cache: true,
            event_buffer_size: 256,
            debug_mode: false,
        }
    }
}

/// 获取默认数据目录 ~/.boutique/
fn get_default_data_dir() -> PathBuf {
    if let Some(home_dir) = std::env::var("HOME").ok().map(PathBuf::from) {
        home_dir.join(".boutique")
    } else if let Some(home_dir) = std::env::var("USERPROFILE").ok().map(PathBuf::from) {
        home_dir.join(".boutique")
    } else {
        PathBuf::from("./boutique_data")
    }
}

impl BoutiqueConfig {
    pub fn builder() -> BoutiqueConfigBuilder {
        BoutiqueConfigBuilder::new()
    }

    /// 默认配置叠加环境变量 `BOUTIQUE_API_URL`、`BOUTIQUE_ENV`
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(env) = lookup("BOUTIQUE_ENV") {
            config.environment = env.parse()?;
        }
        if let Some(url) = lookup("BOUTIQUE_API_URL").filter(|url| !url.trim().is_empty()) {
            config.api_url = Some(url);
        }
        Ok(config)
    }

    /// 解析出唯一的服务器地址
    pub fn resolve_base_url(&self) -> Result<String> {
        let url = match (&self.api_url, self.environment, self.platform) {
            (Some(url), _, _) => url.clone(),
            (None, Environment::Production, _) => self.server.production_url.clone(),
            (None, Environment::Development, Platform::Android) => {
                self.server.android_emulator_url.clone()
            }
            (None, Environment::Development, _) => self.server.development_url.clone(),
        };

        let url = url.trim().trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(BoutiqueSDKError::Config(format!(
                "服务器地址必须以 http:// 或 https:// 开头: {}",
                url
            )));
        }
        Ok(url)
    }

    fn validate(&self) -> Result<()> {
        if self.sync_interval_secs == 0 {
            return Err(BoutiqueSDKError::Config("sync_interval_secs 必须大于 0".into()));
        }
        if self.http_client_config.request_timeout_secs == 0 {
            return Err(BoutiqueSDKError::Config(
                "request_timeout_secs 必须大于 0".into(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(BoutiqueSDKError::Config("event_buffer_size 必须大于 0".into()));
        }
        self.resolve_base_url().map(|_| ())
    }
}

/// Boutique SDK 配置构建器
pub struct BoutiqueConfigBuilder {
    config: BoutiqueConfig,
}

impl BoutiqueConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: BoutiqueConfig::default(),
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.config.platform = platform;
        self
    }

    pub fn server_config(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    pub fn api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.api_url = Some(url.into());
        self
    }

    pub fn http_client_config(mut self, config: HttpClientConfig) -> Self {
        self.config.http_client_config = config;
        self
    }

    pub fn sync_interval_secs(mut self, secs: u64) -> Self {
        self.config.sync_interval_secs = secs;
        self
    }

    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.data_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn persist_cache(mut self, enabled: bool) -> Self {
        self.config.persist_cache = enabled;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size;
        self
    }

    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.config.debug_mode = enabled;
        self
    }

    pub fn build(self) -> BoutiqueConfig {
        self.config
    }
}

impl Default for BoutiqueConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// SDK 主接口
pub struct BoutiqueSDK {
    config: BoutiqueConfig,
    base_url: String,
    kv: KvStore,
    event_manager: Arc<EventManager>,
    products: Arc<ResourceStore<Product>>,
    orders: Arc<ResourceStore<Order>>,
    categories: Arc<ResourceStore<Category>>,
    settings: Arc<ResourceStore<StoreSettings>>,
    ai_settings: Arc<ResourceStore<AiSettings>>,
    scheduler: Arc<SyncScheduler>,
    connectivity: Arc<ConnectivityMonitor>,
    lifecycle_manager: Arc<RwLock<LifecycleManager>>,
}

impl BoutiqueSDK {
    /// 初始化 SDK
    ///
    /// 顺序：配置校验 → 网关 → 事件 → 存储 → Store → 调度器 → 网络监控 → 生命周期
    pub async fn initialize(config: BoutiqueConfig) -> Result<Arc<Self>> {
        if config.debug_mode {
            crate::utils::init_logging(true);
        }
        info!("正在初始化 BoutiqueSDK {}...", crate::version::SDK_VERSION);
        config.validate()?;

        // === 第1层：远端数据网关 ===
        let base_url = config.resolve_base_url()?;
        let gateway = Arc::new(HttpGateway::new(&config.http_client_config, base_url.clone())?);

        // === 第2层：事件管理器 ===
        let event_manager = Arc::new(EventManager::new(config.event_buffer_size));

        // === 第3层：本地存储 ===
        let kv = KvStore::new(&config.data_dir).await?;

        // === 第4层：资源 Store ===
        let products = Self::build_store::<Product>(&config, &gateway, &event_manager, &kv);
        let orders = Self::build_store::<Order>(&config, &gateway, &event_manager, &kv);
        let categories = Self::build_store::<Category>(&config, &gateway, &event_manager, &kv);
        let settings = Self::build_store::<StoreSettings>(&config, &gateway, &event_manager, &kv);
        let ai_settings = Self::build_store::<AiSettings>(&config, &gateway, &event_manager, &kv);

        if config.persist_cache {
            Self::hydrate(&products).await;
            Self::hydrate(&orders).await;
            Self::hydrate(&categories).await;
            Self::hydrate(&settings).await;
            Self::hydrate(&ai_settings).await;
        }

        // === 第5层：同步调度器 ===
        let targets: Vec<Arc<dyn Refreshable>> = vec![
            products.clone(),
            orders.clone(),
            categories.clone(),
            settings.clone(),
            ai_settings.clone(),
        ];
        let scheduler = Arc::new(SyncScheduler::new(
            targets,
            Duration::from_secs(config.sync_interval_secs),
            event_manager.clone(),
        ));

        // === 第6层：网络监控 ===
        let connectivity = Arc::new(ConnectivityMonitor::new(
            scheduler.clone(),
            event_manager.clone(),
        ));

        // === 第7层：生命周期 ===
        let mut lifecycle = LifecycleManager::new();
        lifecycle.register_hook(Arc::new(SyncLifecycleHook::new(scheduler.clone())));

        info!("✅ BoutiqueSDK 初始化完成 (base_url: {})", base_url);

        Ok(Arc::new(Self {
            config,
            base_url,
            kv,
            event_manager,
            products,
            orders,
            categories,
            settings,
            ai_settings,
            scheduler,
            connectivity,
            lifecycle_manager: Arc::new(RwLock::new(lifecycle)),
        }))
    }

    fn build_store<R: Resource>(
        config: &BoutiqueConfig,
        gateway: &Arc<HttpGateway>,
        events: &Arc<EventManager>,
        kv: &KvStore,
    ) -> Arc<ResourceStore<R>> {
        let store = ResourceStore::<R>::new(gateway.clone(), events.clone());
        if config.persist_cache {
            Arc::new(store.with_cache(kv.clone()))
        } else {
            Arc::new(store)
        }
    }

    async fn hydrate<R: Resource>(store: &ResourceStore<R>) {
        if let Err(e) = store.hydrate().await {
            warn!("⚠️ {} 快照缓存恢复失败（可忽略）: {}", R::KIND, e);
        }
    }

    // ========== 访问器 ==========

    pub fn config(&self) -> &BoutiqueConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn products(&self) -> &Arc<ResourceStore<Product>> {
        &self.products
    }

    pub fn orders(&self) -> &Arc<ResourceStore<Order>> {
        &self.orders
    }

    pub fn categories(&self) -> &Arc<ResourceStore<Category>> {
        &self.categories
    }

    pub fn settings(&self) -> &Arc<ResourceStore<StoreSettings>> {
        &self.settings
    }

    pub fn ai_settings(&self) -> &Arc<ResourceStore<AiSettings>> {
        &self.ai_settings
    }

    pub fn scheduler(&self) -> &Arc<SyncScheduler> {
        &self.scheduler
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn event_manager(&self) -> &Arc<EventManager> {
        &self.event_manager
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SDKEvent> {
        self.event_manager.subscribe()
    }

    // ========== 生命周期 ==========

    /// App 回到前台：启动同步调度（立即同步一轮）
    pub async fn on_foreground(&self) -> Result<()> {
        self.lifecycle_manager.read().await.notify_foreground().await
    }

    /// App 进入后台：停止同步调度
    pub async fn on_background(&self) -> Result<()> {
        self.lifecycle_manager.read().await.notify_background().await
    }

    /// 注册额外的生命周期 Hook
    pub async fn register_lifecycle_hook(&self, hook: Arc<dyn LifecycleHook>) {
        self.lifecycle_manager.write().await.register_hook(hook);
    }

    /// 手动触发一轮全量同步（例如下拉刷新）
    pub async fn refresh_all(&self) -> Option<SyncReport> {
        self.scheduler.refresh_all().await
    }

    // ========== 网络 ==========

    /// 接入平台网络监听器
    pub async fn start_network_monitoring(
        &self,
        listener: Arc<dyn NetworkStatusListener>,
    ) -> Result<()> {
        self.connectivity.start(listener).await
    }

    /// 平台直接上报一次可达性读数；返回是否触发了补同步
    pub async fn update_network(&self, reachability: NetworkReachability) -> bool {
        self.connectivity.update(reachability).await
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    // ========== 偏好 ==========

    pub async fn save_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.kv.save_preferences(preferences).await
    }

    pub async fn load_preferences(&self) -> Result<UserPreferences> {
        self.kv.load_preferences().await
    }

    // ========== 派生数据 ==========

    /// 首页概览，低库存阈值取店铺设置
    pub fn dashboard(&self) -> DashboardSummary {
        let threshold = self
            .settings
            .items()
            .first()
            .map(|s| s.low_stock_threshold)
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        dashboard_summary(&self.products.items(), &self.orders.items(), threshold)
    }

    /// 停止后台任务并刷盘
    pub async fn shutdown(&self) -> Result<()> {
        info!("正在关闭 BoutiqueSDK...");
        self.scheduler.stop();
        self.connectivity.stop().await;
        self.kv.flush().await?;
        info!("✅ BoutiqueSDK 已关闭");
        Ok(())
    }
}
