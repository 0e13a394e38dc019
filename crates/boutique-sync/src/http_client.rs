//! 远端数据网关 - 按资源类型发起 REST 请求
//!
//! 本模块只负责「请求 → 响应 → 错误分类」：
//! - 固定请求超时，超时/传输失败 → `Network`
//! - 非 2xx → `Http { status, body }`（body 能解析为 JSON 时附带）
//! - 不重试、不缓存，容错全部在 Store 层

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{BoutiqueSDKError, Result};
use crate::resource::{Resource, ResourceKind};
use crate::sdk::HttpClientConfig;

/// 单个资源类型的远端接口
///
/// | 操作 | 方法 | 路径 |
/// |------|------|------|
/// | list | GET | `/api/<resource>` |
/// | get | GET | `/api/<resource>/{id}` |
/// | create | POST | `/api/<resource>` |
/// | update | PUT | `/api/<resource>/{id}` |
/// | delete | DELETE | `/api/<resource>/{id}` |
/// | toggle | POST | `/api/<resource>/toggle/{flag}` |
#[async_trait]
pub trait ResourceApi<R: Resource>: Send + Sync {
    async fn list(&self) -> Result<Vec<R>>;

    async fn get(&self, id: &str) -> Result<R>;

    async fn create(&self, draft: &R::Draft) -> Result<R>;

    async fn update(&self, id: &str, patch: &R::Patch) -> Result<R>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// 切换布尔开关，返回服务器回显的新状态
    async fn toggle(&self, flag: &str) -> Result<bool>;
}

/// 列表响应：数组、`{ data: [...] }`，或单个对象（设置类 bundle）
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Many(Vec<T>),
    Wrapped { data: Vec<T> },
    One(T),
}

impl<T> ListPayload<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListPayload::Many(items) | ListPayload::Wrapped { data: items } => items,
            ListPayload::One(item) => vec![item],
        }
    }
}

/// 单条记录响应：`{ data: {...} }` 或直接是记录
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordPayload<T> {
    Wrapped { data: T },
    Plain(T),
}

impl<T> RecordPayload<T> {
    fn into_inner(self) -> T {
        match self {
            RecordPayload::Wrapped { data } | RecordPayload::Plain(data) => data,
        }
    }
}

/// 开关切换响应
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleResponse {
    pub enabled: bool,
}

/// 基于 reqwest 的 HTTP 网关，所有资源共用一个实例
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// 创建网关；`base_url` 在启动时解析一次后注入
    pub fn new(config: &HttpClientConfig, base_url: impl Into<String>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(crate::version::user_agent());

        if let Some(timeout) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(timeout));
        }
        builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));

        let client = builder
            .build()
            .map_err(|e| BoutiqueSDKError::Config(format!("创建 HTTP 客户端失败: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("✅ HTTP 网关已创建 (base_url: {})", base_url);

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}/api/{}", self.base_url, kind.path())
    }

    fn record_url(&self, kind: ResourceKind, id: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, kind.path(), id)
    }

    fn toggle_url(&self, kind: ResourceKind, flag: &str) -> String {
        format!("{}/api/{}/toggle/{}", self.base_url, kind.path(), flag)
    }

    /// 发送请求并检查状态码
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            warn!("⚠️ {} 请求失败: {}", what, e);
            BoutiqueSDKError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .ok()
                .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok());
            warn!("❌ {} 返回 HTTP {}", what, status);
            return Err(BoutiqueSDKError::http(status.as_u16(), body));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("⚠️ 解析 {} 响应失败: {}", what, e);
            BoutiqueSDKError::from(e)
        })
    }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for HttpGateway {
    async fn list(&self) -> Result<Vec<R>> {
        let what = format!("list {}", R::KIND);
        debug!("GET {}", self.collection_url(R::KIND));
        let response = self
            .send(self.client.get(self.collection_url(R::KIND)), &what)
            .await?;
        let payload: ListPayload<R> = Self::decode(response, &what).await?;
        Ok(payload.into_vec())
    }

    async fn get(&self, id: &str) -> Result<R> {
        let what = format!("get {}/{}", R::KIND, id);
        let response = self
            .send(self.client.get(self.record_url(R::KIND, id)), &what)
            .await?;
        let payload: RecordPayload<R> = Self::decode(response, &what).await?;
        Ok(payload.into_inner())
    }

    async fn create(&self, draft: &R::Draft) -> Result<R> {
        let what = format!("create {}", R::KIND);
        let response = self
            .send(
                self.client.post(self.collection_url(R::KIND)).json(draft),
                &what,
            )
            .await?;
        let payload: RecordPayload<R> = Self::decode(response, &what).await?;
        Ok(payload.into_inner())
    }

    async fn update(&self, id: &str, patch: &R::Patch) -> Result<R> {
        let what = format!("update {}/{}", R::KIND, id);
        let response = self
            .send(
                self.client.put(self.record_url(R::KIND, id)).json(patch),
                &what,
            )
            .await?;
        let payload: RecordPayload<R> = Self::decode(response, &what).await?;
        Ok(payload.into_inner())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let what = format!("delete {}/{}", R::KIND, id);
        self.send(self.client.delete(self.record_url(R::KIND, id)), &what)
            .await?;
        Ok(())
    }

    async fn toggle(&self, flag: &str) -> Result<bool> {
        let what = format!("toggle {}/{}", R::KIND, flag);
        let response = self
            .send(self.client.post(self.toggle_url(R::KIND, flag)), &what)
            .await?;
        let payload: ToggleResponse = Self::decode(response, &what).await?;
        Ok(payload.enabled)
    }
}
