//! 测试用的内存 `ResourceApi`

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, Semaphore};

use crate::error::{BoutiqueSDKError, Result};
use crate::http_client::ResourceApi;
use crate::models::{Product, ProductDraft};
use crate::resource::Resource;

/// 可编排的内存服务端：记录调用、可切换失败、可挂起请求
pub struct FakeApi<R: Resource> {
    records: Mutex<Vec<R>>,
    flags: Mutex<HashMap<String, bool>>,
    failing: AtomicBool,
    /// 只让这些操作失败；为空时看 `failing`
    failing_ops: Mutex<Vec<String>>,
    /// 挂起的操作（`None` 表示全部）及其信号量
    gate: Mutex<Option<(Option<String>, Arc<Semaphore>)>>,
    /// 服务端在客户端补丁之后额外改写的字段
    server_patch: Mutex<Option<R::Patch>>,
    entered: Notify,
    calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl<R: Resource> FakeApi<R> {
    pub fn new(records: Vec<R>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            flags: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            failing_ops: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
            server_patch: Mutex::new(None),
            entered: Notify::new(),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 只让指定操作失败，其余照常
    pub fn fail_only(&self, op: &str) {
        self.failing_ops.lock().push(op.to_string());
    }

    pub fn set_server_patch(&self, patch: R::Patch) {
        *self.server_patch.lock() = Some(patch);
    }

    pub fn set_records(&self, records: Vec<R>) {
        *self.records.lock() = records;
    }

    pub fn set_flag(&self, name: &str, value: bool) {
        self.flags.lock().insert(name.to_string(), value);
    }

    /// 之后的请求都会挂起，直到返回的信号量被释放许可
    pub fn hold(&self) -> Arc<Semaphore> {
        self.gate_with(None)
    }

    /// 只挂起指定操作
    pub fn hold_only(&self, op: &str) -> Arc<Semaphore> {
        self.gate_with(Some(op.to_string()))
    }

    fn gate_with(&self, op: Option<String>) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some((op, gate.clone()));
        gate
    }

    /// 等待某个请求在 `hold` 之后到达服务端
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.split(':').next() == Some(op))
            .count()
    }

    async fn enter(&self, call: String) -> Result<()> {
        let op = call.split(':').next().unwrap_or_default().to_string();
        self.calls.lock().push(call);
        let gate = self.gate.lock().clone().and_then(|(only, gate)| match only {
            Some(only) if only != op => None,
            _ => Some(gate),
        });
        if let Some(gate) = gate {
            self.entered.notify_one();
            gate.acquire()
                .await
                .map_err(BoutiqueSDKError::network)?
                .forget();
        }
        if self.failing.load(Ordering::SeqCst) || self.failing_ops.lock().contains(&op) {
            return Err(BoutiqueSDKError::network("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for FakeApi<R> {
    async fn list(&self) -> Result<Vec<R>> {
        self.enter("list".to_string()).await?;
        Ok(self.records.lock().clone())
    }

    async fn get(&self, id: &str) -> Result<R> {
        self.enter(format!("get:{}", id)).await?;
        self.records
            .lock()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| BoutiqueSDKError::http(404, None))
    }

    async fn create(&self, draft: &R::Draft) -> Result<R> {
        self.enter("create".to_string()).await?;
        let id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = R::from_draft(id, draft.clone(), chrono::Utc::now());
        self.records.lock().insert(0, record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &R::Patch) -> Result<R> {
        self.enter(format!("update:{}", id)).await?;
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| BoutiqueSDKError::http(404, None))?;
        record.apply_patch(patch);
        if let Some(server_patch) = self.server_patch.lock().as_ref() {
            record.apply_patch(server_patch);
        }
        record.touch(chrono::Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.enter(format!("delete:{}", id)).await?;
        self.records.lock().retain(|record| record.id() != id);
        Ok(())
    }

    async fn toggle(&self, flag: &str) -> Result<bool> {
        self.enter(format!("toggle:{}", flag)).await?;
        let mut flags = self.flags.lock();
        let value = flags.entry(flag.to_string()).or_insert(false);
        *value = !*value;
        Ok(*value)
    }
}

pub fn product(id: &str, name: &str, quantity: i64) -> Product {
    Product::from_draft(
        id.to_string(),
        ProductDraft {
            name: name.to_string(),
            price: 50.0,
            quantity,
            category: "dresses".to_string(),
            ..Default::default()
        },
        chrono::Utc::now(),
    )
}
