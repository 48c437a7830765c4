/// 事件订阅注册表
/// 
/// 按事件名保存回调列表，插入顺序即调用顺序

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// 事件回调类型
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// 把闭包包装为回调
/// 
/// 调用方需要保留返回的 `Listener` 才能在之后注销
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// 事件订阅注册表
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    /// 事件名 -> 回调列表
    listeners: Arc<RwLock<HashMap<String, Vec<Listener>>>>,
}

impl ListenerRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加回调，不去重
    pub async fn add_event_listener(&self, name: impl Into<String>, listener: Listener) {
        let name = name.into();
        let mut listeners = self.listeners.write().await;
        let entry = listeners.entry(name.clone()).or_default();
        entry.push(listener);
        debug!("注册事件监听: event={}, count={}", name, entry.len());
    }

    /// 按引用相等注销回调
    /// 
    /// 同一个回调重复注册过的，全部移除；返回移除数量
    pub async fn remove_event_listener(&self, name: &str, listener: &Listener) -> usize {
        let mut listeners = self.listeners.write().await;
        let Some(entry) = listeners.get_mut(name) else {
            return 0;
        };

        let before = entry.len();
        entry.retain(|l| !same_listener(l, listener));
        let removed = before - entry.len();

        if entry.is_empty() {
            listeners.remove(name);
        }

        debug!("注销事件监听: event={}, removed={}", name, removed);
        removed
    }

    /// 取出某事件当前的回调快照
    pub async fn snapshot(&self, name: &str) -> Vec<Listener> {
        let listeners = self.listeners.read().await;
        listeners.get(name).cloned().unwrap_or_default()
    }

    /// 某事件的回调数量
    pub async fn listener_count(&self, name: &str) -> usize {
        let listeners = self.listeners.read().await;
        listeners.get(name).map(Vec::len).unwrap_or(0)
    }

    /// 清空所有回调
    pub async fn clear(&self) {
        let mut listeners = self.listeners.write().await;
        listeners.clear();
    }
}

// 只比较数据指针，同一闭包的 vtable 地址在不同编译单元中可能不同
fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
