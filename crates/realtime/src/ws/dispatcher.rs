/// 事件分发器
/// 
/// 解码入站帧，按 action 路由到已注册的回调

use common::{Frame, FrameError};
use tracing::{debug, warn};

use super::registry::ListenerRegistry;
use crate::metrics::RealtimeMetrics;

/// 单帧分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 已交给 n 个回调
    Delivered(usize),
    /// 没有回调订阅该 action
    Unrouted,
    /// 解码失败，已丢弃
    Malformed,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered(_) => "delivered",
            Self::Unrouted => "unrouted",
            Self::Malformed => "malformed",
        }
    }
}

/// 事件分发器
#[derive(Clone)]
pub struct EventDispatcher {
    registry: ListenerRegistry,
    metrics: Option<RealtimeMetrics>,
}

impl EventDispatcher {
    pub fn new(registry: ListenerRegistry) -> Self {
        Self {
            registry,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: RealtimeMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// 分发一条文本帧，任何错误都只记录日志
    pub async fn dispatch(&self, text: &str) -> DispatchOutcome {
        match Frame::from_json(text) {
            Ok(frame) => {
                let outcome = self.dispatch_frame(&frame).await;
                self.record(outcome);
                outcome
            }
            Err(e) => self.reject(&e),
        }
    }

    /// 丢弃传输层或解码阶段无法处理的帧
    pub fn reject(&self, err: &FrameError) -> DispatchOutcome {
        warn!("丢弃无法解析的帧: {}", err);
        self.record(DispatchOutcome::Malformed);
        DispatchOutcome::Malformed
    }

    fn record(&self, outcome: DispatchOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.record_frame(outcome.as_str());
        }
    }

    async fn dispatch_frame(&self, frame: &Frame) -> DispatchOutcome {
        // 先取快照再调用，回调内部可以继续注册或注销
        let listeners = self.registry.snapshot(frame.action()).await;
        if listeners.is_empty() {
            debug!("无监听者，丢弃帧: action={}", frame.action());
            return DispatchOutcome::Unrouted;
        }

        let payload = frame.payload_value();
        for listener in &listeners {
            listener(&payload);
        }

        debug!("帧已分发: action={}, listeners={}", frame.action(), listeners.len());
        DispatchOutcome::Delivered(listeners.len())
    }
}
