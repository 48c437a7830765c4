/// 指标收集器
/// 
/// 使用 prometheus 统计帧分发结果和重连次数

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// 实时通道指标
#[derive(Clone)]
pub struct RealtimeMetrics {
    registry: Registry,
    frames: IntCounterVec,
    reconnect_attempts: IntCounter,
}

impl RealtimeMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let frames = IntCounterVec::new(
            Opts::new("realtime_frames_total", "按分发结果统计的入站帧数量"),
            &["outcome"],
        )?;
        let reconnect_attempts = IntCounter::new(
            "realtime_reconnect_attempts_total",
            "已调度的重连次数",
        )?;

        registry.register(Box::new(frames.clone()))?;
        registry.register(Box::new(reconnect_attempts.clone()))?;

        Ok(Self {
            registry,
            frames,
            reconnect_attempts,
        })
    }

    /// 记录一次分发结果（delivered / unrouted / malformed）
    pub fn record_frame(&self, outcome: &str) {
        self.frames.with_label_values(&[outcome]).inc();
    }

    pub fn record_reconnect(&self) {
        self.reconnect_attempts.inc();
    }

    pub fn frame_count(&self, outcome: &str) -> u64 {
        self.frames.with_label_values(&[outcome]).get()
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_attempts.get()
    }

    /// 导出 prometheus 文本格式
    pub fn gather_text(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::warn!("导出指标失败: {}", e);
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_exported() {
        let metrics = RealtimeMetrics::new().unwrap();
        metrics.record_frame("delivered");
        metrics.record_frame("delivered");
        metrics.record_frame("malformed");
        metrics.record_reconnect();

        assert_eq!(metrics.frame_count("delivered"), 2);
        assert_eq!(metrics.frame_count("unrouted"), 0);
        assert_eq!(metrics.reconnect_count(), 1);

        let text = metrics.gather_text();
        assert!(text.contains("realtime_frames_total{outcome=\"malformed\"} 1"));
        assert!(text.contains("realtime_reconnect_attempts_total 1"));
    }
}
