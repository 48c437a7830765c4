/// 交易房间倒计时
/// 
/// 纯客户端时钟，截止时间以服务端推送的 `expires_at` 为准

use chrono::{DateTime, Utc};
use common::utils::format_countdown;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeCountdown {
    pub trade_id: String,
    pub deadline: DateTime<Utc>,
}

impl TradeCountdown {
    pub fn new(trade_id: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            trade_id: trade_id.into(),
            deadline,
        }
    }

    /// 剩余时间，过期后为零
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.deadline - now).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    /// 显示用的剩余时间，秒向上取整
    pub fn display(&self, now: DateTime<Utc>) -> String {
        let remaining = self.remaining(now);
        let mut secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs += 1;
        }
        format_countdown(secs)
    }

    /// 按固定间隔回调剩余时间，直到过期
    /// 
    /// 最后一次回调的剩余时间为零
    pub async fn run<F>(&self, tick: Duration, mut on_tick: F)
    where
        F: FnMut(Duration),
    {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let now = Utc::now();
            on_tick(self.remaining(now));
            if self.is_expired(now) {
                debug!("交易倒计时结束: trade_id={}", self.trade_id);
                return;
            }
        }
    }
}
