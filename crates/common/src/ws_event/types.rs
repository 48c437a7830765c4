/// 实时事件数据类型定义
/// 
/// 每个已知 action 对应一个强类型载荷，未知或不匹配的帧落入 `Unknown`

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use super::Frame;
use crate::models::{NotificationLevel, OrderSide, OrderStatus, TradeStatus};

/// 已知的 action 名称
pub mod actions {
    pub const MESSAGE: &str = "message";
    pub const TRADE_UPDATE: &str = "trade_update";
    pub const ORDER_UPDATE: &str = "order_update";
    pub const NOTIFICATION: &str = "notification";
}

// ============================================================================
// 交易聊天
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

// ============================================================================
// 交易与订单
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeUpdate {
    pub trade_id: String,
    pub status: TradeStatus,
    /// 付款截止时间，交易房间倒计时以此为准
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderUpdate {
    pub order_id: String,
    pub side: OrderSide,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

// ============================================================================
// 系统通知
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub level: NotificationLevel,
}

/// 实时事件
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeEvent {
    Message(ChatMessage),
    TradeUpdate(TradeUpdate),
    OrderUpdate(OrderUpdate),
    Notification(Notification),
    /// 未知 action，或已知 action 但载荷不匹配
    Unknown(Frame),
}

impl ExchangeEvent {
    /// 从帧解码事件，失败时回退为 `Unknown`
    pub fn from_frame(frame: Frame) -> Self {
        match frame.action() {
            actions::MESSAGE => decode_or_unknown(frame, Self::Message),
            actions::TRADE_UPDATE => decode_or_unknown(frame, Self::TradeUpdate),
            actions::ORDER_UPDATE => decode_or_unknown(frame, Self::OrderUpdate),
            actions::NOTIFICATION => decode_or_unknown(frame, Self::Notification),
            _ => Self::Unknown(frame),
        }
    }

    /// 事件对应的 action 名称
    pub fn action(&self) -> &str {
        match self {
            Self::Message(_) => actions::MESSAGE,
            Self::TradeUpdate(_) => actions::TRADE_UPDATE,
            Self::OrderUpdate(_) => actions::ORDER_UPDATE,
            Self::Notification(_) => actions::NOTIFICATION,
            Self::Unknown(frame) => frame.action(),
        }
    }
}

fn decode_or_unknown<T, F>(frame: Frame, wrap: F) -> ExchangeEvent
where
    T: DeserializeOwned,
    F: FnOnce(T) -> ExchangeEvent,
{
    match serde_json::from_value::<T>(frame.payload_value()) {
        Ok(payload) => wrap(payload),
        Err(e) => {
            warn!("事件载荷不匹配: action={}, error={}", frame.action(), e);
            ExchangeEvent::Unknown(frame)
        }
    }
}
