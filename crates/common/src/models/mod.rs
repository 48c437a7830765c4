/// 共享数据模型
/// 
/// 定义交易所后端与客户端共享的数据结构

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// 交易状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Paid,
    Disputed,
    Released,
    Cancelled,
    Expired,
}

impl TradeStatus {
    /// 是否为终态（不再接收倒计时和状态推送）
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Cancelled | Self::Expired)
    }
}

/// 订单方向
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// 订单状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Matched,
    Completed,
    Cancelled,
}

/// 通知级别
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Warning,
    Error,
}

/// REST 接口统一响应信封
/// 
/// 后端返回 `{ error, data, message }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// 转换为结果类型
    /// 
    /// `error == true` 或缺少 `data` 时返回 `Error::Api`
    pub fn into_result(self) -> Result<T> {
        if self.error {
            return Err(Error::Api(
                self.message.unwrap_or_else(|| "未知错误".to_string()),
            ));
        }

        self.data
            .ok_or_else(|| Error::Api("响应缺少 data 字段".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let env: ApiEnvelope<Vec<u32>> =
            serde_json::from_value(json!({"error": false, "data": [1, 2, 3]})).unwrap();
        assert_eq!(env.into_result().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_envelope_error_message() {
        let env: ApiEnvelope<serde_json::Value> = serde_json::from_value(
            json!({"error": true, "message": "Insufficient balance"}),
        )
        .unwrap();
        match env.into_result() {
            Err(Error::Api(msg)) => assert_eq!(msg, "Insufficient balance"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_envelope_missing_data() {
        let env: ApiEnvelope<u32> = serde_json::from_value(json!({"error": false})).unwrap();
        assert!(matches!(env.into_result(), Err(Error::Api(_))));
    }

    #[test]
    fn test_trade_status_terminal() {
        assert!(TradeStatus::Released.is_terminal());
        assert!(TradeStatus::Expired.is_terminal());
        assert!(!TradeStatus::Paid.is_terminal());
        let status: TradeStatus = serde_json::from_value(json!("disputed")).unwrap();
        assert_eq!(status, TradeStatus::Disputed);
    }
}
