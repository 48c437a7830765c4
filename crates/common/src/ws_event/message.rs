/// 实时通道帧定义
/// 
/// 线上格式为文本 JSON：`{ "action": <string>, ...fields }`

use serde::Serialize;
use serde_json::{Map, Value};

use super::FrameError;

/// 事件帧
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Frame {
    /// 路由用的判别字段
    action: String,

    /// 除 action 外的其余字段，不含 action 键
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Frame {
    /// 创建事件帧
    /// 
    /// payload 不是对象时作为 `data` 字段携带，payload 中的 action 字段被丢弃
    pub fn new(action: impl Into<String>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(mut map) => {
                map.remove("action");
                map
            }
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };

        Self {
            action: action.into(),
            payload,
        }
    }

    /// 序列化为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 从 JSON 字符串解码
    pub fn from_json(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// 从 JSON 值解码
    pub fn from_value(value: Value) -> Result<Self, FrameError> {
        let mut map = match value {
            Value::Object(map) => map,
            _ => return Err(FrameError::not_an_object()),
        };

        match map.remove("action") {
            Some(Value::String(action)) => Ok(Self {
                action,
                payload: map,
            }),
            Some(_) => Err(FrameError::invalid_action()),
            None => Err(FrameError::missing_action()),
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// 载荷（不含 action）作为 JSON 对象
    pub fn payload_value(&self) -> Value {
        Value::Object(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws_event::FrameErrorCode;
    use serde_json::json;

    #[test]
    fn test_decode_strips_action() {
        let frame = Frame::from_json(r#"{"action":"message","text":"hi"}"#).unwrap();
        assert_eq!(frame.action(), "message");
        assert_eq!(frame.payload_value(), json!({"text": "hi"}));
    }

    #[test]
    fn test_decode_errors() {
        let cases = [
            ("not json", FrameErrorCode::MalformedJson),
            ("[1, 2]", FrameErrorCode::NotAnObject),
            (r#"{"text":"hi"}"#, FrameErrorCode::MissingAction),
            (r#"{"action":42}"#, FrameErrorCode::InvalidAction),
        ];
        for (text, code) in cases {
            assert_eq!(Frame::from_json(text).unwrap_err().code, code, "{}", text);
        }
    }

    #[test]
    fn test_encode_flattens_payload() {
        let frame = Frame::new("send_message", json!({"trade_id": "t-1", "text": "paid"}));
        let value: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"action": "send_message", "trade_id": "t-1", "text": "paid"})
        );
    }

    #[test]
    fn test_new_wraps_scalar_payload() {
        let frame = Frame::new("ping", json!(7));
        assert_eq!(frame.payload_value(), json!({"data": 7}));
        assert!(Frame::new("ping", Value::Null).payload().is_empty());
    }

    #[test]
    fn test_payload_action_key_dropped() {
        let frame = Frame::new("trade_update", json!({"action": "spoofed", "trade_id": "t-1"}));
        assert_eq!(frame.action(), "trade_update");
        assert!(!frame.payload().contains_key("action"));

        let text = frame.to_json().unwrap();
        assert_eq!(text.matches("\"action\"").count(), 1);
        assert_eq!(Frame::from_json(&text).unwrap(), frame);
    }
}
