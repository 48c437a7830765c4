/// 帧解码错误定义

use std::fmt;

/// 帧错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameErrorCode {
    /// 不是合法 JSON
    MalformedJson,
    /// 顶层不是对象
    NotAnObject,
    /// 缺少 action 字段
    MissingAction,
    /// action 不是字符串
    InvalidAction,
    /// 不支持的消息类型（非 UTF-8 的二进制帧）
    UnsupportedMessage,
}

impl FrameErrorCode {
    /// 转换为字符串码
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedJson => "MALFORMED_JSON",
            Self::NotAnObject => "NOT_AN_OBJECT",
            Self::MissingAction => "MISSING_ACTION",
            Self::InvalidAction => "INVALID_ACTION",
            Self::UnsupportedMessage => "UNSUPPORTED_MESSAGE",
        }
    }
}

impl fmt::Display for FrameErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 帧错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameError {
    pub code: FrameErrorCode,
    pub message: String,
}

impl FrameError {
    /// 创建新的帧错误
    pub fn new(code: FrameErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// JSON 解析失败
    pub fn malformed(err: impl fmt::Display) -> Self {
        Self::new(FrameErrorCode::MalformedJson, format!("JSON 解析失败: {}", err))
    }

    pub fn not_an_object() -> Self {
        Self::new(FrameErrorCode::NotAnObject, "帧必须是 JSON 对象")
    }

    pub fn missing_action() -> Self {
        Self::new(FrameErrorCode::MissingAction, "帧缺少 action 字段")
    }

    pub fn invalid_action() -> Self {
        Self::new(FrameErrorCode::InvalidAction, "action 字段必须是字符串")
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(FrameErrorCode::UnsupportedMessage, message)
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for FrameError {}

impl From<serde_json::Error> for FrameError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err)
    }
}
