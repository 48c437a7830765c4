/// Easy P2P Exchange - 公共库
/// 
/// 提供实时客户端共享的类型、错误处理、工具函数等

pub mod errors;
pub mod models;
pub mod utils;
pub mod ws_event;

// 重新导出常用类型
pub use errors::{Error, Result};
pub use ws_event::{ExchangeEvent, Frame, FrameError, FrameErrorCode};
