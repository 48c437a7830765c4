/// WebSocket 事件模块
/// 
/// 定义实时通道上的帧格式、解码错误以及已知事件类型

pub mod message;
pub mod error;
pub mod types;

pub use message::Frame;
pub use error::{FrameError, FrameErrorCode};
pub use types::*;
