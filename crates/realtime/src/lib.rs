/// Easy P2P Exchange - 实时客户端
/// 
/// 维护到交易所后端的 WebSocket 长连接，并把推送事件分发给订阅者

pub mod config;
pub mod countdown;
pub mod metrics;
pub mod ws;

pub use config::Config;
pub use countdown::TradeCountdown;
pub use metrics::RealtimeMetrics;
pub use ws::{
    listener, ConnectionManager, ConnectionState, Connector, Listener, ReconnectPolicy,
    WsConnector,
};
