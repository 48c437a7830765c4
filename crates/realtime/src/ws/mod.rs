/// WebSocket 实时通道模块
/// 
/// 连接管理、事件分发和订阅注册

pub mod connector;
pub mod dispatcher;
pub mod manager;
pub mod registry;

pub use connector::{Connector, TransportEvent, TransportLink, WsConnector};
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use manager::{ConnectionManager, ConnectionState, ReconnectPolicy};
pub use registry::{listener, Listener, ListenerRegistry};
