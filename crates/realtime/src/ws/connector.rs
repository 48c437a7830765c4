/// 传输层连接器
/// 
/// 把一次 WebSocket 连接拆成入站事件通道和出站文本通道，管理器只与通道交互

use async_trait::async_trait;
use common::utils::generate_id;
use common::{Error, FrameError, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

/// 传输层事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// 收到一条文本帧
    Frame(String),
    /// 收到无法作为文本解读的帧，链路仍可用
    Malformed(FrameError),
    /// 对端正常关闭
    Closed,
    /// 传输错误，链路不可再用
    Error(String),
}

/// 一条已建立的传输链路
pub struct TransportLink {
    /// 连接 ID，仅用于日志
    pub connection_id: String,

    /// 入站事件
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,

    /// 出站文本帧
    pub outbound: mpsc::UnboundedSender<String>,

    /// 接收任务句柄，链路释放时中止
    reader: Option<AbortHandle>,
}

impl TransportLink {
    pub fn new(
        inbound: mpsc::UnboundedReceiver<TransportEvent>,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            connection_id: generate_id(),
            inbound,
            outbound,
            reader: None,
        }
    }

    fn with_reader(mut self, reader: AbortHandle) -> Self {
        self.reader = Some(reader);
        self
    }
}

impl Drop for TransportLink {
    fn drop(&mut self) {
        // 出站通道随之关闭，发送任务会自行发出 Close 帧后退出
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        debug!("链路已释放: {}", self.connection_id);
    }
}

/// 连接器
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// 建立到 `url` 的连接
    async fn connect(&self, url: &str) -> Result<TransportLink>;
}

/// 基于 tokio-tungstenite 的 WebSocket 连接器
#[derive(Debug, Clone, Default)]
pub struct WsConnector {
    /// Bearer 令牌，握手时放入 Authorization 头
    auth_token: Option<String>,
}

impl WsConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth_token(token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
        }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<TransportLink> {
        let mut request = url.into_client_request()?;
        if let Some(token) = &self.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::Config(format!("无效的认证令牌: {}", e)))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws_stream, _) = connect_async(request).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<TransportEvent>();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        // 启动发送任务
        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = ws_sender.send(Message::Text(text)).await {
                    error!("发送消息失败: {}", e);
                    break;
                }
            }
            if let Err(e) = ws_sender.close().await {
                debug!("关闭连接失败: {}", e);
            }
            debug!("发送任务结束");
        });

        // 启动接收任务
        let reader = tokio::spawn(async move {
            while let Some(result) = ws_receiver.next().await {
                let event = match result {
                    Ok(Message::Text(text)) => TransportEvent::Frame(text),
                    Ok(Message::Binary(data)) => match String::from_utf8(data) {
                        Ok(text) => TransportEvent::Frame(text),
                        Err(e) => TransportEvent::Malformed(FrameError::unsupported(
                            format!("二进制帧不是合法 UTF-8: {}", e),
                        )),
                    },
                    Ok(Message::Close(frame)) => {
                        info!("收到连接关闭消息: {:?}", frame);
                        let _ = inbound_tx.send(TransportEvent::Closed);
                        return;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        error!("接收消息错误: {}", e);
                        let _ = inbound_tx.send(TransportEvent::Error(e.to_string()));
                        return;
                    }
                };

                if inbound_tx.send(event).is_err() {
                    debug!("入站通道已关闭");
                    return;
                }
            }
            let _ = inbound_tx.send(TransportEvent::Closed);
            debug!("接收任务结束");
        });

        let link = TransportLink::new(inbound_rx, outbound_tx).with_reader(reader.abort_handle());
        info!("✅ WebSocket 连接成功: url={}, connection_id={}", url, link.connection_id);
        Ok(link)
    }
}
