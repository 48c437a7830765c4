/// 连接管理器
///
/// 维护到单个地址的尽力而为长连接：断线后按固定间隔重连，超过上限后进入 Failed。
/// 所有连接状态只在一个后台任务内修改，句柄通过命令通道与之交互。

use common::{Error, Frame, Result};
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use super::connector::{Connector, TransportEvent, TransportLink};
use super::dispatcher::EventDispatcher;
use super::registry::{Listener, ListenerRegistry};
use crate::metrics::RealtimeMetrics;

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    ReconnectWait,
    /// 重连次数耗尽，只有手动 connect/reconnect 才会恢复
    Failed,
}

/// 重连策略（固定间隔）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(5000),
            max_attempts: 5,
        }
    }
}

enum Command {
    Connect,
    Reconnect,
    Close(oneshot::Sender<()>),
    Send(String, oneshot::Sender<Result<()>>),
}

/// 连接管理器句柄
#[derive(Clone)]
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    state: Arc<RwLock<ConnectionState>>,
    transitions: broadcast::Sender<ConnectionState>,
    dispatcher: EventDispatcher,
}

impl ConnectionManager {
    /// 创建管理器并启动后台任务，初始状态为 Idle
    ///
    /// 必须在 tokio 运行时内调用。所有句柄释放后后台任务退出。
    pub fn new(
        url: impl Into<String>,
        connector: Arc<dyn Connector>,
        policy: ReconnectPolicy,
        metrics: Option<RealtimeMetrics>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (transitions, _) = broadcast::channel(64);
        let state = Arc::new(RwLock::new(ConnectionState::Idle));

        let mut dispatcher = EventDispatcher::new(ListenerRegistry::new());
        if let Some(metrics) = &metrics {
            dispatcher = dispatcher.with_metrics(metrics.clone());
        }

        let task = ManagerTask {
            url: url.into(),
            connector,
            policy,
            dispatcher: dispatcher.clone(),
            metrics,
            state: state.clone(),
            transitions: transitions.clone(),
            commands: commands_rx,
            link: None,
            retry_at: None,
            attempts: 0,
        };
        tokio::spawn(task.run());

        Self {
            commands: commands_tx,
            state,
            transitions,
            dispatcher,
        }
    }

    /// 开始连接；已在连接中或已连接时不做任何事
    pub fn connect(&self) {
        self.submit(Command::Connect);
    }

    /// 关闭当前连接并立即重连，重连计数清零
    pub fn reconnect(&self) {
        self.submit(Command::Reconnect);
    }

    /// 关闭连接并取消待执行的重连
    ///
    /// 返回时不会再有新的连接尝试
    pub async fn close(&self) {
        let (tx, rx) = oneshot::channel();
        self.submit(Command::Close(tx));
        let _ = rx.await;
    }

    /// 发送一条事件帧，连接未打开时返回 `Error::NotConnected`
    pub async fn send(&self, frame: &Frame) -> Result<()> {
        let text = frame.to_json()?;
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Send(text, tx))
            .map_err(|_| Error::ChannelClosed("连接管理任务已退出".to_string()))?;
        rx.await
            .map_err(|_| Error::ChannelClosed("连接管理任务已退出".to_string()))?
    }

    /// 获取当前状态
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// 订阅状态变化
    pub fn subscribe_state(&self) -> broadcast::Receiver<ConnectionState> {
        self.transitions.subscribe()
    }

    /// 等待进入指定状态
    pub async fn wait_for(&self, target: ConnectionState) -> Result<()> {
        let mut rx = self.transitions.subscribe();
        if self.state().await == target {
            return Ok(());
        }

        loop {
            match rx.recv().await {
                Ok(state) if state == target => return Ok(()),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    if self.state().await == target {
                        return Ok(());
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(Error::ChannelClosed("状态通道已关闭".to_string()));
                }
            }
        }
    }

    /// 注册事件回调
    ///
    /// 回调在管理任务内同步执行，不应阻塞
    pub async fn add_event_listener(&self, name: impl Into<String>, listener: Listener) {
        self.dispatcher.registry().add_event_listener(name, listener).await;
    }

    /// 注销事件回调（按引用相等）
    pub async fn remove_event_listener(&self, name: &str, listener: &Listener) -> usize {
        self.dispatcher.registry().remove_event_listener(name, listener).await
    }

    pub fn registry(&self) -> &ListenerRegistry {
        self.dispatcher.registry()
    }

    fn submit(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("连接管理任务已退出，命令被丢弃");
        }
    }
}

/// 后台任务，独占连接和重连计时器
struct ManagerTask {
    url: String,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    dispatcher: EventDispatcher,
    metrics: Option<RealtimeMetrics>,
    state: Arc<RwLock<ConnectionState>>,
    transitions: broadcast::Sender<ConnectionState>,
    commands: mpsc::UnboundedReceiver<Command>,
    link: Option<TransportLink>,
    retry_at: Option<Instant>,
    attempts: u32,
}

impl ManagerTask {
    async fn run(mut self) {
        loop {
            tokio::select! {
                // 命令优先，close 与计时器同时就绪时计时器不会触发
                biased;

                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        debug!("所有句柄已释放，连接管理任务退出");
                        self.link = None;
                        return;
                    }
                },
                event = next_event(&mut self.link) => {
                    self.handle_transport_event(event).await;
                }
                _ = retry_timer(self.retry_at) => {
                    self.retry_at = None;
                    self.attempt_connect().await;
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect => {
                let state = *self.state.read().await;
                match state {
                    ConnectionState::Idle | ConnectionState::Failed => {
                        self.attempts = 0;
                        self.attempt_connect().await;
                    }
                    other => debug!("当前状态 {:?}，忽略 connect", other),
                }
            }
            Command::Reconnect => {
                info!("手动重连: {}", self.url);
                self.link = None;
                self.attempts = 0;
                self.retry_at = Some(Instant::now());
                self.set_state(ConnectionState::ReconnectWait).await;
            }
            Command::Close(ack) => {
                self.shutdown_link().await;
                let _ = ack.send(());
            }
            Command::Send(text, reply) => {
                let _ = reply.send(self.send_text(text));
            }
        }
    }

    fn send_text(&self, text: String) -> Result<()> {
        match &self.link {
            Some(link) => link
                .outbound
                .send(text)
                .map_err(|_| Error::ChannelClosed("出站通道已关闭".to_string())),
            None => Err(Error::NotConnected),
        }
    }

    async fn shutdown_link(&mut self) {
        if self.link.take().is_some() {
            info!("连接已主动关闭: {}", self.url);
        }
        self.retry_at = None;
        self.attempts = 0;
        self.set_state(ConnectionState::Idle).await;
    }

    async fn attempt_connect(&mut self) {
        if self.link.is_some() {
            warn!("连接已存在，跳过本次连接");
            return;
        }

        self.set_state(ConnectionState::Connecting).await;
        info!("尝试连接: {}", self.url);

        let connector = self.connector.clone();
        let url = self.url.clone();
        let connecting = connector.connect(&url);
        tokio::pin!(connecting);

        // 连接过程中仍然响应命令，close/reconnect 会放弃本次连接
        let result = loop {
            tokio::select! {
                biased;

                cmd = self.commands.recv() => match cmd {
                    Some(Command::Close(ack)) => {
                        info!("连接过程中收到关闭请求，放弃本次连接");
                        self.shutdown_link().await;
                        let _ = ack.send(());
                        return;
                    }
                    Some(Command::Reconnect) => {
                        info!("连接过程中收到重连请求，重新开始");
                        self.attempts = 0;
                        self.retry_at = Some(Instant::now());
                        self.set_state(ConnectionState::ReconnectWait).await;
                        return;
                    }
                    Some(Command::Send(_, reply)) => {
                        let _ = reply.send(Err(Error::NotConnected));
                    }
                    Some(Command::Connect) => debug!("正在连接，忽略 connect"),
                    None => return,
                },
                result = &mut connecting => break result,
            }
        };

        match result {
            Ok(link) => {
                info!("✅ 连接已打开: connection_id={}", link.connection_id);
                self.link = Some(link);
                self.attempts = 0;
                self.set_state(ConnectionState::Open).await;
            }
            Err(e) => {
                error!("连接失败: {}", e);
                self.schedule_reconnect().await;
            }
        }
    }

    async fn handle_transport_event(&mut self, event: Option<TransportEvent>) {
        match event {
            Some(TransportEvent::Frame(text)) => {
                self.dispatcher.dispatch(&text).await;
            }
            Some(TransportEvent::Malformed(err)) => {
                self.dispatcher.reject(&err);
            }
            Some(TransportEvent::Error(e)) => {
                warn!("传输错误: {}", e);
                self.link = None;
                self.schedule_reconnect().await;
            }
            Some(TransportEvent::Closed) | None => {
                warn!("连接已断开: {}", self.url);
                self.link = None;
                self.schedule_reconnect().await;
            }
        }
    }

    async fn schedule_reconnect(&mut self) {
        if self.attempts >= self.policy.max_attempts {
            error!(
                "❌ 重连次数已达上限 ({})，停止重连: {}",
                self.policy.max_attempts, self.url
            );
            self.retry_at = None;
            self.set_state(ConnectionState::Failed).await;
            return;
        }

        self.attempts += 1;
        if let Some(metrics) = &self.metrics {
            metrics.record_reconnect();
        }
        warn!(
            "{}ms 后进行第 {}/{} 次重连...",
            self.policy.delay.as_millis(),
            self.attempts,
            self.policy.max_attempts
        );
        self.retry_at = Some(Instant::now() + self.policy.delay);
        self.set_state(ConnectionState::ReconnectWait).await;
    }

    async fn set_state(&self, next: ConnectionState) {
        {
            let mut state = self.state.write().await;
            if *state == next {
                return;
            }
            debug!("状态变化: {:?} -> {:?}", *state, next);
            *state = next;
        }
        let _ = self.transitions.send(next);
    }
}

async fn next_event(link: &mut Option<TransportLink>) -> Option<TransportEvent> {
    match link {
        Some(link) => link.inbound.recv().await,
        None => pending().await,
    }
}

async fn retry_timer(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}
