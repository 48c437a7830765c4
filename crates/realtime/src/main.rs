/// Easy P2P Exchange - 实时客户端
/// 
/// 连接交易所实时通道，打印聊天、交易和通知事件，Ctrl-C 退出

use common::ws_event::actions;
use common::{ExchangeEvent, Frame};
use realtime::{listener, Config, ConnectionManager, RealtimeMetrics, TradeCountdown, WsConnector};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenvy::dotenv().ok();
    let cfg = Config::from_env()?;

    // 初始化日志
    // 可以通过环境变量 RUST_LOG 设置日志级别，例如：
    // RUST_LOG=realtime=debug cargo run
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.log_level)),
        )
        .init();

    info!("🚀 启动 Easy P2P Exchange 实时客户端...");

    let metrics = RealtimeMetrics::new()?;
    let connector = match &cfg.auth_token {
        Some(token) => WsConnector::with_auth_token(token),
        None => WsConnector::new(),
    };

    let manager = ConnectionManager::new(
        cfg.ws_url.clone(),
        Arc::new(connector),
        cfg.reconnect_policy(),
        Some(metrics.clone()),
    );

    for action in [
        actions::MESSAGE,
        actions::TRADE_UPDATE,
        actions::ORDER_UPDATE,
        actions::NOTIFICATION,
    ] {
        manager
            .add_event_listener(action, listener(move |payload| log_event(action, payload)))
            .await;
    }

    info!("🎯 连接到: {}", cfg.ws_url);
    info!(
        "🔁 重连策略: 间隔 {}ms, 最多 {} 次",
        cfg.reconnect_delay_ms, cfg.max_reconnect_attempts
    );
    manager.connect();

    // 进入 Failed 后只记录，不自动恢复
    let mut transitions = manager.subscribe_state();
    let watcher = tokio::spawn(async move {
        while let Ok(state) = transitions.recv().await {
            if state == realtime::ConnectionState::Failed {
                warn!("⚠️ 实时通道已失效，需要手动重连");
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("收到退出信号，正在关闭...");

    manager.close().await;
    watcher.abort();
    info!("📊 指标:\n{}", metrics.gather_text());

    Ok(())
}

fn log_event(action: &str, payload: &Value) {
    let frame = Frame::new(action, payload.clone());
    match ExchangeEvent::from_frame(frame) {
        ExchangeEvent::Message(msg) => {
            info!(
                "💬 [{}] {}: {}",
                msg.trade_id.as_deref().unwrap_or("-"),
                msg.sender.as_deref().unwrap_or("system"),
                msg.text
            );
        }
        ExchangeEvent::TradeUpdate(update) => {
            info!("🔄 交易 {} 状态: {:?}", update.trade_id, update.status);
            if let (Some(deadline), false) = (update.expires_at, update.status.is_terminal()) {
                let countdown = TradeCountdown::new(update.trade_id, deadline);
                tokio::spawn(async move {
                    countdown
                        .run(Duration::from_secs(60), |left| {
                            info!(
                                "⏳ 交易 {} 剩余 {}",
                                countdown.trade_id,
                                common::utils::format_countdown(left.as_secs())
                            );
                        })
                        .await;
                });
            }
        }
        ExchangeEvent::OrderUpdate(update) => {
            info!(
                "📦 订单 {} ({:?}) 状态: {:?}",
                update.order_id, update.side, update.status
            );
        }
        ExchangeEvent::Notification(n) => {
            info!("🔔 [{:?}] {}: {}", n.level, n.title, n.message);
        }
        ExchangeEvent::Unknown(frame) => {
            warn!("未识别的事件: action={}", frame.action());
        }
    }
}
