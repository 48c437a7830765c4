/// 配置管理

use common::utils::validate_ws_url;
use common::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::ws::ReconnectPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ws_url: String,
    pub auth_token: Option<String>,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub log_level: String,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置，便于测试
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ws_url = lookup("EXCHANGE_WS_URL")
            .unwrap_or_else(|| "ws://localhost:8080/ws".to_string());
        if !validate_ws_url(&ws_url) {
            return Err(Error::Config(format!("无效的 WebSocket 地址: {}", ws_url)));
        }

        let auth_token = lookup("EXCHANGE_AUTH_TOKEN").filter(|t| !t.trim().is_empty());

        let reconnect_delay_ms = parse_var(&lookup, "RECONNECT_DELAY_MS", 5000)?;
        let max_reconnect_attempts = parse_var(&lookup, "MAX_RECONNECT_ATTEMPTS", 5)?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            ws_url,
            auth_token,
            reconnect_delay_ms,
            max_reconnect_attempts,
            log_level,
        })
    }

    /// 重连策略
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(self.reconnect_delay_ms),
            max_attempts: self.max_reconnect_attempts,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} 解析失败: {}", key, e))),
        None => Ok(default),
    }
}
