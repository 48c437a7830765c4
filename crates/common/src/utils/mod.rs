/// 工具函数集合

use uuid::Uuid;

/// 生成唯一 ID
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// 格式化倒计时
/// 
/// 不足一小时显示 `MM:SS`，否则显示 `H:MM:SS`
pub fn format_countdown(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 验证 WebSocket 地址格式（简单验证）
pub fn validate_ws_url(url: &str) -> bool {
    let rest = match url
        .strip_prefix("ws://")
        .or_else(|| url.strip_prefix("wss://"))
    {
        Some(rest) => rest,
        None => return false,
    };

    let host = rest.split(['/', '?']).next().unwrap_or_default();
    !host.is_empty() && !host.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36); // UUID v4 格式
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(59), "00:59");
        assert_eq!(format_countdown(900), "15:00");
        assert_eq!(format_countdown(3725), "1:02:05");
    }

    #[test]
    fn test_validate_ws_url() {
        assert!(validate_ws_url("ws://localhost:8080/ws"));
        assert!(validate_ws_url("wss://api.example.com/socket?room=1"));
        assert!(!validate_ws_url("http://localhost:8080"));
        assert!(!validate_ws_url("ws://"));
        assert!(!validate_ws_url("ws:// bad host"));
        assert!(!validate_ws_url("invalid"));
    }
}
