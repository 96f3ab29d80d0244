//! 时间工具函数
//!
//! 全部时间戳统一为 UTC Unix millis (`i64`)，service 层只处理 `i64`。

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
