/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Whole minutes elapsed between two millisecond timestamps, floored at zero
pub fn whole_minutes_between(earlier_ms: i64, later_ms: i64) -> i64 {
    (later_ms - earlier_ms).max(0) / 60_000
}
