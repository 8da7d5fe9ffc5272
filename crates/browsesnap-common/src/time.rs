/// Milliseconds since the Unix epoch, as carried in every wire message.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
