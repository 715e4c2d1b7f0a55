use chrono::Utc;

pub const HOUR: i64 = 1000 * 60 * 60;
pub const DAY: i64 = HOUR * 24;

/// Anchors used by the tests lie in the future so that the background
/// dispatcher never delivers them while a test runs.
pub fn future_ts(offset: i64) -> i64 {
    Utc::now().timestamp_millis() + 7 * DAY + offset
}
