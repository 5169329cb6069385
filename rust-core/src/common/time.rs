//! Simple time helpers used by multiple services.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Current timestamp in milliseconds since the Unix epoch.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Directory name for a fresh pipeline run.
pub fn run_id() -> String {
    format!("run-{}", now_ms())
}

/// Milliseconds elapsed since `start`.
pub fn elapsed_ms(start: Instant) -> u128 {
    start.elapsed().as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_prefixed_timestamps() {
        let id = run_id();
        let stamp = id.strip_prefix("run-").unwrap();
        assert!(stamp.parse::<u128>().unwrap() > 0);
    }
}
