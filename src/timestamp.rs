//! Process-wide timestamp helper so every component stamps records the
//! same way (Unix seconds, UTC).

/// Current time as Unix seconds.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Formats a Unix-seconds timestamp as `YYYYMMDDHHMMSS`, used by the
/// monotone request-id scheme.
#[must_use]
pub fn format_compact(unix_seconds: i64) -> String {
    chrono::DateTime::from_timestamp(unix_seconds, 0)
        .unwrap_or_default()
        .format("%Y%m%d%H%M%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_unix_seconds_is_positive() {
        assert!(now_unix_seconds() > 0);
    }

    #[test]
    fn test_format_compact() {
        // 2025-01-15 10:30:00 UTC
        let ts = 1_736_936_200;
        let formatted = format_compact(ts);
        assert_eq!(formatted.len(), 14);
        assert!(formatted.starts_with("2025"));
    }
}
