use chrono::{Local, TimeZone};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::feed::ConnectionStatus;
use crate::market::Selection;
use crate::store::DatasetStore;

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub selection: Selection,
    pub store: DatasetStore,

    /// Id of the stream opened for `selection`; 0 before the first open.
    pub feed_stream: u64,
    /// Status of stream `feed_stream`; reports from older streams are ignored.
    pub feed_status: Option<ConnectionStatus>,
    pub bars_received: u64,
    pub status_message: String,
}

impl AppState {
    pub fn new(selection: Selection, store: DatasetStore) -> Self {
        Self {
            selection,
            store,
            ..Self::default()
        }
    }

    pub fn status_line(&self) -> String {
        let feed = self
            .feed_status
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "idle".to_string());
        let mut line = format!(
            "{} | feed: {} | bars: {} ({} this session)",
            self.selection.label(),
            feed,
            self.store.read(self.selection).len(),
            self.bars_received
        );
        if !self.status_message.is_empty() {
            line.push_str(" | ");
            line.push_str(&self.status_message);
        }
        line
    }
}

/// unix milliseconds
pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub fn format_time_local(ts_ms: i64) -> String {
    match Local.timestamp_millis_opt(ts_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format!("t={ts_ms}"),
    }
}

/// Axis tick label: local `HH:MM`.
pub fn format_clock_local(ts_ms: i64) -> String {
    match Local.timestamp_millis_opt(ts_ms).single() {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_labels_are_hours_and_minutes() {
        for ts_ms in [0, 1_700_000_000_000, 1_700_000_060_000] {
            let label = format_clock_local(ts_ms);
            assert_eq!(label.len(), 5, "{label}");
            assert_eq!(label.as_bytes()[2], b':');
            assert!(label.chars().filter(|c| *c != ':').all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn one_minute_apart_gives_different_labels() {
        assert_ne!(
            format_clock_local(1_700_000_000_000),
            format_clock_local(1_700_000_060_000)
        );
    }

    #[test]
    fn out_of_range_time_has_no_label() {
        assert_eq!(format_clock_local(i64::MAX), "");
    }
}
