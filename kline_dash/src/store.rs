use crate::market::Selection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One candlestick observation as received from the feed.
///
/// Prices stay as the decimal strings the feed sent; nothing here checks that
/// they parse or that `low <= open, close <= high`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    pub time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl PriceBar {
    pub fn new(
        time: i64,
        open: impl Into<String>,
        high: impl Into<String>,
        low: impl Into<String>,
        close: impl Into<String>,
    ) -> Self {
        Self {
            time,
            open: open.into(),
            high: high.into(),
            low: low.into(),
            close: close.into(),
        }
    }
}

/// symbol label -> interval code -> bars in arrival order.
///
/// Append-only. Repeated `time` values (partial then final candle updates)
/// are kept as separate entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetStore {
    series: BTreeMap<String, BTreeMap<String, Vec<PriceBar>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, pair: Selection, bar: PriceBar) {
        self.series
            .entry(pair.symbol.label().to_string())
            .or_default()
            .entry(pair.interval.code().to_string())
            .or_default()
            .push(bar);
    }

    pub fn read(&self, pair: Selection) -> &[PriceBar] {
        self.series
            .get(pair.symbol.label())
            .and_then(|by_interval| by_interval.get(pair.interval.code()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.bar_count() == 0
    }

    /// Number of (symbol, interval) sequences, including any loaded from a
    /// snapshot under keys the pickers don't offer.
    pub fn series_count(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    pub fn bar_count(&self) -> usize {
        self.series
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }
}
