//! Candlestick plot model.
//!
//! The renderer owns at most one built plot per canvas. Every render tears
//! the old plot down before building a new one from the full slice; there is
//! no incremental append. The UI layer only draws what is attached here.

use crate::store::PriceBar;

/// One drawable candle. `x` is the bar open time in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleGlyph {
    pub x: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Finite price or nothing; `"inf"` and `"NaN"` parse as f64 but can't be drawn.
fn price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl CandleGlyph {
    fn from_bar(bar: &PriceBar) -> Option<Self> {
        Some(Self {
            x: bar.time as f64 / 1000.0,
            open: price(&bar.open)?,
            high: price(&bar.high)?,
            low: price(&bar.low)?,
            close: price(&bar.close)?,
        })
    }

    pub fn rising(&self) -> bool {
        self.close >= self.open
    }
}

/// A built plot, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleChart {
    pub label: String,
    pub candles: Vec<CandleGlyph>,
    pub y_min: f64,
    pub y_max: f64,
    pub last_time_ms: i64,
}

impl CandleChart {
    /// `None` when no bar has finite OHLC values.
    pub fn build(label: &str, bars: &[PriceBar]) -> Option<Self> {
        // time of the last bar that actually made it into the plot
        let mut last_time_ms = 0;
        let candles: Vec<CandleGlyph> = bars
            .iter()
            .filter_map(|bar| {
                let glyph = CandleGlyph::from_bar(bar)?;
                last_time_ms = bar.time;
                Some(glyph)
            })
            .collect();
        if candles.len() < bars.len() {
            tracing::debug!(
                label,
                skipped = bars.len() - candles.len(),
                "bars with non-finite prices left out of the plot"
            );
        }
        if candles.is_empty() {
            return None;
        }

        let lo = candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let hi = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let span = (hi - lo).max(1e-9);
        let pad = span * 0.05;

        Some(Self {
            label: label.to_string(),
            candles,
            y_min: lo - pad,
            y_max: hi + pad,
            last_time_ms,
        })
    }

    pub fn last(&self) -> Option<&CandleGlyph> {
        self.candles.last()
    }
}

/// `NoChart --construct--> Attached --destroy--> NoChart`
#[derive(Debug, Default)]
pub struct ChartRenderer {
    attached: Option<CandleChart>,
    constructed: u64,
    destroyed: u64,
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, label: &str, bars: &[PriceBar]) {
        self.destroy();
        if let Some(chart) = CandleChart::build(label, bars) {
            self.attached = Some(chart);
            self.constructed += 1;
        }
    }

    pub fn destroy(&mut self) {
        if self.attached.take().is_some() {
            self.destroyed += 1;
        }
    }

    pub fn chart(&self) -> Option<&CandleChart> {
        self.attached.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn constructed(&self) -> u64 {
        self.constructed
    }

    pub fn destroyed(&self) -> u64 {
        self.destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars() -> Vec<PriceBar> {
        vec![
            PriceBar::new(60_000, "100", "110", "90", "105"),
            PriceBar::new(120_000, "105", "106", "95", "96"),
        ]
    }

    #[test]
    fn empty_slice_draws_nothing() {
        let mut r = ChartRenderer::new();
        r.render("ETH/USDT - 1m", &[]);
        assert!(r.chart().is_none());
        assert_eq!(r.constructed(), 0);
        assert_eq!(r.destroyed(), 0);
    }

    #[test]
    fn rerender_tears_down_first_and_keeps_same_data() {
        let mut r = ChartRenderer::new();
        let data = bars();

        r.render("ETH/USDT - 1m", &data);
        let first = r.chart().cloned().unwrap();
        r.render("ETH/USDT - 1m", &data);

        assert_eq!(r.chart(), Some(&first));
        assert_eq!(first.candles.len(), 2);
        assert_eq!(r.constructed(), 2);
        assert_eq!(r.destroyed(), 1);
    }

    #[test]
    fn switching_to_empty_slice_clears_the_canvas() {
        let mut r = ChartRenderer::new();
        r.render("a", &bars());
        r.render("b", &[]);
        assert!(!r.is_attached());
        assert_eq!(r.destroyed(), 1);
    }

    #[test]
    fn geometry_uses_seconds_and_padded_bounds() {
        let chart = CandleChart::build("x", &bars()).unwrap();
        assert_eq!(chart.candles[0].x, 60.0);
        assert!(chart.candles[0].rising());
        assert!(!chart.candles[1].rising());
        assert!((chart.y_min - 89.0).abs() < 1e-9);
        assert!((chart.y_max - 111.0).abs() < 1e-9);
        assert_eq!(chart.last_time_ms, 120_000);
    }

    #[test]
    fn non_numeric_bars_are_skipped() {
        let mut data = bars();
        data.push(PriceBar::new(180_000, "n/a", "1", "1", "1"));
        let chart = CandleChart::build("x", &data).unwrap();
        assert_eq!(chart.candles.len(), 2);

        assert!(CandleChart::build("x", &[PriceBar::new(1, "", "", "", "")]).is_none());
    }

    #[test]
    fn infinite_and_nan_prices_are_skipped() {
        let mut data = bars();
        data.push(PriceBar::new(180_000, "100", "inf", "90", "100"));
        data.push(PriceBar::new(240_000, "NaN", "110", "90", "100"));
        data.push(PriceBar::new(300_000, "100", "110", "-infinity", "100"));

        let chart = CandleChart::build("x", &data).unwrap();
        assert_eq!(chart.candles.len(), 2);
        assert!(chart.y_min.is_finite() && chart.y_max.is_finite());
        assert!((chart.y_max - 111.0).abs() < 1e-9);

        assert!(CandleChart::build("x", &[PriceBar::new(1, "inf", "inf", "inf", "inf")]).is_none());
    }

    #[test]
    fn last_time_follows_the_last_drawn_candle() {
        let mut data = bars();
        data.push(PriceBar::new(180_000, "n/a", "1", "1", "1"));

        let chart = CandleChart::build("x", &data).unwrap();
        assert_eq!(chart.last_time_ms, 120_000);
        assert_eq!(chart.last().map(|c| c.x), Some(120.0));
    }
}
