//! Live candlestick dashboard for Binance kline streams.
//!
//! The GUI (`kline_dash`) and the headless recorder (`kline_recorder`) share
//! the same runtime: a feed connection per selected pair, an append-only
//! dataset persisted to a single JSON snapshot, and a chart model rebuilt on
//! every change.

pub mod app;
pub mod chart;
pub mod feed;
pub mod market;
pub mod persist;
pub mod settings;
pub mod store;

use std::time::Duration;

use feed::binance::BinanceConnector;
use feed::dummy::DummyConnector;
use feed::FeedConnector;
use settings::{AppConfig, FeedSource};

/// `RUST_LOG` filter, `info` when unset.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn connector_for(cfg: &AppConfig, runtime: tokio::runtime::Handle) -> Box<dyn FeedConnector> {
    match cfg.feed_source {
        FeedSource::Binance => Box::new(BinanceConnector::new(
            runtime,
            cfg.feed_url.clone(),
            cfg.reconnect,
        )),
        FeedSource::Dummy => Box::new(DummyConnector::new(Duration::from_millis(
            cfg.dummy_tick_ms.max(10),
        ))),
    }
}
