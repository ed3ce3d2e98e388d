use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::{thread, time::Duration};

use super::{ConnectionStatus, FeedConnection, FeedConnector};
use crate::app::{now_unix_ms, AppEvent, FeedEvent};
use crate::market::{Selection, Symbol};
use crate::store::PriceBar;

/// Offline source: a random walk emitted as running kline updates.
pub struct DummyConnector {
    tick: Duration,
    seed: Option<u64>,
}

impl DummyConnector {
    pub fn new(tick: Duration) -> Self {
        Self { tick, seed: None }
    }

    /// Deterministic walk, for tests.
    pub fn seeded(tick: Duration, seed: u64) -> Self {
        Self {
            tick,
            seed: Some(seed),
        }
    }
}

fn start_price(symbol: Symbol) -> f64 {
    match symbol {
        Symbol::EthUsdt => 2500.0,
        Symbol::BnbUsdt => 600.0,
        Symbol::DotUsdt => 6.5,
    }
}

fn fmt_px(px: f64) -> String {
    format!("{px:.4}")
}

/// Running candle for the current bucket.
struct Bucket {
    start_ms: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Bucket {
    fn new(start_ms: i64, px: f64) -> Self {
        Self {
            start_ms,
            open: px,
            high: px,
            low: px,
            close: px,
        }
    }

    fn push(&mut self, px: f64) {
        self.high = self.high.max(px);
        self.low = self.low.min(px);
        self.close = px;
    }

    fn bar(&self) -> PriceBar {
        PriceBar::new(
            self.start_ms,
            fmt_px(self.open),
            fmt_px(self.high),
            fmt_px(self.low),
            fmt_px(self.close),
        )
    }
}

impl FeedConnector for DummyConnector {
    fn open(
        &mut self,
        pair: Selection,
        stream: u64,
        events: Sender<AppEvent>,
    ) -> Box<dyn FeedConnection> {
        let stop = Arc::new(AtomicBool::new(false));
        let tick = self.tick;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        {
            let stop = stop.clone();
            thread::spawn(move || {
                let _ = events.send(AppEvent::Feed(FeedEvent::Status {
                    pair,
                    stream,
                    status: ConnectionStatus::Connected,
                }));

                let bucket_ms = pair.interval.secs() * 1000;
                let mut px = start_price(pair.symbol);
                let mut cur: Option<Bucket> = None;

                loop {
                    thread::sleep(tick);
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }

                    let step: f64 = rng.gen_range(-0.001..0.001);
                    px = (px * (1.0 + step)).max(0.01);

                    let start = (now_unix_ms() / bucket_ms) * bucket_ms;
                    match cur.as_mut() {
                        Some(b) if b.start_ms == start => b.push(px),
                        _ => cur = Some(Bucket::new(start, px)),
                    }

                    let Some(b) = cur.as_ref() else { continue };
                    let sent = events.send(AppEvent::Feed(FeedEvent::Bar {
                        pair,
                        bar: b.bar(),
                        closed: false,
                    }));
                    if sent.is_err() {
                        break;
                    }
                }
                tracing::debug!(%pair, "dummy feed stopped");
            });
        }

        Box::new(DummyConnection { pair, stop })
    }
}

struct DummyConnection {
    pair: Selection,
    stop: Arc<AtomicBool>,
}

impl FeedConnection for DummyConnection {
    fn pair(&self) -> Selection {
        self.pair
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for DummyConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Interval;
    use std::sync::mpsc;

    #[test]
    fn emits_tagged_running_bars_until_closed() {
        let (tx, rx) = mpsc::channel();
        let pair = Selection::new(Symbol::DotUsdt, Interval::M1);
        let mut connector = DummyConnector::seeded(Duration::from_millis(5), 7);
        let mut conn = connector.open(pair, 1, tx);

        let mut bars = Vec::new();
        while bars.len() < 3 {
            if let AppEvent::Feed(FeedEvent::Bar { pair: p, bar, .. }) =
                rx.recv_timeout(Duration::from_secs(2)).unwrap()
            {
                assert_eq!(p, pair);
                bars.push(bar);
            }
        }
        conn.close();

        for bar in &bars {
            assert_eq!(bar.time % 60_000, 0);
            let (lo, hi): (f64, f64) = (bar.low.parse().unwrap(), bar.high.parse().unwrap());
            assert!(lo <= hi);
        }

        // the worker exits after seeing the flag and drops its sender
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
                _ if std::time::Instant::now() > deadline => panic!("dummy feed kept running"),
                _ => {}
            }
        }
    }
}
