pub mod event;
pub mod reducer;
pub mod render;
pub mod state;

pub use event::*;
pub use state::*;

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

use crate::chart::{CandleChart, ChartRenderer};
use crate::feed::{FeedConnector, FeedManager};
use crate::market::Selection;
use crate::persist::SnapshotCache;
use reducer::Effect;

/// Owns the state and drives feed, cache and chart from one thread.
pub struct AppRuntime {
    pub state: AppState,
    cache: SnapshotCache,
    feed: FeedManager,
    chart: ChartRenderer,
    events_rx: Receiver<AppEvent>,
    dirty: bool,
}

impl AppRuntime {
    /// Seed the store from the cache, open the feed for `selection` and draw
    /// whatever is already stored for it.
    pub fn start(selection: Selection, cache: SnapshotCache, connector: Box<dyn FeedConnector>) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let store = cache.load().unwrap_or_default();

        let mut rt = Self {
            state: AppState::new(selection, store),
            cache,
            feed: FeedManager::new(connector, events_tx),
            chart: ChartRenderer::new(),
            events_rx,
            dirty: true,
        };
        rt.state.feed_stream = rt.feed.open(selection);
        rt.redraw_chart();
        rt
    }

    pub fn handle_event(&mut self, ev: AppEvent) {
        match reducer::reduce(&mut self.state, ev) {
            Effect::None => {}
            Effect::Redraw => self.dirty = true,
            Effect::StoreChanged => {
                self.persist_append();
                self.redraw_chart();
            }
            Effect::SelectionChanged => {
                self.state.feed_stream = self.feed.open(self.state.selection);
                self.redraw_chart();
            }
        }
    }

    /// Drain everything the feed has queued, in arrival order.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        while let Ok(ev) = self.events_rx.try_recv() {
            self.handle_event(ev);
            n += 1;
        }
        n
    }

    /// Periodic work: debounced cache writes.
    pub fn tick(&mut self, now: Instant) {
        match self.cache.flush_if_due(&self.state.store, now) {
            Ok(true) => tracing::debug!(path = ?self.cache.path(), "snapshot flushed"),
            Ok(false) => {}
            Err(err) => self.report_cache_error(err),
        }
    }

    /// Close the feed and write any pending snapshot.
    pub fn shutdown(&mut self) {
        self.feed.close();
        match self.cache.flush(&self.state.store) {
            Ok(_) => tracing::info!(
                bars = self.state.store.bar_count(),
                path = ?self.cache.path(),
                "shutdown complete"
            ),
            Err(err) => self.report_cache_error(err),
        }
    }

    pub fn chart(&self) -> Option<&CandleChart> {
        self.chart.chart()
    }

    pub fn chart_renderer(&self) -> &ChartRenderer {
        &self.chart
    }

    pub fn feed_pair(&self) -> Option<Selection> {
        self.feed.active_pair()
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn persist_append(&mut self) {
        if let Err(err) = self.cache.record_append(&self.state.store, Instant::now()) {
            self.report_cache_error(err);
        }
    }

    fn redraw_chart(&mut self) {
        let sel = self.state.selection;
        self.chart.render(&sel.label(), self.state.store.read(sel));
        self.dirty = true;
    }

    fn report_cache_error(&mut self, err: anyhow::Error) {
        tracing::error!(path = ?self.cache.path(), "snapshot write failed: {err:#}");
        self.state.status_message = format!("cache write failed: {err}");
        self.dirty = true;
    }
}
