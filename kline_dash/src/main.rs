// kline_dash/src/main.rs
//
// Desktop dashboard: pick a pair and an interval, watch the live candles.

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use std::time::{Duration, Instant};

use kline_dash::app::{render, AppRuntime};
use kline_dash::feed::binance::install_rustls_provider;
use kline_dash::persist::{self, SnapshotCache};
use kline_dash::settings::{AppConfig, Settings};

struct DashboardApp {
    runtime: AppRuntime,
    settings: Settings,
    config: AppConfig,
    // keeps the websocket tasks alive
    _tokio: tokio::runtime::Runtime,
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.runtime.pump();
        self.runtime.tick(Instant::now());

        render::render(ctx, &mut self.runtime);

        if self.runtime.take_dirty() {
            ctx.request_repaint();
        }
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.runtime.shutdown();
        self.config.set_selection(self.runtime.state.selection);
        if let Err(err) = self.settings.save_now(&self.config) {
            tracing::warn!(path = ?self.settings.path(), "settings not saved: {err:#}");
        }
    }
}

fn main() -> Result<()> {
    kline_dash::init_tracing();
    install_rustls_provider()?;

    let settings = Settings::new();
    let mut config = settings.load();
    config.apply_env();
    tracing::info!(
        source = ?config.feed_source,
        url = %config.feed_url,
        config = ?settings.path(),
        "starting kline_dash"
    );

    let tokio = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    let cache = SnapshotCache::new(persist::snapshot_path(), config.persist);
    let connector = kline_dash::connector_for(&config, tokio.handle().clone());
    let runtime = AppRuntime::start(config.selection(), cache, connector);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Binance Market Data")
            .with_inner_size([config.window_width_px, config.window_height_px]),
        ..Default::default()
    };

    let app = DashboardApp {
        runtime,
        settings,
        config,
        _tokio: tokio,
    };

    eframe::run_native(
        "kline_dash",
        options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow!("eframe error: {e}"))
}
