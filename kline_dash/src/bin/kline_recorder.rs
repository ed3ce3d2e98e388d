// kline_dash/src/bin/kline_recorder.rs
//
// Headless recorder. Streams the configured pair into the same snapshot the
// dashboard reads, until Ctrl-C.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use kline_dash::app::AppRuntime;
use kline_dash::feed::binance::install_rustls_provider;
use kline_dash::persist::{self, SnapshotCache};
use kline_dash::settings::Settings;

const LOOP_SLEEP: Duration = Duration::from_millis(100);
const PROGRESS_EVERY: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    kline_dash::init_tracing();
    install_rustls_provider()?;

    let settings = Settings::new();
    let mut config = settings.load();
    config.apply_env();

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("install ctrl-c handler")?;
    }

    let tokio = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("build tokio runtime")?;

    let snapshot = persist::snapshot_path();
    tracing::info!(pair = %config.selection(), snapshot = ?snapshot, "recorder starting");

    let cache = SnapshotCache::new(snapshot, config.persist);
    let connector = kline_dash::connector_for(&config, tokio.handle().clone());
    let mut runtime = AppRuntime::start(config.selection(), cache, connector);

    let mut last_progress = Instant::now();
    while !stop.load(Ordering::SeqCst) {
        runtime.pump();
        let now = Instant::now();
        runtime.tick(now);

        if now.duration_since(last_progress) >= PROGRESS_EVERY {
            tracing::info!("{}", runtime.state.status_line());
            last_progress = now;
        }
        thread::sleep(LOOP_SLEEP);
    }

    runtime.shutdown();
    Ok(())
}
