use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::feed::reconnect::ReconnectPolicy;
use crate::market::{Interval, Selection, Symbol};
use crate::persist::{self, PersistMode};

/// Bump when you change config schema.
const CONFIG_VERSION: u32 = 1;

pub const CONFIG_FILE: &str = "config.json";
pub const FEED_URL_ENV: &str = "KLINE_DASH_FEED_URL";
pub const FEED_SOURCE_ENV: &str = "KLINE_DASH_FEED";

pub const DEFAULT_FEED_URL: &str = "wss://stream.binance.com:9443/ws";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    Binance,
    Dummy,
}

impl FeedSource {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Some(FeedSource::Binance),
            "dummy" => Some(FeedSource::Dummy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,

    // feed
    pub feed_source: FeedSource,
    pub feed_url: String,
    pub reconnect: ReconnectPolicy,
    pub dummy_tick_ms: u64,

    // last selection
    pub symbol: Symbol,
    pub interval: Interval,

    // cache
    pub persist: PersistMode,

    // window geometry
    pub window_width_px: f32,
    pub window_height_px: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,

            feed_source: FeedSource::Binance,
            feed_url: DEFAULT_FEED_URL.to_string(),
            reconnect: ReconnectPolicy::default(),
            dummy_tick_ms: 250,

            symbol: Symbol::EthUsdt,
            interval: Interval::M1,

            persist: PersistMode::EveryAppend,

            window_width_px: 1100.0,
            window_height_px: 720.0,
        }
    }
}

impl AppConfig {
    pub fn selection(&self) -> Selection {
        Selection::new(self.symbol, self.interval)
    }

    pub fn set_selection(&mut self, sel: Selection) {
        self.symbol = sel.symbol;
        self.interval = sel.interval;
    }

    /// Environment overrides on top of the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(FEED_URL_ENV).ok().as_deref(),
            std::env::var(FEED_SOURCE_ENV).ok().as_deref(),
        );
    }

    fn apply_overrides(&mut self, feed_url: Option<&str>, feed_source: Option<&str>) {
        if let Some(url) = feed_url.map(str::trim).filter(|u| !u.is_empty()) {
            self.feed_url = url.to_string();
        }
        if let Some(raw) = feed_source {
            match FeedSource::from_str(raw) {
                Some(src) => self.feed_source = src,
                None => tracing::warn!(value = raw, "unknown {FEED_SOURCE_ENV}; keeping {:?}", self.feed_source),
            }
        }
    }
}

/// Reads and writes `config.json`.
pub struct Settings {
    path: PathBuf,
    last_saved_json: Mutex<String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::at(persist::config_dir().join(CONFIG_FILE))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_saved_json: Mutex::new(String::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> AppConfig {
        if !self.path.exists() {
            return AppConfig::default();
        }
        let Some(mut cfg) = persist::read_json_or_archive::<AppConfig>(&self.path) else {
            return AppConfig::default();
        };
        // simple migration hook
        if cfg.version == 0 {
            cfg.version = CONFIG_VERSION;
        }
        cfg
    }

    /// Save if content changed.
    pub fn save_now(&self, cfg: &AppConfig) -> Result<()> {
        let parent = self.path.parent().context("config path has no parent")?;
        fs::create_dir_all(parent).with_context(|| format!("create config dir {:?}", parent))?;

        let json = serde_json::to_string_pretty(cfg)?;
        {
            let mut last = self
                .last_saved_json
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *last == json {
                return Ok(());
            }
            *last = json.clone();
        }

        persist::atomic_write(&self.path, json.as_bytes())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
