pub mod binance;
pub mod dummy;
pub mod kline;
pub mod reconnect;

use std::fmt;
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::app::AppEvent;
use crate::market::Selection;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("decode kline: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("websocket: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("stream closed by peer: {0}")]
    Closed(String),
}

/// Lifecycle of one pair's stream, as reported to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting { attempt: u32, delay: Duration },
    Closed { reason: String },
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => f.write_str("connecting"),
            ConnectionStatus::Connected => f.write_str("live"),
            ConnectionStatus::Reconnecting { attempt, delay } => {
                write!(f, "reconnecting (attempt {attempt}, in {}ms)", delay.as_millis())
            }
            ConnectionStatus::Closed { reason } => write!(f, "closed: {reason}"),
        }
    }
}

/// A live stream scoped to one pair.
pub trait FeedConnection: Send {
    fn pair(&self) -> Selection;

    /// Stop the stream. Calling it again is a no-op.
    fn close(&mut self);
}

/// Opens streams. Every bar a connection emits is tagged with the pair it
/// was opened for; every status report also carries the `stream` id.
pub trait FeedConnector: Send {
    fn open(
        &mut self,
        pair: Selection,
        stream: u64,
        events: Sender<AppEvent>,
    ) -> Box<dyn FeedConnection>;
}

/// Holds at most one open connection.
pub struct FeedManager {
    connector: Box<dyn FeedConnector>,
    events: Sender<AppEvent>,
    active: Option<Box<dyn FeedConnection>>,
    last_stream: u64,
}

impl FeedManager {
    pub fn new(connector: Box<dyn FeedConnector>, events: Sender<AppEvent>) -> Self {
        Self {
            connector,
            events,
            active: None,
            last_stream: 0,
        }
    }

    /// Close whatever is open, then open `pair`. Returns the new stream id;
    /// ids start at 1 and never repeat, even when the same pair is reopened.
    pub fn open(&mut self, pair: Selection) -> u64 {
        self.close();
        self.last_stream += 1;
        let stream = self.last_stream;
        tracing::info!(%pair, stream, "opening feed");
        self.active = Some(self.connector.open(pair, stream, self.events.clone()));
        stream
    }

    pub fn close(&mut self) {
        if let Some(mut conn) = self.active.take() {
            tracing::info!(pair = %conn.pair(), "closing feed");
            conn.close();
        }
    }

    pub fn active_pair(&self) -> Option<Selection> {
        self.active.as_ref().map(|c| c.pair())
    }
}

impl Drop for FeedManager {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Connector that records open/close calls in order.
    #[derive(Clone, Default)]
    pub struct RecordingConnector {
        pub log: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingConnector {
        pub fn entries(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    struct RecordingConnection {
        pair: Selection,
        log: Arc<Mutex<Vec<String>>>,
        open: bool,
    }

    impl FeedConnection for RecordingConnection {
        fn pair(&self) -> Selection {
            self.pair
        }

        fn close(&mut self) {
            if self.open {
                self.open = false;
                self.log.lock().unwrap().push(format!("close {}", self.pair));
            }
        }
    }

    impl FeedConnector for RecordingConnector {
        fn open(
            &mut self,
            pair: Selection,
            _stream: u64,
            _events: Sender<AppEvent>,
        ) -> Box<dyn FeedConnection> {
            self.log.lock().unwrap().push(format!("open {pair}"));
            Box::new(RecordingConnection {
                pair,
                log: self.log.clone(),
                open: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingConnector;
    use super::*;
    use crate::market::{Interval, Symbol};
    use std::sync::mpsc;

    #[test]
    fn reopen_closes_previous_first() {
        let connector = RecordingConnector::default();
        let (tx, _rx) = mpsc::channel();
        let mut feed = FeedManager::new(Box::new(connector.clone()), tx);

        let a = Selection::new(Symbol::EthUsdt, Interval::M1);
        let b = Selection::new(Symbol::DotUsdt, Interval::M5);
        assert_eq!(feed.open(a), 1);
        assert_eq!(feed.open(b), 2);
        // same pair again still gets a fresh id
        assert_eq!(feed.open(a), 3);

        assert_eq!(feed.active_pair(), Some(a));
        assert_eq!(
            connector.entries(),
            vec![
                "open ethusdt@1m",
                "close ethusdt@1m",
                "open dotusdt@5m",
                "close dotusdt@5m",
                "open ethusdt@1m",
            ]
        );
    }

    #[test]
    fn drop_closes_the_active_connection() {
        let connector = RecordingConnector::default();
        let (tx, _rx) = mpsc::channel();
        {
            let mut feed = FeedManager::new(Box::new(connector.clone()), tx);
            feed.open(Selection::default());
            feed.close();
            feed.close();
            feed.open(Selection::default());
        }
        assert_eq!(
            connector.entries(),
            vec!["open ethusdt@1m", "close ethusdt@1m", "open ethusdt@1m", "close ethusdt@1m"]
        );
    }
}
