// Binance kline stream over tokio-tungstenite.
//
// One task per open connection. The task owns the socket; the UI side only
// holds the shutdown sender.

use anyhow::{anyhow, Result};
use futures_util::{SinkExt, StreamExt};
use std::sync::mpsc::Sender;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::kline;
use super::reconnect::ReconnectPolicy;
use super::{ConnectionStatus, FeedConnection, FeedConnector, FeedError};
use crate::app::{AppEvent, FeedEvent};
use crate::market::Selection;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct BinanceConnector {
    runtime: Handle,
    host: String,
    policy: ReconnectPolicy,
}

impl BinanceConnector {
    pub fn new(runtime: Handle, host: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            runtime,
            host: host.into(),
            policy,
        }
    }
}

impl FeedConnector for BinanceConnector {
    fn open(
        &mut self,
        pair: Selection,
        stream: u64,
        events: Sender<AppEvent>,
    ) -> Box<dyn FeedConnection> {
        let url = kline::stream_url(&self.host, pair);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let reporter = StatusReporter {
            events: events.clone(),
            pair,
            stream,
        };
        self.runtime
            .spawn(run_stream(url, reporter, self.policy, events, shutdown_rx));
        Box::new(BinanceConnection {
            pair,
            shutdown: Some(shutdown_tx),
        })
    }
}

struct BinanceConnection {
    pair: Selection,
    shutdown: Option<oneshot::Sender<()>>,
}

impl FeedConnection for BinanceConnection {
    fn pair(&self) -> Selection {
        self.pair
    }

    fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for BinanceConnection {
    fn drop(&mut self) {
        self.close();
    }
}

enum PumpEnd {
    Shutdown,
    Ended(String),
}

/// Sends status reports tagged with the stream they belong to.
struct StatusReporter {
    events: Sender<AppEvent>,
    pair: Selection,
    stream: u64,
}

impl StatusReporter {
    fn emit(&self, status: ConnectionStatus) -> bool {
        self.events
            .send(AppEvent::Feed(FeedEvent::Status {
                pair: self.pair,
                stream: self.stream,
                status,
            }))
            .is_ok()
    }
}

async fn run_stream(
    url: String,
    status: StatusReporter,
    policy: ReconnectPolicy,
    events: Sender<AppEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let pair = status.pair;
    let mut attempt: u32 = 0;

    loop {
        if !status.emit(ConnectionStatus::Connecting) {
            return;
        }

        let connected = tokio::select! {
            biased;
            _ = &mut shutdown => return,
            res = connect_async(url.as_str()) => res,
        };

        let reason = match connected {
            Ok((ws, _)) => {
                tracing::info!(%pair, %url, "feed connected");
                attempt = 0;
                status.emit(ConnectionStatus::Connected);
                match pump(ws, pair, &events, &mut shutdown).await {
                    PumpEnd::Shutdown => return,
                    PumpEnd::Ended(reason) => reason,
                }
            }
            Err(err) => FeedError::from(err).to_string(),
        };

        tracing::warn!(%pair, reason = %reason, "feed connection closed");

        attempt += 1;
        let Some(delay) = policy.delay_for(attempt) else {
            status.emit(ConnectionStatus::Closed { reason });
            return;
        };

        status.emit(ConnectionStatus::Reconnecting { attempt, delay });
        tokio::select! {
            biased;
            _ = &mut shutdown => return,
            _ = sleep(delay) => {}
        }
    }
}

async fn pump(
    mut ws: Socket,
    pair: Selection,
    events: &Sender<AppEvent>,
    shutdown: &mut oneshot::Receiver<()>,
) -> PumpEnd {
    loop {
        let msg = tokio::select! {
            biased;
            _ = &mut *shutdown => {
                let _ = ws.close(None).await;
                tracing::debug!(%pair, "feed shut down");
                return PumpEnd::Shutdown;
            }
            msg = ws.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(txt))) => {
                if !forward_frame(&txt, pair, events) {
                    let _ = ws.close(None).await;
                    return PumpEnd::Shutdown;
                }
            }
            Some(Ok(Message::Ping(payload))) => {
                ws.send(Message::Pong(payload)).await.ok();
            }
            Some(Ok(Message::Close(frame))) => {
                return PumpEnd::Ended(format!("close frame: {frame:?}"));
            }
            Some(Ok(_)) => {
                // binary / pong / raw frames carry no klines
            }
            Some(Err(err)) => return PumpEnd::Ended(FeedError::from(err).to_string()),
            None => return PumpEnd::Ended(FeedError::Closed("end of stream".into()).to_string()),
        }
    }
}

/// Decode one text frame and hand the bar to the UI thread. Returns false
/// once the receiving side is gone.
fn forward_frame(txt: &str, pair: Selection, events: &Sender<AppEvent>) -> bool {
    match kline::decode(txt) {
        Ok(decoded) => {
            tracing::trace!(%pair, time = decoded.bar.time, closed = decoded.closed, "kline");
            events
                .send(AppEvent::Feed(FeedEvent::Bar {
                    pair,
                    bar: decoded.bar,
                    closed: decoded.closed,
                }))
                .is_ok()
        }
        Err(err) => {
            tracing::warn!(%pair, "dropping undecodable frame: {err}");
            true
        }
    }
}

pub fn install_rustls_provider() -> Result<()> {
    // Rustls 0.23 requires a process-wide crypto provider. Opt into the ring
    // backend explicitly so the websocket handshake can succeed. If another
    // part of the process already installed a provider, keep running.
    rustls::crypto::ring::default_provider()
        .install_default()
        .or_else(|_| Ok(()))
        .map_err(|err: ()| anyhow!("failed to install rustls ring provider: {err:?}"))
}
