use crate::feed::ConnectionStatus;
use crate::market::{Interval, Selection, Symbol};
use crate::store::PriceBar;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Ui(UiEvent),
    Feed(FeedEvent),
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    SymbolChanged { symbol: Symbol },
    IntervalChanged { interval: Interval },
}

#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// One kline update, tagged with the pair its connection was opened for.
    Bar {
        pair: Selection,
        bar: PriceBar,
        closed: bool,
    },

    /// Lifecycle report from the connection with id `stream`.
    Status {
        pair: Selection,
        stream: u64,
        status: ConnectionStatus,
    },
}
