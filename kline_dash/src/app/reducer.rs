use super::event::*;
use super::state::*;
use crate::market::Selection;

/// What the runtime has to do after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Status line only.
    Redraw,
    /// A bar was appended: persist, then rebuild the chart.
    StoreChanged,
    /// Reopen the feed for the new pair, then rebuild the chart.
    SelectionChanged,
}

pub fn reduce(state: &mut AppState, ev: AppEvent) -> Effect {
    match ev {
        AppEvent::Ui(u) => reduce_ui(state, u),
        AppEvent::Feed(f) => reduce_feed(state, f),
    }
}

fn reduce_ui(state: &mut AppState, ev: UiEvent) -> Effect {
    let next = match ev {
        UiEvent::SymbolChanged { symbol } => Selection::new(symbol, state.selection.interval),
        UiEvent::IntervalChanged { interval } => Selection::new(state.selection.symbol, interval),
    };
    if next == state.selection {
        return Effect::None;
    }

    tracing::info!(from = %state.selection, to = %next, "selection changed");
    state.selection = next;
    state.feed_status = None;
    state.status_message.clear();
    Effect::SelectionChanged
}

fn reduce_feed(state: &mut AppState, ev: FeedEvent) -> Effect {
    match ev {
        FeedEvent::Bar { pair, bar, closed } => {
            tracing::debug!(%pair, time = bar.time, closed, "bar received");
            state.store.append(pair, bar);
            state.bars_received += 1;
            Effect::StoreChanged
        }
        FeedEvent::Status { pair, stream, status } => {
            if stream != state.feed_stream {
                tracing::debug!(%pair, stream, %status, "status from a closed stream ignored");
                return Effect::None;
            }
            state.feed_status = Some(status);
            Effect::Redraw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ConnectionStatus;
    use crate::market::{Interval, Symbol};
    use crate::store::PriceBar;

    fn bar_event(pair: Selection, time: i64) -> AppEvent {
        AppEvent::Feed(FeedEvent::Bar {
            pair,
            bar: PriceBar::new(time, "1", "1", "1", "1"),
            closed: false,
        })
    }

    #[test]
    fn same_value_selection_is_a_no_op() {
        let mut state = AppState::default();
        let ev = AppEvent::Ui(UiEvent::SymbolChanged { symbol: Symbol::EthUsdt });
        assert_eq!(reduce(&mut state, ev), Effect::None);
    }

    #[test]
    fn changing_either_control_changes_selection() {
        let mut state = AppState::default();
        let ev = AppEvent::Ui(UiEvent::IntervalChanged { interval: Interval::M3 });
        assert_eq!(reduce(&mut state, ev), Effect::SelectionChanged);
        let ev = AppEvent::Ui(UiEvent::SymbolChanged { symbol: Symbol::BnbUsdt });
        assert_eq!(reduce(&mut state, ev), Effect::SelectionChanged);
        assert_eq!(state.selection, Selection::new(Symbol::BnbUsdt, Interval::M3));
    }

    #[test]
    fn bars_land_under_their_tagged_pair() {
        let mut state = AppState::default();
        let other = Selection::new(Symbol::DotUsdt, Interval::M5);

        assert_eq!(reduce(&mut state, bar_event(other, 300_000)), Effect::StoreChanged);
        assert!(state.store.read(state.selection).is_empty());
        assert_eq!(state.store.read(other).len(), 1);
    }

    fn status_event(pair: Selection, stream: u64, status: ConnectionStatus) -> AppEvent {
        AppEvent::Feed(FeedEvent::Status { pair, stream, status })
    }

    #[test]
    fn stale_status_is_ignored() {
        let mut state = AppState::default();
        state.feed_stream = 2;
        let other = Selection::new(Symbol::DotUsdt, Interval::M5);

        let ev = status_event(other, 1, ConnectionStatus::Connected);
        assert_eq!(reduce(&mut state, ev), Effect::None);
        assert_eq!(state.feed_status, None);

        let ev = status_event(state.selection, 2, ConnectionStatus::Connected);
        assert_eq!(reduce(&mut state, ev), Effect::Redraw);
        assert_eq!(state.feed_status, Some(ConnectionStatus::Connected));
    }

    #[test]
    fn status_from_an_earlier_stream_of_the_same_pair_is_ignored() {
        // ETH -> DOT -> ETH: the first ETH stream (1) still has reports queued
        let mut state = AppState::default();
        let eth = state.selection;
        state.feed_stream = 3;

        let ev = status_event(eth, 3, ConnectionStatus::Connecting);
        assert_eq!(reduce(&mut state, ev), Effect::Redraw);

        let ev = status_event(eth, 1, ConnectionStatus::Connected);
        assert_eq!(reduce(&mut state, ev), Effect::None);
        assert_eq!(state.feed_status, Some(ConnectionStatus::Connecting));

        let ev = status_event(eth, 1, ConnectionStatus::Closed { reason: "gone".into() });
        assert_eq!(reduce(&mut state, ev), Effect::None);
        assert_eq!(state.feed_status, Some(ConnectionStatus::Connecting));
    }
}
