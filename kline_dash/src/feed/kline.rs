use serde::Deserialize;

use super::FeedError;
use crate::market::Selection;
use crate::store::PriceBar;

/// Stream address for one pair: `<host>/<code>@kline_<interval>`.
pub fn stream_url(host: &str, pair: Selection) -> String {
    format!(
        "{}/{}@kline_{}",
        host.trim_end_matches('/'),
        pair.symbol.stream_code(),
        pair.interval.code()
    )
}

#[derive(Debug, Deserialize)]
struct KlineMessage {
    k: KlinePayload,
}

#[derive(Debug, Deserialize)]
struct KlinePayload {
    t: i64,
    o: String,
    h: String,
    l: String,
    c: String,
    /// Set on the final update for a bucket.
    #[serde(default)]
    x: bool,
}

/// One decoded kline frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKline {
    pub bar: PriceBar,
    pub closed: bool,
}

pub fn decode(text: &str) -> Result<DecodedKline, FeedError> {
    let msg: KlineMessage = serde_json::from_str(text)?;
    let k = msg.k;
    Ok(DecodedKline {
        bar: PriceBar {
            time: k.t,
            open: k.o,
            high: k.h,
            low: k.l,
            close: k.c,
        },
        closed: k.x,
    })
}
