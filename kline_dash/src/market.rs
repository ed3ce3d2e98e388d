use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading pairs offered by the symbol picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    #[serde(rename = "ETH/USDT")]
    EthUsdt,
    #[serde(rename = "BNB/USDT")]
    BnbUsdt,
    #[serde(rename = "DOT/USDT")]
    DotUsdt,
}

impl Symbol {
    pub const ALL: [Symbol; 3] = [Symbol::EthUsdt, Symbol::BnbUsdt, Symbol::DotUsdt];

    /// Label shown in the picker and used as the store key.
    pub fn label(&self) -> &'static str {
        match self {
            Symbol::EthUsdt => "ETH/USDT",
            Symbol::BnbUsdt => "BNB/USDT",
            Symbol::DotUsdt => "DOT/USDT",
        }
    }

    /// Lowercased pair with no separator, as the stream path expects.
    pub fn stream_code(&self) -> &'static str {
        match self {
            Symbol::EthUsdt => "ethusdt",
            Symbol::BnbUsdt => "bnbusdt",
            Symbol::DotUsdt => "dotusdt",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sym| sym.label() == s.trim())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Candle durations offered by the interval picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
}

impl Interval {
    pub const ALL: [Interval; 3] = [Interval::M1, Interval::M3, Interval::M5];

    pub fn code(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M3 => "3m",
            Interval::M5 => "5m",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interval::M1 => "1 minute",
            Interval::M3 => "3 minutes",
            Interval::M5 => "5 minutes",
        }
    }

    pub fn secs(&self) -> i64 {
        match self {
            Interval::M1 => 60,
            Interval::M3 => 180,
            Interval::M5 => 300,
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|iv| iv.code() == s.trim())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The (symbol, interval) pair that scopes the open feed and the rendered slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub symbol: Symbol,
    pub interval: Interval,
}

impl Selection {
    pub fn new(symbol: Symbol, interval: Interval) -> Self {
        Self { symbol, interval }
    }

    /// Dataset label, e.g. `ETH/USDT - 1m`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.symbol.label(), self.interval.code())
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(Symbol::EthUsdt, Interval::M1)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol.stream_code(), self.interval.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_codes_round_trip() {
        for sym in Symbol::ALL {
            assert_eq!(Symbol::from_label(sym.label()), Some(sym));
        }
        for iv in Interval::ALL {
            assert_eq!(Interval::from_code(iv.code()), Some(iv));
        }
        assert_eq!(Symbol::from_label("BTC/USDT"), None);
        assert_eq!(Interval::from_code("15m"), None);
    }

    #[test]
    fn selection_label_matches_dataset_title() {
        let sel = Selection::new(Symbol::DotUsdt, Interval::M5);
        assert_eq!(sel.label(), "DOT/USDT - 5m");
        assert_eq!(sel.to_string(), "dotusdt@5m");
    }
}
