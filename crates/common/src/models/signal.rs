use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of an emitted signal. The backend uses an integer primary key,
/// but string ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Side {
    Buy,
    Sell,
    None,
    Other(String),
}

impl Side {
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }
}

impl From<String> for Side {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" => Self::Buy,
            "sell" => Self::Sell,
            "none" | "" => Self::None,
            _ => Self::Other(raw),
        }
    }
}

impl From<Side> for String {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => "buy".to_string(),
            Side::Sell => "sell".to_string(),
            Side::None => "none".to_string(),
            Side::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::None => write!(f, "NONE"),
            Self::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// A trading signal as served by the Signal API. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default)]
    pub id: Option<SignalId>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub entry: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub rr: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub smc_confirmed: Option<bool>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    // Integer from the scheduler, string from the label generator.
    #[serde(default)]
    pub ml_label: Option<Value>,
    #[serde(default)]
    pub ml_confidence: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Signal {
    /// True when the signal carries an id and a buy/sell side.
    pub fn is_actionable(&self) -> bool {
        self.id.is_some() && self.side.as_ref().is_some_and(Side::is_actionable)
    }

    /// A "no entry" row: no id, or no actionable side.
    pub fn is_placeholder(&self) -> bool {
        !self.is_actionable()
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    /// One-line summary used by alerts, e.g. `BUY BTCUSDT @ 65000.00 | SL 64000.00 | TP 67000.00 | RR 2.00`.
    pub fn headline(&self) -> String {
        let side = self
            .side
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        let symbol = self.symbol.as_deref().unwrap_or("-");

        let mut line = format!("{} {}", side, symbol);
        if let Some(entry) = self.entry {
            line.push_str(&format!(" @ {:.2}", entry));
        }
        if let Some(sl) = self.stop_loss {
            line.push_str(&format!(" | SL {:.2}", sl));
        }
        if let Some(tp) = self.take_profit {
            line.push_str(&format!(" | TP {:.2}", tp));
        }
        if let Some(rr) = self.rr {
            line.push_str(&format!(" | RR {:.2}", rr));
        }
        line
    }
}

/// Fixed query parameters of one poller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalQuery {
    pub symbol: String,
    pub timeframe: String,
}

impl SignalQuery {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }
}

impl fmt::Display for SignalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol, self.timeframe)
    }
}
