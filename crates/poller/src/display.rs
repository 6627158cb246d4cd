use std::fmt;

use common::models::Signal;

/// What a render surface should show for one poller. Exactly one state at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayState {
    Loading,
    Error(String),
    Result(Option<Signal>),
}

impl DisplayState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_no_entry(&self) -> bool {
        match self {
            Self::Result(signal) => signal.as_ref().is_none_or(Signal::is_placeholder),
            _ => false,
        }
    }

    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Self::Result(signal) => signal.as_ref(),
            _ => None,
        }
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn price(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "Fetching latest signal..."),
            Self::Error(message) => write!(f, "Error: {}", message),
            Self::Result(signal) if self.is_no_entry() => {
                write!(f, "No Entry")?;
                if let Some(reason) = signal.as_ref().and_then(|s| s.reason.as_deref()) {
                    write!(f, "\n  Reason       : {}", reason)?;
                }
                Ok(())
            }
            Self::Result(None) => write!(f, "No Entry"),
            Self::Result(Some(s)) => {
                writeln!(f, "{}", s.headline())?;
                writeln!(f, "  Label        : {}", or_dash(s.label.as_deref()))?;
                writeln!(f, "  Reason       : {}", or_dash(s.reason.as_deref()))?;
                writeln!(f, "  ML Label     : {}", or_dash(s.ml_label.as_ref()))?;
                writeln!(
                    f,
                    "  Confidence   : {}",
                    s.ml_confidence
                        .or(s.confidence)
                        .map(|c| format!("{:.2}", c))
                        .unwrap_or_else(|| "-".to_string())
                )?;
                writeln!(f, "  SMC Confirmed: {}", or_dash(s.smc_confirmed))?;
                writeln!(f, "  Stop Loss    : {}", price(s.stop_loss))?;
                writeln!(f, "  Take Profit  : {}", price(s.take_profit))?;
                write!(f, "  Created At   : {}", or_dash(s.created_at.as_deref()))
            }
        }
    }
}
