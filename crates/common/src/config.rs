use std::{env, time::Duration};

use thiserror::Error;

use crate::models::SignalQuery;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SYMBOLS: &str = "BTC/USDT";
pub const DEFAULT_TIMEFRAME: &str = "1m";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ALERT_BEEPS: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("{present} is set but {missing} is not")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeskConfig {
    pub api_base: String,
    pub symbols: Vec<String>,
    pub timeframe: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,
    pub alert_beeps: u32,
    pub telegram: Option<TelegramConfig>,
}

impl DeskConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base = get("SIGNAL_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let raw_symbols = get("SIGNAL_SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string());
        let mut symbols: Vec<String> = Vec::new();
        for symbol in raw_symbols.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !symbols.iter().any(|s| s == symbol) {
                symbols.push(symbol.to_string());
            }
        }
        if symbols.is_empty() {
            return Err(ConfigError::Invalid {
                key: "SIGNAL_SYMBOLS",
                value: raw_symbols,
                reason: "no symbols listed",
            });
        }

        let timeframe = get("SIGNAL_TIMEFRAME").unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());

        let poll_interval = Duration::from_secs(parse_positive(
            "POLL_INTERVAL_SECS",
            get("POLL_INTERVAL_SECS"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?);
        let http_timeout = Duration::from_secs(parse_positive(
            "HTTP_TIMEOUT_SECS",
            get("HTTP_TIMEOUT_SECS"),
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let alert_beeps = match get("ALERT_BEEPS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| ConfigError::Invalid {
                key: "ALERT_BEEPS",
                value: raw,
                reason: "expected a non-negative integer",
            })?,
            None => DEFAULT_ALERT_BEEPS,
        };

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => {
                let chat_id = chat_id
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ConfigError::Invalid {
                        key: "TELEGRAM_CHAT_ID",
                        value: chat_id,
                        reason: "must be a number",
                    })?;
                Some(TelegramConfig { token, chat_id })
            }
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: "TELEGRAM_BOT_TOKEN",
                    missing: "TELEGRAM_CHAT_ID",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    present: "TELEGRAM_CHAT_ID",
                    missing: "TELEGRAM_BOT_TOKEN",
                });
            }
            (None, None) => None,
        };

        Ok(Self {
            api_base,
            symbols,
            timeframe,
            poll_interval,
            http_timeout,
            alert_beeps,
            telegram,
        })
    }

    /// One query per configured symbol, all sharing the timeframe.
    pub fn queries(&self) -> Vec<SignalQuery> {
        self.symbols
            .iter()
            .map(|s| SignalQuery::new(s.clone(), self.timeframe.clone()))
            .collect()
    }
}

fn parse_positive(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "must be greater than zero",
        }),
        Ok(v) => Ok(v),
        Err(_) => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "expected a positive integer",
        }),
    }
}
