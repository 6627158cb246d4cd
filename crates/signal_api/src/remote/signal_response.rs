use common::models::Signal;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{error::FetchError, traits::RemoteResponse};

/// Body of `GET /signals`.
#[derive(Debug, Deserialize)]
pub struct SignalEnvelope {
    pub signal: Option<Signal>,
}

/// Body of `GET /signals_list`, newest first.
#[derive(Debug, Deserialize)]
pub struct SignalListEnvelope {
    #[serde(default)]
    pub signals: Vec<Signal>,
}

/// Body of `GET /health`.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub ok: bool,
}

impl RemoteResponse<Option<Signal>> for SignalEnvelope {
    fn into_model(self) -> Option<Signal> {
        self.signal
    }
}

impl RemoteResponse<Vec<Signal>> for SignalListEnvelope {
    fn into_model(self) -> Vec<Signal> {
        self.signals
    }
}

impl RemoteResponse<bool> for HealthResponse {
    fn into_model(self) -> bool {
        self.ok
    }
}

pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, FetchError> {
    Ok(serde_json::from_slice::<T>(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{Side, SignalId};

    #[test]
    fn test_decode_signal_envelope() {
        let body = br#"{"signal": {"id": 3, "side": "sell", "symbol": "ETHUSDT", "entry": 3100.0}}"#;
        let signal = decode::<SignalEnvelope>(body).unwrap().into_model().unwrap();

        assert_eq!(signal.id, Some(SignalId::Number(3)));
        assert_eq!(signal.side, Some(Side::Sell));
        assert_eq!(signal.symbol.as_deref(), Some("ETHUSDT"));
    }

    #[test]
    fn test_decode_null_signal() {
        let envelope = decode::<SignalEnvelope>(br#"{"signal": null}"#).unwrap();
        assert!(envelope.into_model().is_none());
    }

    #[test]
    fn test_malformed_bodies_fail_to_decode() {
        // serde treats a missing Option field as None, so only malformed bodies fail.
        let envelope = decode::<SignalEnvelope>(b"{}").unwrap();
        assert!(envelope.signal.is_none());

        let err = decode::<SignalEnvelope>(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::DecodeFailure(_)));

        let err = decode::<SignalEnvelope>(br#"{"signal": 5}"#).unwrap_err();
        assert!(matches!(err, FetchError::DecodeFailure(_)));
    }

    #[test]
    fn test_decode_list_and_health() {
        let body = br#"{"signals": [{"id": 9, "side": "buy"}, {"id": 8, "side": "none"}]}"#;
        let signals = decode::<SignalListEnvelope>(body).unwrap().into_model();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[1].side, Some(Side::None));

        assert!(decode::<HealthResponse>(br#"{"ok": true}"#).unwrap().into_model());
        assert!(!decode::<HealthResponse>(b"{}").unwrap().into_model());
    }
}
