use reqwest::StatusCode;
use thiserror::Error;

/// Ways a single request to the Signal API can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach signal API: {0}")]
    NetworkFailure(String),
    #[error("Failed to fetch (HTTP {status})")]
    HttpFailure { status: StatusCode },
    #[error("Failed to decode signal API response: {0}")]
    DecodeFailure(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::DecodeFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let http = FetchError::HttpFailure {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(http.to_string(), "Failed to fetch (HTTP 500 Internal Server Error)");

        let decode: FetchError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(decode, FetchError::DecodeFailure(_)));
    }
}
