use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use common::models::{Signal, SignalQuery};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{
    error::FetchError,
    remote::signal_response::{HealthResponse, SignalEnvelope, SignalListEnvelope, decode},
    traits::{RemoteResponse, SignalSource},
};

#[derive(Clone)]
pub struct SignalClient {
    client: Client,
    base_url: Url,
}

impl SignalClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("signal_desk/0.1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Self::normalize_base(base_url)?,
        })
    }

    // Url::join drops the last path segment unless the base ends with '/'.
    fn normalize_base(base_url: &str) -> anyhow::Result<Url> {
        let mut raw = base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).with_context(|| format!("Invalid signal API base URL: {}", base_url))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::NetworkFailure(format!("bad endpoint {}: {}", path, e)))
    }

    pub fn signals_url(&self, query: &SignalQuery) -> Result<Url, FetchError> {
        let mut url = self.endpoint("signals")?;
        url.query_pairs_mut()
            .append_pair("symbol", &query.symbol)
            .append_pair("timeframe", &query.timeframe);
        Ok(url)
    }

    /// Most recent signals across all symbols, newest first.
    pub async fn recent_signals(&self) -> Result<Vec<Signal>, FetchError> {
        let url = self.endpoint("signals_list")?;
        let envelope: SignalListEnvelope = self.get_json(url).await?;
        Ok(envelope.into_model())
    }

    pub async fn health(&self) -> Result<bool, FetchError> {
        let url = self.endpoint("health")?;
        let health: HealthResponse = self.get_json(url).await?;
        Ok(health.into_model())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

        let response = Self::check_status(response)?;

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

        decode::<T>(&body)
    }

    fn check_status(response: Response) -> Result<Response, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpFailure { status });
        }
        Ok(response)
    }
}

#[async_trait]
impl SignalSource for SignalClient {
    async fn latest_signal(&self, query: &SignalQuery) -> Result<Option<Signal>, FetchError> {
        let url = self.signals_url(query)?;
        let envelope: SignalEnvelope = self.get_json(url).await?;
        Ok(envelope.into_model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SignalClient {
        SignalClient::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_signals_url_encodes_pair() {
        let client = client("http://127.0.0.1:8000");
        let url = client
            .signals_url(&SignalQuery::new("BTC/USDT", "1m"))
            .unwrap();

        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/signals?symbol=BTC%2FUSDT&timeframe=1m"
        );
    }

    #[test]
    fn test_base_path_is_preserved() {
        let client = client("https://example.com/api");
        assert_eq!(client.base_url().as_str(), "https://example.com/api/");

        let url = client.signals_url(&SignalQuery::new("ETHUSDT", "5m")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/api/signals?symbol=ETHUSDT&timeframe=5m"
        );
        assert_eq!(
            client.endpoint("signals_list").unwrap().as_str(),
            "https://example.com/api/signals_list"
        );
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(SignalClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = client("http://127.0.0.1:9");
        let err = client
            .latest_signal(&SignalQuery::new("BTC/USDT", "1m"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NetworkFailure(_)));
    }
}
