use async_trait::async_trait;
use common::models::{Signal, SignalQuery};

use crate::error::FetchError;

/// Where pollers get signals from.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Latest signal for the query. `Ok(None)` means the API has nothing for it.
    async fn latest_signal(&self, query: &SignalQuery) -> Result<Option<Signal>, FetchError>;
}

pub trait RemoteResponse<T> {
    fn into_model(self) -> T;
}
