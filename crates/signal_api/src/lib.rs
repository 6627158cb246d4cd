pub mod error;
pub mod remote;
pub mod traits;

pub use error::FetchError;
pub use reqwest::StatusCode;
pub use remote::SignalClient;
pub use traits::SignalSource;
