pub mod signal;

pub use signal::{Side, Signal, SignalId, SignalQuery};
