pub mod dedup;
pub mod display;
pub mod notify;
pub mod services;

pub use dedup::{DedupTracker, Verdict};
pub use display::DisplayState;
pub use notify::{AlertEffect, FallbackNotifier, Fanout, Notifier};
pub use services::signal_poller::{CycleOutcome, PollHandle, SignalPoller};
