use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use common::models::{SignalId, SignalQuery};
use signal_api::SignalSource;
use tokio::{
    sync::watch,
    task::{JoinError, JoinHandle},
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    dedup::{DedupTracker, Verdict},
    display::DisplayState,
    notify::Notifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new actionable signal arrived and the notifier was called.
    Notified,
    /// The fetch succeeded but there was nothing new to announce.
    Fetched,
    Failed,
    /// Another cycle was already in flight; this one did nothing.
    Coalesced,
}

/// Cancels scheduling when stopped or dropped. Cycles already running are left alone.
pub struct PollHandle {
    query: SignalQuery,
    ticker: JoinHandle<()>,
}

impl PollHandle {
    pub fn query(&self) -> &SignalQuery {
        &self.query
    }

    pub fn is_finished(&self) -> bool {
        self.ticker.is_finished()
    }

    /// Resolves only if the ticker task dies (panic or abort).
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.ticker).await
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

// Clears the in-flight flag even if the cycle future is dropped midway.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SignalPoller {
    query: SignalQuery,
    period: Duration,
    source: Arc<dyn SignalSource>,
    notifier: Arc<dyn Notifier>,
    tracker: Mutex<DedupTracker>,
    display_tx: watch::Sender<DisplayState>,
    in_flight: AtomicBool,
}

impl SignalPoller {
    pub fn new(
        query: SignalQuery,
        period: Duration,
        source: Arc<dyn SignalSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (display_tx, _) = watch::channel(DisplayState::Loading);

        Self {
            query,
            period,
            source,
            notifier,
            tracker: Mutex::new(DedupTracker::new()),
            display_tx,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn query(&self) -> &SignalQuery {
        &self.query
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.display_tx.subscribe()
    }

    pub fn display(&self) -> DisplayState {
        self.display_tx.borrow().clone()
    }

    pub fn last_seen_id(&self) -> Option<SignalId> {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last_id()
            .cloned()
    }

    /// Polls right away, then once per period. Each cycle runs in its own task.
    pub fn start(self: &Arc<Self>) -> PollHandle {
        info!(
            "Starting signal poller for {} every {:?}",
            self.query, self.period
        );

        let poller = Arc::clone(self);
        let ticker = tokio::spawn(async move {
            let mut interval = time::interval(poller.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let cycle = Arc::clone(&poller);
                tokio::spawn(async move {
                    cycle.fetch_once().await;
                });
            }
        });

        PollHandle {
            query: self.query.clone(),
            ticker,
        }
    }

    pub fn stop(&self, handle: PollHandle) {
        info!("Stopping signal poller for {}", handle.query());
        drop(handle);
    }

    /// One fetch-evaluate-render cycle. Shared by the timer and manual refresh.
    pub async fn fetch_once(&self) -> CycleOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("{}: cycle already in flight, skipping", self.query);
            return CycleOutcome::Coalesced;
        };

        self.display_tx.send_replace(DisplayState::Loading);

        match self.source.latest_signal(&self.query).await {
            Ok(signal) => {
                let verdict = self
                    .tracker
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .observe(signal.as_ref());

                let outcome = match (verdict, signal.as_ref()) {
                    (Verdict::Notify, Some(s)) => {
                        info!("{}: new signal {}", self.query, s.headline());
                        self.notifier.notify(s);
                        CycleOutcome::Notified
                    }
                    (Verdict::Record, Some(s)) => {
                        debug!(
                            "{}: new placeholder row {}",
                            self.query,
                            s.id.as_ref().map(ToString::to_string).unwrap_or_default()
                        );
                        CycleOutcome::Fetched
                    }
                    _ => CycleOutcome::Fetched,
                };

                self.display_tx.send_replace(DisplayState::Result(signal));
                outcome
            }
            Err(e) => {
                warn!("{}: {}", self.query, e);
                self.display_tx.send_replace(DisplayState::Error(e.to_string()));
                CycleOutcome::Failed
            }
        }
    }
}
