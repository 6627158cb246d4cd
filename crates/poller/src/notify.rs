use std::sync::Arc;

use common::models::Signal;
use tracing::{debug, warn};

/// Receives one call per new actionable signal. Fire-and-forget: implementations
/// handle their own failures. Called from inside the async fetch cycle, so it must
/// not block; push blocking I/O to another thread.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, signal: &Signal);
}

/// A single fallible way of alerting the user (bell, banner, ...).
#[cfg_attr(test, mockall::automock)]
pub trait AlertEffect: Send + Sync {
    fn name(&self) -> &'static str;

    fn fire(&self, signal: &Signal) -> anyhow::Result<()>;
}

/// Tries `primary`, then `fallback`; a failing fallback is dropped silently.
pub struct FallbackNotifier<P, F> {
    primary: P,
    fallback: F,
}

impl<P: AlertEffect, F: AlertEffect> FallbackNotifier<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: AlertEffect, F: AlertEffect> Notifier for FallbackNotifier<P, F> {
    fn notify(&self, signal: &Signal) {
        let Err(e) = self.primary.fire(signal) else {
            return;
        };
        warn!(
            "{} alert unavailable ({}), falling back to {}",
            self.primary.name(),
            e,
            self.fallback.name()
        );

        if let Err(e) = self.fallback.fire(signal) {
            debug!("{} alert failed too: {}", self.fallback.name(), e);
        }
    }
}

/// Forwards every notification to each sink in order.
#[derive(Default, Clone)]
pub struct Fanout {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Notifier for Fanout {
    fn notify(&self, signal: &Signal) {
        for sink in &self.sinks {
            sink.notify(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn effect(name: &'static str, ok: bool, calls: usize) -> MockAlertEffect {
        let mut effect = MockAlertEffect::new();
        effect.expect_name().return_const(name);
        effect.expect_fire().times(calls).returning(move |_| {
            if ok {
                Ok(())
            } else {
                Err(anyhow!("{} unavailable", name))
            }
        });
        effect
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let notifier = FallbackNotifier::new(effect("bell", true, 1), effect("banner", true, 0));
        notifier.notify(&Signal::default());
    }

    #[test]
    fn test_primary_failure_uses_fallback() {
        let notifier = FallbackNotifier::new(effect("bell", false, 1), effect("banner", true, 1));
        notifier.notify(&Signal::default());
    }

    #[test]
    fn test_double_failure_is_swallowed() {
        let notifier = FallbackNotifier::new(effect("bell", false, 1), effect("banner", false, 1));
        notifier.notify(&Signal::default());
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let mut first = MockNotifier::new();
        first.expect_notify().times(1).return_const(());
        let mut second = MockNotifier::new();
        second.expect_notify().times(1).return_const(());

        let fanout = Fanout::new().with(Arc::new(first)).with(Arc::new(second));
        assert_eq!(fanout.len(), 2);
        fanout.notify(&Signal::default());
    }
}
