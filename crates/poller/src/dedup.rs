use common::models::{Signal, SignalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New id with a buy/sell side. Fire the notification.
    Notify,
    /// New id, but a placeholder side. Remembered, not announced.
    Record,
    /// No id, or the id we already have.
    Ignore,
}

/// Remembers the id of the last new signal so repeated polls of the same row stay quiet.
#[derive(Debug, Default)]
pub struct DedupTracker {
    last_id: Option<SignalId>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_id(&self) -> Option<&SignalId> {
        self.last_id.as_ref()
    }

    pub fn observe(&mut self, signal: Option<&Signal>) -> Verdict {
        let Some(signal) = signal else {
            return Verdict::Ignore;
        };
        let Some(current) = signal.id.as_ref() else {
            return Verdict::Ignore;
        };

        if self.last_id.as_ref() == Some(current) {
            return Verdict::Ignore;
        }

        self.last_id = Some(current.clone());

        if signal.side.as_ref().is_some_and(|s| s.is_actionable()) {
            Verdict::Notify
        } else {
            Verdict::Record
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Side;

    fn signal(id: Option<i64>, side: Option<Side>) -> Signal {
        Signal {
            id: id.map(SignalId::Number),
            side,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_id_notifies_once() {
        let mut tracker = DedupTracker::new();
        let buy = signal(Some(1), Some(Side::Buy));

        assert_eq!(tracker.observe(Some(&buy)), Verdict::Notify);
        assert_eq!(tracker.observe(Some(&buy)), Verdict::Ignore);
        assert_eq!(tracker.observe(Some(&buy)), Verdict::Ignore);
        assert_eq!(tracker.last_id(), Some(&SignalId::Number(1)));
    }

    #[test]
    fn test_new_id_notifies_again() {
        let mut tracker = DedupTracker::new();

        assert_eq!(tracker.observe(Some(&signal(Some(1), Some(Side::Buy)))), Verdict::Notify);
        assert_eq!(tracker.observe(Some(&signal(Some(2), Some(Side::Sell)))), Verdict::Notify);
        assert_eq!(tracker.last_id(), Some(&SignalId::Number(2)));
    }

    #[test]
    fn test_placeholders_never_notify() {
        let mut tracker = DedupTracker::new();

        for _ in 0..3 {
            assert_eq!(tracker.observe(Some(&signal(None, Some(Side::None)))), Verdict::Ignore);
            assert_eq!(tracker.observe(Some(&signal(None, Some(Side::Buy)))), Verdict::Ignore);
            assert_eq!(tracker.observe(None), Verdict::Ignore);
        }
        assert_eq!(tracker.last_id(), None);

        assert_eq!(tracker.observe(Some(&signal(Some(5), Some(Side::None)))), Verdict::Record);
        assert_eq!(tracker.observe(Some(&signal(Some(6), None))), Verdict::Record);
        assert_eq!(
            tracker.observe(Some(&signal(Some(7), Some(Side::Other("hold".into()))))),
            Verdict::Record
        );
        assert_eq!(tracker.last_id(), Some(&SignalId::Number(7)));
    }

    #[test]
    fn test_recorded_placeholder_id_suppresses_later_upgrade() {
        // The id is consumed when first seen, even as a placeholder.
        let mut tracker = DedupTracker::new();

        assert_eq!(tracker.observe(Some(&signal(Some(9), Some(Side::None)))), Verdict::Record);
        assert_eq!(tracker.observe(Some(&signal(Some(9), Some(Side::Buy)))), Verdict::Ignore);
    }

    #[test]
    fn test_missing_signal_keeps_state() {
        let mut tracker = DedupTracker::new();
        tracker.observe(Some(&signal(Some(1), Some(Side::Buy))));

        assert_eq!(tracker.observe(None), Verdict::Ignore);
        assert_eq!(tracker.observe(Some(&signal(None, None))), Verdict::Ignore);
        assert_eq!(tracker.last_id(), Some(&SignalId::Number(1)));

        // Returning to the old id after an empty poll does not re-announce it.
        assert_eq!(tracker.observe(Some(&signal(Some(1), Some(Side::Buy)))), Verdict::Ignore);
    }
}
