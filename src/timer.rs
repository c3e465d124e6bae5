//! Deadline-ordered timer lists.
//!
//! The engine never sleeps. It records deadlines here and the runtime (or a
//! test) calls [`Engine::on_tick`](crate::engine::Engine::on_tick) once the
//! earliest one has passed. Starting a timer replaces any running timer of the
//! same kind; stopping is idempotent, so cancelling a timer that already
//! expired is harmless.

use tokio::time::Instant;

/// Identity of a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Waiting for the response to the outstanding command.
    CommandResponse,
    /// A deferred deactivate waiting for RF credits to return.
    DeactivateWait,
    /// An RF send waiting for credits.
    CreditWait,
    /// Owner-defined quick timer.
    Quick(u16),
}

/// Timers sorted by deadline, earliest first.
#[derive(Debug, Default)]
pub struct TimerList {
    entries: Vec<(Instant, TimerKind)>,
}

impl TimerList {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self { Self { entries: Vec::new() } }

    /// Number of running timers.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether no timer is running.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Start `kind` so it expires at `deadline`, replacing any earlier start.
    pub fn start(&mut self, kind: TimerKind, deadline: Instant) {
        self.stop(kind);
        let index = self.entries.partition_point(|(at, _)| *at <= deadline);
        self.entries.insert(index, (deadline, kind));
    }

    /// Stop `kind`. Returns whether it was running.
    pub fn stop(&mut self, kind: TimerKind) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(_, k)| *k != kind);
        before != self.entries.len()
    }

    /// Whether `kind` is running.
    #[must_use]
    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.entries.iter().any(|(_, k)| *k == kind)
    }

    /// Earliest deadline, if any timer is running.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> { self.entries.first().map(|(at, _)| *at) }

    /// Remove and return every timer whose deadline is at or before `now`, in
    /// expiry order.
    pub fn pop_expired(&mut self, now: Instant) -> Vec<TimerKind> {
        let split = self.entries.partition_point(|(at, _)| *at <= now);
        self.entries.drain(..split).map(|(_, kind)| kind).collect()
    }

    /// Stop every timer.
    pub fn clear(&mut self) { self.entries.clear(); }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::{fixture, rstest};
    use tokio::time::Instant;

    use super::{TimerKind, TimerList};

    #[fixture]
    fn base() -> Instant { Instant::now() }

    #[rstest]
    fn expiries_come_out_in_deadline_order(base: Instant) {
        let mut timers = TimerList::new();
        timers.start(TimerKind::DeactivateWait, base + Duration::from_secs(3));
        timers.start(TimerKind::CommandResponse, base + Duration::from_secs(1));
        timers.start(TimerKind::Quick(4), base + Duration::from_secs(2));
        assert_eq!(timers.next_deadline(), Some(base + Duration::from_secs(1)));
        assert_eq!(
            timers.pop_expired(base + Duration::from_secs(2)),
            vec![TimerKind::CommandResponse, TimerKind::Quick(4)]
        );
        assert_eq!(timers.len(), 1);
    }

    #[rstest]
    fn restarting_replaces_the_deadline(base: Instant) {
        let mut timers = TimerList::new();
        timers.start(TimerKind::CommandResponse, base + Duration::from_secs(1));
        timers.start(TimerKind::CommandResponse, base + Duration::from_secs(5));
        assert_eq!(timers.len(), 1);
        assert!(timers.pop_expired(base + Duration::from_secs(2)).is_empty());
    }

    #[rstest]
    fn stopping_is_idempotent(base: Instant) {
        let mut timers = TimerList::new();
        timers.start(TimerKind::CreditWait, base);
        assert!(timers.stop(TimerKind::CreditWait));
        assert!(!timers.stop(TimerKind::CreditWait));
        assert!(timers.is_empty());
        assert_eq!(timers.next_deadline(), None);
    }
}
