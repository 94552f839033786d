//! # Clock Abstraction
//!
//! Every countdown in the ledger — minting, redemption, whitelist removal,
//! delayed transfers, daily-limit windows — is checked lazily: a stored
//! start timestamp plus a configured length, compared against the current
//! time at call time. There are no background timers. That makes the clock
//! the single ambient input to the whole engine, so it is injected rather
//! than read from the OS directly: production wires in [`SystemClock`],
//! tests wire in a [`ManualClock`] and advance it deterministically.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// The authoritative "now" observed by the current call.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The production clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock for tests.
///
/// Starts at a fixed instant and only moves when told to. Cloneable handle —
/// hold one side in the test, hand the other to the registry.
///
/// ```
/// use landmark_ledger::clock::{Clock, ManualClock};
/// use chrono::Duration;
///
/// let clock = ManualClock::starting_now();
/// let t0 = clock.now();
/// clock.advance(Duration::hours(48));
/// assert_eq!(clock.now() - t0, Duration::hours(48));
/// ```
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a manual clock pinned to the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Creates a manual clock pinned to the real current time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.write();
        *now += delta;
    }

    /// Pins the clock to an exact instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.write() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::starting_now();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), t0 + Duration::seconds(30));
    }

    #[test]
    fn manual_clock_handles_share_state() {
        let a = ManualClock::starting_now();
        let b = a.clone();
        a.advance(Duration::hours(1));
        assert_eq!(a.now(), b.now());
    }

    #[test]
    fn set_pins_to_exact_instant() {
        let clock = ManualClock::starting_now();
        let target = clock.now() + Duration::days(3);
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
