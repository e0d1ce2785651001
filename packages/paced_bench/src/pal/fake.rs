//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::pal::Platform;

const ERR_POISONED_LOCK: &str = "FakePlatform state lock should not be poisoned";

#[derive(Debug)]
struct FakePlatformState {
    origin: Instant,
    elapsed: Duration,

    /// How far the virtual clock moves forward every time it is read.
    tick: Duration,

    /// Every delay requested through `sleep()`, in order.
    sleeps: Vec<Duration>,
}

/// Fake implementation of the platform abstraction with a virtual clock.
///
/// Every read of the clock returns the current virtual time and then advances it by the
/// configured tick, so a measured run that reads the clock twice per invocation observes
/// exactly one tick of elapsed time per invocation. Sleeping advances the virtual clock by
/// the requested delay without blocking.
///
/// Clones share the same state, so a test can keep one clone for inspection after handing
/// another to the suite.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    /// Creates a fake platform whose clock advances by `tick` on every read.
    pub(crate) fn with_tick(tick: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakePlatformState {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                tick,
                sleeps: Vec::new(),
            })),
        }
    }

    /// Changes how far the clock advances on every read.
    pub(crate) fn set_tick(&self, tick: Duration) {
        self.state.lock().expect(ERR_POISONED_LOCK).tick = tick;
    }

    /// The delays requested through `sleep()` so far, in order.
    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().expect(ERR_POISONED_LOCK).sleeps.clone()
    }

    /// Total virtual time that has passed since the platform was created.
    pub(crate) fn elapsed(&self) -> Duration {
        self.state.lock().expect(ERR_POISONED_LOCK).elapsed
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> Instant {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        let now = state
            .origin
            .checked_add(state.elapsed)
            .expect("virtual clock stays within realistic bounds");

        state.elapsed = state
            .elapsed
            .checked_add(state.tick)
            .expect("virtual clock stays within realistic bounds");

        now
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        state.elapsed = state
            .elapsed
            .checked_add(duration)
            .expect("virtual clock stays within realistic bounds");
        state.sleeps.push(duration);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_by_tick_per_read() {
        let platform = FakePlatform::with_tick(Duration::from_millis(10));

        let first = platform.now();
        let second = platform.now();

        assert_eq!(second.duration_since(first), Duration::from_millis(10));
        assert_eq!(platform.elapsed(), Duration::from_millis(20));
    }

    #[test]
    fn sleep_advances_clock_and_is_recorded() {
        let platform = FakePlatform::with_tick(Duration::ZERO);

        let before = platform.now();
        platform.sleep(Duration::from_millis(100));
        platform.sleep(Duration::from_millis(250));
        let after = platform.now();

        assert_eq!(after.duration_since(before), Duration::from_millis(350));
        assert_eq!(
            platform.sleeps(),
            vec![Duration::from_millis(100), Duration::from_millis(250)]
        );
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::with_tick(Duration::ZERO);
        let platform2 = platform1.clone();

        platform1.set_tick(Duration::from_millis(5));
        platform2.now();

        assert_eq!(platform1.elapsed(), Duration::from_millis(5));
    }
}
