//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Provides the clock and the deferred-execution primitive used by a benchmark suite.
///
/// The suite never reads the clock or sleeps directly, so tests can substitute a virtual
/// clock and observe the delays the scheduler asks for.
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Gets the current timestamp.
    fn now(&self) -> Instant;

    /// Blocks the current thread until `duration` has passed.
    fn sleep(&self, duration: Duration);
}
