use std::thread;
use std::time::{Duration, Instant};

use crate::pal::Platform;

/// Uses the monotonic clock and thread sleep provided by the Rust standard library.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RealPlatform;

impl Platform for RealPlatform {
    #[cfg_attr(test, mutants::skip)] // Real time cannot be asserted on exactly.
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[cfg_attr(test, mutants::skip)] // Real time cannot be asserted on exactly.
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
