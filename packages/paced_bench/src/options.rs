use std::num::NonZero;
use std::time::Duration;

use new_zealand::nz;

use crate::{Error, Result};

const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);
const DEFAULT_TEST_RUNS: NonZero<u32> = nz!(3_u32);
const DEFAULT_RUN_BUDGET: Duration = Duration::from_millis(1000);

/// Configuration of a [`Suite`][crate::Suite].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use new_zealand::nz;
/// use paced_bench::{Suite, SuiteOptions};
///
/// let options = SuiteOptions::new()
///     .with_interval(Duration::from_millis(250))
///     .with_test_runs(nz!(5));
///
/// let suite = Suite::with_options(options).unwrap();
/// assert_eq!(suite.options().test_runs().get(), 5);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub struct SuiteOptions {
    interval: Duration,
    test_runs: NonZero<u32>,
    run_budget: Duration,
}

impl SuiteOptions {
    /// Creates the default configuration: 1 second between measured runs, 3 measured runs
    /// per workload and 1 second of workload execution per measured run.
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            test_runs: DEFAULT_TEST_RUNS,
            run_budget: DEFAULT_RUN_BUDGET,
        }
    }

    /// Sets the delay between consecutive measured runs, which lets the host environment
    /// settle before the next measurement. Must be positive.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets how many measured runs each workload gets.
    pub fn with_test_runs(mut self, test_runs: NonZero<u32>) -> Self {
        self.test_runs = test_runs;
        self
    }

    /// Sets how much time a single measured run spends executing the workload function.
    /// Must be positive.
    pub fn with_run_budget(mut self, run_budget: Duration) -> Self {
        self.run_budget = run_budget;
        self
    }

    /// The delay between consecutive measured runs.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How many measured runs each workload gets.
    #[must_use]
    pub fn test_runs(&self) -> NonZero<u32> {
        self.test_runs
    }

    /// How much time a single measured run spends executing the workload function.
    #[must_use]
    pub fn run_budget(&self) -> Duration {
        self.run_budget
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(Error::Configuration {
                problem: "interval between measured runs must be positive".to_string(),
            });
        }

        if self.run_budget.is_zero() {
            return Err(Error::Configuration {
                problem: "run budget must be positive".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = SuiteOptions::default();

        assert_eq!(options.interval(), Duration::from_millis(1000));
        assert_eq!(options.test_runs().get(), 3);
        assert_eq!(options.run_budget(), Duration::from_millis(1000));
        options.validate().unwrap();
    }

    #[test]
    fn setters_override_defaults() {
        let options = SuiteOptions::new()
            .with_interval(Duration::from_millis(10))
            .with_test_runs(nz!(7))
            .with_run_budget(Duration::from_millis(20));

        assert_eq!(options.interval(), Duration::from_millis(10));
        assert_eq!(options.test_runs().get(), 7);
        assert_eq!(options.run_budget(), Duration::from_millis(20));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = SuiteOptions::new().with_interval(Duration::ZERO).validate();

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn zero_run_budget_is_rejected() {
        let result = SuiteOptions::new().with_run_budget(Duration::ZERO).validate();

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }
}
