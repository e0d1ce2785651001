//! Throughput statistics derived from measured runs.

use std::convert::Infallible;
use std::fmt;
use std::num::NonZero;
use std::str::FromStr;
use std::time::Duration;

use crate::format;

/// Selects how the samples of a [`Metrics`] are aggregated by its statistics accessors.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Measure {
    /// The sum over all samples.
    Total,

    /// The most recently recorded sample.
    Latest,

    /// The sum over all samples divided by the number of samples.
    #[default]
    Average,
}

impl Measure {
    /// The name of the measure, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Latest => "latest",
            Self::Average => "average",
        }
    }
}

impl FromStr for Measure {
    type Err = Infallible;

    /// Parses `"total"`, `"latest"` or `"average"`. Any other value means [`Measure::Average`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "total" => Self::Total,
            "latest" => Self::Latest,
            _ => Self::Average,
        })
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation produced by exactly one measured run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sample {
    operations: NonZero<u64>,
    elapsed: Duration,
}

impl Sample {
    /// Creates a sample of `operations` invocations that took `elapsed` in total.
    #[must_use]
    pub fn new(operations: NonZero<u64>, elapsed: Duration) -> Self {
        Self {
            operations,
            elapsed,
        }
    }

    /// How many whole invocations of the workload function the run performed.
    #[must_use]
    pub fn operations(&self) -> NonZero<u64> {
        self.operations
    }

    /// Cumulative time spent inside the workload function during the run.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Accumulates the samples of one workload and derives statistics from them on demand.
///
/// Samples are kept in the order they were recorded. Ratios (time per operation, frequency)
/// are always computed from the aggregated operation count and elapsed time at the same
/// aggregation level, never by averaging per-sample ratios, which would bias the result
/// toward short runs.
///
/// All statistics return `None` if nothing has been recorded yet.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use new_zealand::nz;
/// use paced_bench::{Measure, Metrics};
///
/// let mut metrics = Metrics::new();
/// metrics.record(nz!(10), Duration::from_millis(100));
/// metrics.record(nz!(1000), Duration::from_millis(500));
///
/// // 1010 operations in 600 ms.
/// let frequency = metrics.frequency(Measure::Total).unwrap();
/// assert!((frequency - 1010.0 / 0.6).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    samples: Vec<Sample>,
}

impl Metrics {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample.
    pub fn record(&mut self, operations: NonZero<u64>, elapsed: Duration) {
        self.samples.push(Sample::new(operations, elapsed));
    }

    /// Number of samples recorded so far.
    #[must_use]
    pub fn records_count(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples have been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The recorded samples, oldest first.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Elapsed time of the samples, aggregated according to `measure`.
    #[must_use]
    pub fn elapsed_time(&self, measure: Measure) -> Option<Duration> {
        match measure {
            Measure::Total => (!self.is_empty()).then(|| self.total_elapsed()),
            Measure::Latest => self.samples.last().map(Sample::elapsed),
            Measure::Average => {
                let count = u32::try_from(self.records_count())
                    .expect("sample count exceeding u32 indicates an unrealistic scenario");
                self.total_elapsed().checked_div(count)
            }
        }
    }

    /// Operation count of the samples, aggregated according to `measure`.
    ///
    /// The average is generally fractional, so all measures are expressed as `f64`.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "operation counts far beyond 2^52 are unrealistic"
    )]
    pub fn operations(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Total => (!self.is_empty()).then(|| self.total_operations() as f64),
            Measure::Latest => self.samples.last().map(|s| s.operations().get() as f64),
            Measure::Average => (!self.is_empty())
                .then(|| self.total_operations() as f64 / self.records_count() as f64),
        }
    }

    /// Mean time taken by one operation: elapsed time divided by operation count, both
    /// aggregated according to `measure`.
    #[must_use]
    pub fn operation_time(&self, measure: Measure) -> Option<Duration> {
        let elapsed = self.elapsed_time(measure)?;
        let operations = self.operations(measure)?;

        Some(elapsed.div_f64(operations))
    }

    /// Operations per second: operation count divided by elapsed time, both aggregated
    /// according to `measure`.
    ///
    /// If the elapsed time is zero, the frequency is infinite.
    #[must_use]
    pub fn frequency(&self, measure: Measure) -> Option<f64> {
        let elapsed = self.elapsed_time(measure)?;
        let operations = self.operations(measure)?;

        Some(operations / elapsed.as_secs_f64())
    }

    /// Renders the frequency with two decimal places, e.g. `1234567.89 ops/s`.
    ///
    /// Renders `NaN ops/s` if nothing has been recorded.
    #[must_use]
    pub fn display(&self, measure: Measure) -> String {
        format::fixed(self.frequency(measure).unwrap_or(f64::NAN))
    }

    /// Renders the frequency with thousands grouping, e.g. `1,234,567.89 ops/s`.
    ///
    /// The fractional part is truncated to two digits. Empty separators fall back to
    /// [`DEFAULT_THOUSANDS_SEPARATOR`][crate::DEFAULT_THOUSANDS_SEPARATOR] and
    /// [`DEFAULT_DECIMAL_SEPARATOR`][crate::DEFAULT_DECIMAL_SEPARATOR].
    #[must_use]
    pub fn to_formatted_string(
        &self,
        measure: Measure,
        thousands_separator: &str,
        decimal_separator: &str,
    ) -> String {
        format::grouped(
            self.frequency(measure).unwrap_or(f64::NAN),
            thousands_separator,
            decimal_separator,
        )
    }

    fn total_elapsed(&self) -> Duration {
        self.samples
            .iter()
            .map(Sample::elapsed)
            .try_fold(Duration::ZERO, Duration::checked_add)
            .expect("elapsed time accumulation overflows Duration - this indicates an unrealistic scenario")
    }

    fn total_operations(&self) -> u64 {
        self.samples
            .iter()
            .map(|s| s.operations().get())
            .try_fold(0_u64, u64::checked_add)
            .expect("operation count accumulation overflows u64 - this indicates an unrealistic scenario")
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(Measure::Average))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;
    use testing::f64_diff_abs;

    use super::*;

    static_assertions::assert_impl_all!(Metrics: Send, Sync);

    fn millis(duration: Duration) -> f64 {
        duration.as_secs_f64() * 1000.0
    }

    fn asymmetric_pair() -> Metrics {
        let mut metrics = Metrics::new();
        metrics.record(nz!(10), Duration::from_millis(100));
        metrics.record(nz!(1000), Duration::from_millis(500));
        metrics
    }

    #[test]
    fn empty_metrics_have_no_statistics() {
        let metrics = Metrics::new();

        assert_eq!(metrics.records_count(), 0);
        assert!(metrics.is_empty());

        for measure in [Measure::Total, Measure::Latest, Measure::Average] {
            assert_eq!(metrics.elapsed_time(measure), None);
            assert_eq!(metrics.operations(measure), None);
            assert_eq!(metrics.operation_time(measure), None);
            assert_eq!(metrics.frequency(measure), None);
        }

        assert_eq!(metrics.to_string(), "NaN ops/s");
    }

    #[test]
    fn record_increments_count_in_order() {
        let metrics = asymmetric_pair();

        assert_eq!(metrics.records_count(), 2);
        assert_eq!(
            metrics.samples(),
            &[
                Sample::new(nz!(10), Duration::from_millis(100)),
                Sample::new(nz!(1000), Duration::from_millis(500)),
            ]
        );
    }

    #[test]
    fn latest_is_most_recent_record() {
        let mut metrics = asymmetric_pair();

        assert_eq!(
            metrics.elapsed_time(Measure::Latest),
            Some(Duration::from_millis(500))
        );

        metrics.record(nz!(3), Duration::from_millis(7));

        assert_eq!(
            metrics.elapsed_time(Measure::Latest),
            Some(Duration::from_millis(7))
        );
        assert_eq!(metrics.operations(Measure::Latest), Some(3.0));
    }

    #[test]
    fn totals_and_averages() {
        let metrics = asymmetric_pair();

        assert_eq!(
            metrics.elapsed_time(Measure::Total),
            Some(Duration::from_millis(600))
        );
        assert_eq!(
            metrics.elapsed_time(Measure::Average),
            Some(Duration::from_millis(300))
        );
        assert_eq!(metrics.operations(Measure::Total), Some(1010.0));
        assert_eq!(metrics.operations(Measure::Average), Some(505.0));
    }

    #[test]
    fn operation_time_is_ratio_of_aggregates() {
        let metrics = asymmetric_pair();

        let total = millis(metrics.operation_time(Measure::Total).unwrap());
        let average = millis(metrics.operation_time(Measure::Average).unwrap());
        let latest = millis(metrics.operation_time(Measure::Latest).unwrap());

        assert_eq!(f64_diff_abs(total, 600.0 / 1010.0, 1e-6), 0.0);
        assert_eq!(f64_diff_abs(average, 600.0 / 1010.0, 1e-6), 0.0);
        assert_eq!(f64_diff_abs(latest, 0.5, 1e-6), 0.0);

        // The naive average of per-sample ratios would be (10 + 0.5) / 2.
        assert!(f64_diff_abs(average, 5.25, 1e-3) > 0.0);
    }

    #[test]
    fn total_frequency_is_sum_of_operations_over_sum_of_time() {
        let metrics = asymmetric_pair();

        let expected = (1010.0 / 600.0) * 1000.0;
        let frequency = metrics.frequency(Measure::Total).unwrap();

        assert_eq!(f64_diff_abs(frequency, expected, 1e-6), 0.0);
    }

    #[test]
    fn latest_frequency() {
        let metrics = asymmetric_pair();

        let frequency = metrics.frequency(Measure::Latest).unwrap();

        assert_eq!(f64_diff_abs(frequency, 2000.0, 1e-6), 0.0);
    }

    #[test]
    fn zero_elapsed_time_gives_infinite_frequency() {
        let mut metrics = Metrics::new();
        metrics.record(nz!(5), Duration::ZERO);

        assert_eq!(metrics.frequency(Measure::Average), Some(f64::INFINITY));
        assert_eq!(
            metrics.to_formatted_string(Measure::Average, "", ""),
            "inf ops/s"
        );
    }

    #[test]
    fn display_uses_average_with_two_decimals() {
        let mut metrics = Metrics::new();
        metrics.record(nz!(3), Duration::from_millis(1000));
        metrics.record(nz!(1), Duration::from_millis(1000));

        assert_eq!(metrics.to_string(), "2.00 ops/s");
        assert_eq!(metrics.display(Measure::Latest), "1.00 ops/s");
    }

    #[test]
    fn formatted_string_groups_thousands() {
        let mut metrics = Metrics::new();
        // 1 234 567 operations in one second.
        metrics.record(nz!(1_234_567), Duration::from_secs(1));

        assert_eq!(
            metrics.to_formatted_string(Measure::Total, "", ""),
            "1,234,567 ops/s"
        );
        assert_eq!(
            metrics.to_formatted_string(Measure::Total, "'", "."),
            "1'234'567 ops/s"
        );
    }

    #[test]
    fn measure_parses_known_names() {
        assert_eq!("total".parse::<Measure>(), Ok(Measure::Total));
        assert_eq!("latest".parse::<Measure>(), Ok(Measure::Latest));
        assert_eq!("average".parse::<Measure>(), Ok(Measure::Average));
    }

    #[test]
    fn unknown_measure_falls_back_to_average() {
        assert_eq!("median".parse::<Measure>(), Ok(Measure::Average));
        assert_eq!("".parse::<Measure>(), Ok(Measure::Average));
        assert_eq!(Measure::default(), Measure::Average);
    }

    #[test]
    fn measure_display_round_trips() {
        for measure in [Measure::Total, Measure::Latest, Measure::Average] {
            assert_eq!(measure.to_string().parse::<Measure>(), Ok(measure));
        }
    }
}
