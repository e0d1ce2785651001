use std::num::NonZero;
use std::time::Duration;

use tracing::trace;

use crate::pal::Platform;
use crate::{Metrics, Scratch};

pub(crate) type WorkloadFn = Box<dyn FnMut(&mut Scratch) + Send>;

/// One benchmarked function together with its scratch state and its collected metrics.
///
/// Workloads are created by [`Suite::add()`][crate::Suite::add] and live as long as the suite.
/// Every measured run of a workload invokes its function repeatedly until the run budget
/// of the suite has been spent inside the function, then records a single [`Sample`][1]
/// with the number of invocations and the time they took.
///
/// Measuring over a fixed time budget instead of a fixed iteration count lets fast and slow
/// workloads be compared on equal terms.
///
/// [1]: crate::Sample
#[derive(derive_more::Debug)]
pub struct Workload {
    name: String,

    #[debug(ignore)]
    function: WorkloadFn,

    scratch: Scratch,
    metrics: Metrics,
}

impl Workload {
    pub(crate) fn new(name: String, function: WorkloadFn) -> Self {
        Self {
            name,
            function,
            scratch: Scratch::new(),
            metrics: Metrics::new(),
        }
    }

    /// The name of the workload.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The samples collected by the measured runs of this workload.
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The scratch state of this workload.
    #[must_use]
    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    /// The scratch state of this workload, for seeding it before the suite starts.
    #[must_use]
    pub fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }

    /// Discards all collected metrics and all scratch state.
    pub(crate) fn reset(&mut self) {
        self.metrics = Metrics::new();
        self.scratch = Scratch::new();
    }

    /// Executes one measured run and records its sample.
    ///
    /// The budget check happens before every invocation, so at least one invocation always
    /// takes place, even if that single invocation exceeds the budget.
    pub(crate) fn run(&mut self, platform: &impl Platform, budget: Duration) {
        let mut elapsed = Duration::ZERO;
        let mut operations = 0_u64;

        while elapsed < budget {
            let started = platform.now();
            (self.function)(&mut self.scratch);
            elapsed = elapsed.saturating_add(platform.now().saturating_duration_since(started));

            operations = operations
                .checked_add(1)
                .expect("operation count overflows u64 - this indicates an unrealistic scenario");
        }

        let operations = NonZero::new(operations)
            .expect("guarded by positive run budget, which admits at least one invocation");

        trace!(
            workload = %self.name,
            operations,
            elapsed = ?elapsed,
            "measured run completed"
        );

        self.metrics.record(operations, elapsed);
    }
}
