use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, trace};

use crate::pal::{Platform, PlatformFacade};
use crate::{
    Error, EventBus, EventSubject, Measure, Metrics, Notifiable, Result, Scratch, SuiteEvent,
    SuiteOptions, Workload,
};

/// How many measured runs of the no-op calibration workload precede the real measurements.
const CALIBRATION_RUNS: u32 = 5;

/// Spacing of the calibration steps. Independent of the configured interval.
const CALIBRATION_SPACING: Duration = Duration::from_millis(100);

const CALIBRATION_WORKLOAD_NAME: &str = "calibration";

/// Names the suite itself as the subject of a panic outside of any workload step.
const SUITE_SUBJECT: &str = "suite";

/// The handler type accepted by [`Suite::on()`] and [`Suite::off()`].
pub type SuiteHandler = dyn Fn(SuiteEvent, EventSubject<'_>) + Send + Sync;

type HookFn = Box<dyn FnMut(&mut Scratch) + Send>;

/// The lifecycle state of a [`Suite`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SuiteState {
    /// Not started since creation or since the last reset.
    Idle,

    /// Measuring the overhead of an empty workload.
    Calibrating,

    /// Measuring the workloads.
    Testing,

    /// All workloads have been measured.
    Completed,

    /// A step failed. The suite must be reset or restarted.
    Failed,
}

/// The outcome of one [`Suite::step()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a step either schedules another step or ends the run, there is no third option"
)]
pub enum Step {
    /// Another step is due once `after` has passed.
    Continue {
        /// The delay before the next step.
        after: Duration,
    },

    /// The suite has completed. No further steps are due.
    Completed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Calibrating { runs: u32 },
    Testing { index: usize },
    Completed,
    Failed,
}

/// An ordered collection of workloads that are measured one after another.
///
/// Starting a suite first measures an empty calibration workload 5 times, 100 ms apart, to
/// estimate the fixed overhead of a measured run. It then gives each workload, in the order
/// they were added, the configured number of measured runs, waiting the configured interval
/// before every step to let the host environment settle. Lifecycle events are published
/// throughout (see [`SuiteEvent`]).
///
/// The suite is a state machine driven one step at a time. [`run()`](Self::run) drives it to
/// completion on the current thread, sleeping between steps. Alternatively, call
/// [`start()`](Self::start) and then [`step()`](Self::step) whenever the delay returned by the
/// previous step has passed, for example from an external scheduler.
///
/// # Examples
///
/// ```no_run
/// use std::hint::black_box;
///
/// use paced_bench::{Measure, Suite, SuiteEvent};
///
/// let mut suite = Suite::new();
///
/// suite
///     .add("sum", |_| {
///         black_box((0..100_u64).sum::<u64>());
///     })
///     .unwrap();
///
/// suite.on(SuiteEvent::Tested, |_event, subject| {
///     if let Some(workload) = subject.workload() {
///         println!(
///             "{}: {}",
///             workload.name(),
///             workload.metrics().to_formatted_string(Measure::Average, "", "")
///         );
///     }
/// });
///
/// suite.run().unwrap();
/// ```
#[derive(derive_more::Debug)]
pub struct Suite {
    workloads: Vec<Workload>,
    options: SuiteOptions,

    calibration: Option<Metrics>,
    calibration_workload: Option<Workload>,

    /// Whether the suite has ever been started, in which case a reset must also reset
    /// the workloads.
    ran: bool,

    phase: Phase,
    next_delay: Option<Duration>,

    #[debug(ignore)]
    setup: Option<HookFn>,
    #[debug(ignore)]
    teardown: Option<HookFn>,

    bus: EventBus<SuiteEvent, SuiteHandler>,
    platform: PlatformFacade,
}

impl Suite {
    /// Creates an empty suite with the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(SuiteOptions::default(), PlatformFacade::real())
    }

    /// Creates an empty suite with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the interval or the run budget is zero.
    pub fn with_options(options: SuiteOptions) -> Result<Self> {
        options.validate()?;

        Ok(Self::with_platform(options, PlatformFacade::real()))
    }

    pub(crate) fn with_platform(options: SuiteOptions, platform: PlatformFacade) -> Self {
        Self {
            workloads: Vec::new(),
            options,
            calibration: None,
            calibration_workload: None,
            ran: false,
            phase: Phase::Idle,
            next_delay: None,
            setup: None,
            teardown: None,
            bus: EventBus::new(),
            platform,
        }
    }

    /// Adds a named workload. An empty name is replaced by `Test N`, where N is the
    /// 1-based position of the workload in the suite.
    ///
    /// Workloads are measured in the order they were added. The returned reference can be
    /// used to seed the scratch state of the workload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the suite is running.
    pub fn add<F>(&mut self, name: impl Into<String>, function: F) -> Result<&mut Workload>
    where
        F: FnMut(&mut Scratch) + Send + 'static,
    {
        if self.is_running() {
            return Err(Error::Configuration {
                problem: "workloads cannot be added while the suite is running".to_string(),
            });
        }

        let mut name = name.into();

        if name.is_empty() {
            name = format!("Test {}", self.workloads.len().saturating_add(1));
        }

        trace!(workload = %name, "workload added");

        self.workloads.push(Workload::new(name, Box::new(function)));

        Ok(self
            .workloads
            .last_mut()
            .expect("guarded by push immediately above"))
    }

    /// Adds a workload named `Test N`, where N is its 1-based position in the suite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the suite is running.
    pub fn add_unnamed<F>(&mut self, function: F) -> Result<&mut Workload>
    where
        F: FnMut(&mut Scratch) + Send + 'static,
    {
        self.add(String::new(), function)
    }

    /// Sets a hook that is called with the scratch state of the workload before each of
    /// its measured runs. The hook is not part of the measurement.
    pub fn set_setup<F>(&mut self, setup: F)
    where
        F: FnMut(&mut Scratch) + Send + 'static,
    {
        self.setup = Some(Box::new(setup));
    }

    /// Sets a hook that is called with the scratch state of the workload after each of
    /// its measured runs. The hook is not part of the measurement.
    pub fn set_teardown<F>(&mut self, teardown: F)
    where
        F: FnMut(&mut Scratch) + Send + 'static,
    {
        self.teardown = Some(Box::new(teardown));
    }

    /// Removes the setup hook.
    pub fn clear_setup(&mut self) {
        self.setup = None;
    }

    /// Removes the teardown hook.
    pub fn clear_teardown(&mut self) {
        self.teardown = None;
    }

    /// Registers a handler for one event or a collection of events.
    ///
    /// Returns the registered handler, which can be passed to [`off()`](Self::off) to
    /// remove it again or to [`Notifiable::subscribe()`] to register it for more events.
    pub fn on<F>(
        &mut self,
        events: impl IntoIterator<Item = SuiteEvent>,
        handler: F,
    ) -> Arc<SuiteHandler>
    where
        F: Fn(SuiteEvent, EventSubject<'_>) + Send + Sync + 'static,
    {
        let handler: Arc<SuiteHandler> = Arc::new(handler);
        self.bus.subscribe(events, &handler);
        handler
    }

    /// Removes one registration of `handler` for each of the given events.
    pub fn off(
        &mut self,
        events: impl IntoIterator<Item = SuiteEvent>,
        handler: &Arc<SuiteHandler>,
    ) {
        self.bus.unsubscribe(events, handler);
    }

    /// Starts the suite. Does nothing if the suite is already running.
    ///
    /// The suite is reset, [`SuiteEvent::Started`] is published and the first calibration
    /// step becomes due after 100 ms (see [`next_delay()`](Self::next_delay)).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Panicked`] if a handler of [`SuiteEvent::Started`] panicked. The suite
    /// is then in the [`SuiteState::Failed`] state and [`SuiteEvent::Error`] has been published.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            trace!("start requested while running; ignored");
            return Ok(());
        }

        self.reset();

        self.ran = true;
        self.phase = Phase::Calibrating { runs: 0 };
        self.next_delay = Some(CALIBRATION_SPACING);

        debug!(
            workloads = self.workloads.len(),
            test_runs = self.options.test_runs().get(),
            interval = ?self.options.interval(),
            "suite started"
        );

        let notified = panic::catch_unwind(AssertUnwindSafe(|| {
            self.notify(SuiteEvent::Started, EventSubject::Suite(self));
        }));

        match notified {
            Ok(()) => Ok(()),
            Err(payload) => Err(self.fail(SUITE_SUBJECT.to_string(), &*payload)),
        }
    }

    /// Executes the step that is currently due.
    ///
    /// The caller is responsible for waiting the delay returned by the previous step (or by
    /// [`next_delay()`](Self::next_delay)) before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if the suite is not running.
    ///
    /// Returns [`Error::Panicked`] if a workload function, a hook or an event handler
    /// panicked during the step. The suite is then in the [`SuiteState::Failed`] state and
    /// [`SuiteEvent::Error`] has been published.
    pub fn step(&mut self) -> Result<Step> {
        // Past the last workload, the step only completes the suite.
        let subject = match self.phase {
            Phase::Calibrating { .. } => CALIBRATION_WORKLOAD_NAME.to_string(),
            Phase::Testing { index } => self
                .workloads
                .get(index)
                .map_or_else(|| SUITE_SUBJECT.to_string(), |w| w.name().to_string()),
            Phase::Idle | Phase::Completed | Phase::Failed => return Err(Error::NotRunning),
        };

        match panic::catch_unwind(AssertUnwindSafe(|| self.advance())) {
            Ok(step) => {
                self.next_delay = match step {
                    Step::Continue { after } => Some(after),
                    Step::Completed => None,
                };

                Ok(step)
            }
            Err(payload) => Err(self.fail(subject, &*payload)),
        }
    }

    /// Starts the suite and drives it to completion, sleeping on the current thread
    /// between steps.
    ///
    /// If the suite is already running (started manually), the remaining steps are driven
    /// without restarting it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Panicked`] if a workload function, a hook or an event handler
    /// panicked. No further steps are executed.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;

        while let Some(delay) = self.next_delay {
            self.platform.sleep(delay);
            self.step()?;
        }

        Ok(())
    }

    /// Discards the calibration results and, if the suite has ever been started, the
    /// metrics and scratch state of every workload. Does nothing while running.
    pub fn reset(&mut self) {
        if self.is_running() {
            trace!("reset requested while running; ignored");
            return;
        }

        self.calibration = None;
        self.calibration_workload = None;

        if self.ran {
            for workload in &mut self.workloads {
                workload.reset();
            }
        }

        self.phase = Phase::Idle;
        self.next_delay = None;
    }

    /// The metrics of the calibration runs, if calibration has completed since the last
    /// reset.
    #[must_use]
    pub fn calibration_metrics(&self) -> Option<&Metrics> {
        self.calibration.as_ref()
    }

    /// The workloads, in measurement order.
    #[must_use]
    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    /// The workload at `index`, if any.
    #[must_use]
    pub fn workload(&self, index: usize) -> Option<&Workload> {
        self.workloads.get(index)
    }

    /// The workload at `index`, if any, for seeding its scratch state.
    #[must_use]
    pub fn workload_mut(&mut self, index: usize) -> Option<&mut Workload> {
        self.workloads.get_mut(index)
    }

    /// Number of workloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    /// Whether the suite has no workloads.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }

    /// Whether the suite is calibrating or testing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Calibrating { .. } | Phase::Testing { .. })
    }

    /// Whether the suite has ever been started.
    #[must_use]
    pub fn ran(&self) -> bool {
        self.ran
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SuiteState {
        match self.phase {
            Phase::Idle => SuiteState::Idle,
            Phase::Calibrating { .. } => SuiteState::Calibrating,
            Phase::Testing { .. } => SuiteState::Testing,
            Phase::Completed => SuiteState::Completed,
            Phase::Failed => SuiteState::Failed,
        }
    }

    /// The options the suite was created with.
    #[must_use]
    pub fn options(&self) -> &SuiteOptions {
        &self.options
    }

    /// The delay before the next step is due, or `None` if the suite is not running.
    #[must_use]
    pub fn next_delay(&self) -> Option<Duration> {
        self.next_delay
    }

    fn advance(&mut self) -> Step {
        match self.phase {
            Phase::Calibrating { runs } => self.calibrate(runs),
            Phase::Testing { index } => self.test(index),
            Phase::Idle | Phase::Completed | Phase::Failed => {
                unreachable!("guarded by running check in step()")
            }
        }
    }

    fn calibrate(&mut self, runs: u32) -> Step {
        if runs == 0 {
            self.notify(SuiteEvent::Calibrating, EventSubject::Suite(self));
        }

        if runs < CALIBRATION_RUNS {
            self.calibration_workload
                .get_or_insert_with(|| {
                    Workload::new(CALIBRATION_WORKLOAD_NAME.to_string(), Box::new(|_| {}))
                })
                .run(&self.platform, self.options.run_budget());

            self.phase = Phase::Calibrating {
                runs: runs.saturating_add(1),
            };

            return Step::Continue {
                after: CALIBRATION_SPACING,
            };
        }

        self.calibration = self
            .calibration_workload
            .take()
            .map(|workload| workload.metrics().clone());
        self.phase = Phase::Testing { index: 0 };

        debug!(
            frequency = self
                .calibration
                .as_ref()
                .and_then(|m| m.frequency(Measure::Average)),
            "calibration completed"
        );

        self.notify(SuiteEvent::Calibrated, EventSubject::Suite(self));

        Step::Continue {
            after: CALIBRATION_SPACING,
        }
    }

    fn test(&mut self, index: usize) -> Step {
        let Some(workload) = self.workloads.get(index) else {
            self.phase = Phase::Completed;

            debug!("suite completed");

            self.notify(SuiteEvent::Completed, EventSubject::Suite(self));
            return Step::Completed;
        };

        let first_run = workload.metrics().is_empty();

        if first_run {
            self.notify_about_workload(SuiteEvent::Testing, index);
        }

        let workload = self
            .workloads
            .get_mut(index)
            .expect("guarded by completion check above");

        if let Some(setup) = self.setup.as_mut() {
            setup(workload.scratch_mut());
        }

        workload.run(&self.platform, self.options.run_budget());

        self.notify_about_workload(SuiteEvent::Test, index);

        let workload = self
            .workloads
            .get_mut(index)
            .expect("guarded by completion check above");

        if let Some(teardown) = self.teardown.as_mut() {
            teardown(workload.scratch_mut());
        }

        let test_runs = usize::try_from(self.options.test_runs().get())
            .expect("u32 always fits in usize on supported targets");

        if workload.metrics().records_count() >= test_runs {
            debug!(
                workload = %workload.name(),
                frequency = workload.metrics().frequency(Measure::Average),
                "workload measured"
            );

            self.phase = Phase::Testing {
                index: index.saturating_add(1),
            };

            self.notify_about_workload(SuiteEvent::Tested, index);
        }

        Step::Continue {
            after: self.options.interval(),
        }
    }

    fn fail(&mut self, subject: String, payload: &(dyn Any + Send)) -> Error {
        let message = panic_message(payload);

        error!(
            subject = %subject,
            message = %message,
            "suite step panicked; the suite has stopped"
        );

        self.phase = Phase::Failed;
        self.next_delay = None;
        self.calibration_workload = None;

        let error = Error::Panicked { subject, message };
        self.notify(SuiteEvent::Error, EventSubject::Error(&error));
        error
    }

    fn notify(&self, event: SuiteEvent, subject: EventSubject<'_>) {
        self.bus.publish(event, |event, handler| handler(event, subject));
    }

    fn notify_about_workload(&self, event: SuiteEvent, index: usize) {
        if let Some(workload) = self.workloads.get(index) {
            self.notify(event, EventSubject::Workload(workload));
        }
    }
}

impl Notifiable<SuiteEvent> for Suite {
    type Handler = SuiteHandler;

    fn subscribe(
        &mut self,
        events: impl IntoIterator<Item = SuiteEvent>,
        handler: &Arc<SuiteHandler>,
    ) {
        self.bus.subscribe(events, handler);
    }

    fn unsubscribe(
        &mut self,
        events: impl IntoIterator<Item = SuiteEvent>,
        handler: &Arc<SuiteHandler>,
    ) {
        self.bus.unsubscribe(events, handler);
    }

    fn publish(
        &self,
        events: impl IntoIterator<Item = SuiteEvent>,
        deliver: impl FnMut(SuiteEvent, &SuiteHandler),
    ) {
        self.bus.publish(events, deliver);
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
