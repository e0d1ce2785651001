#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Micro-benchmarking harness that measures how many times per second a function can run.
//!
//! A [`Suite`] holds an ordered list of [`Workload`]s. Running the suite first calibrates by
//! measuring an empty workload, then gives every workload a fixed number of measured runs.
//! Each measured run invokes the workload function repeatedly until a time budget has been
//! spent inside it and records the result as one [`Sample`] in the [`Metrics`] of the workload.
//!
//! Consecutive measured runs are spaced apart by a configurable interval (see
//! [`SuiteOptions`]) so that the host environment can settle between them. Progress is
//! reported through [`SuiteEvent`]s delivered to handlers registered with [`Suite::on()`].
//!
//! # Example
//!
//! ```no_run
//! use std::hint::black_box;
//! use std::time::Duration;
//!
//! use paced_bench::{Measure, Suite, SuiteEvent, SuiteOptions};
//!
//! let options = SuiteOptions::new()
//!     .with_interval(Duration::from_millis(200))
//!     .with_run_budget(Duration::from_millis(200));
//!
//! let mut suite = Suite::with_options(options).unwrap();
//!
//! suite
//!     .add("vec push", |_| {
//!         let mut v = Vec::with_capacity(16);
//!         for i in 0..16_u32 {
//!             v.push(black_box(i));
//!         }
//!         black_box(v);
//!     })
//!     .unwrap();
//!
//! suite.on(SuiteEvent::Completed, |_event, subject| {
//!     let suite = subject.suite().unwrap();
//!
//!     for workload in suite.workloads() {
//!         println!("{}: {}", workload.name(), workload.metrics().display(Measure::Average));
//!     }
//! });
//!
//! suite.run().unwrap();
//! ```
//!
//! # Workload state
//!
//! Every workload owns a [`Scratch`] map that its function receives on every invocation.
//! The map persists across invocations and measured runs and is cleared when a suite that
//! has already run is reset or restarted. Optional setup and teardown hooks
//! ([`Suite::set_setup()`], [`Suite::set_teardown()`]) receive the same map around each
//! measured run, outside of the measured time.
//!
//! # Failures
//!
//! A panic in a workload function, a hook or an event handler stops the suite. The call
//! that was executing ([`Suite::start()`] or [`Suite::step()`], and therefore
//! [`Suite::run()`]) returns [`Error::Panicked`], [`SuiteEvent::Error`] is published and the
//! suite enters [`SuiteState::Failed`], from which it can be reset or restarted.

mod bus;
mod error;
mod events;
mod format;
mod metrics;
mod options;
mod pal;
mod scratch;
mod suite;
mod workload;

pub use bus::*;
pub use error::*;
pub use events::*;
pub use format::{DEFAULT_DECIMAL_SEPARATOR, DEFAULT_THOUSANDS_SEPARATOR};
pub use metrics::*;
pub use options::*;
pub use scratch::*;
pub use suite::*;
pub use workload::*;
