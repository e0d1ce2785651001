use std::fmt;
use std::iter;

use crate::{Error, Suite, Workload};

/// A lifecycle event published by a [`Suite`].
///
/// Over one complete run of a suite, events are published in this order: `Started`,
/// `Calibrating`, `Calibrated`, then for each workload `Testing` once, `Test` once per
/// measured run and `Tested` once, and finally `Completed`. If a step fails, `Error` is
/// published instead of the remaining events.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum SuiteEvent {
    /// The suite has started. The subject is the suite.
    Started,

    /// The calibration runs are about to begin. The subject is the suite.
    Calibrating,

    /// The calibration runs have finished. The subject is the suite.
    Calibrated,

    /// The first measured run of a workload is about to begin. The subject is the workload.
    Testing,

    /// A measured run of a workload has finished. The subject is the workload.
    Test,

    /// The last measured run of a workload has finished. The subject is the workload.
    Tested,

    /// All workloads have been measured. The subject is the suite.
    Completed,

    /// A step failed and the suite has stopped. The subject is the error.
    Error,
}

impl SuiteEvent {
    /// Every event, in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::Started,
        Self::Calibrating,
        Self::Calibrated,
        Self::Testing,
        Self::Test,
        Self::Tested,
        Self::Completed,
        Self::Error,
    ];

    /// The lowercase name of the event.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Calibrating => "calibrating",
            Self::Calibrated => "calibrated",
            Self::Testing => "testing",
            Self::Test => "test",
            Self::Tested => "tested",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SuiteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// A single event is a collection of one, so it can be passed wherever a set of events is
// accepted.
impl IntoIterator for SuiteEvent {
    type Item = Self;
    type IntoIter = iter::Once<Self>;

    fn into_iter(self) -> Self::IntoIter {
        iter::once(self)
    }
}

/// What a [`SuiteEvent`] is about.
#[derive(Clone, Copy, Debug)]
#[non_exhaustive]
pub enum EventSubject<'a> {
    /// The suite as a whole.
    Suite(&'a Suite),

    /// One workload of the suite.
    Workload(&'a Workload),

    /// The failure that stopped the suite.
    Error(&'a Error),
}

impl<'a> EventSubject<'a> {
    /// The suite, if the event is about the suite.
    #[must_use]
    pub fn suite(self) -> Option<&'a Suite> {
        match self {
            Self::Suite(suite) => Some(suite),
            _ => None,
        }
    }

    /// The workload, if the event is about a workload.
    #[must_use]
    pub fn workload(self) -> Option<&'a Workload> {
        match self {
            Self::Workload(workload) => Some(workload),
            _ => None,
        }
    }

    /// The error, if the event reports a failure.
    #[must_use]
    pub fn error(self) -> Option<&'a Error> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }
}
