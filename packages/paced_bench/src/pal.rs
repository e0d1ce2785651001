//! Platform abstraction layer for time measurement and inter-step delays.
//!
//! This module allows switching between the real clock and thread sleep of the operating
//! system and a fake implementation with a virtual clock for testing purposes.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
pub(crate) use real::RealPlatform;
