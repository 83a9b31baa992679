//! Change detection engine.
//!
//! This crate contains the pollers that watch each tracked dimension for
//! additions and removals, plus the snapshot store they persist to.

pub mod dimension;
pub mod poller;
pub mod store;
pub mod throttle;

#[cfg(test)]
mod testkit;

pub use dimension::*;
pub use poller::*;
pub use store::*;
pub use throttle::*;
