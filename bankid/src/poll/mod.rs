//! Push-style polling.
//!
//! A [`Poller`] runs the status engine in a background task and publishes its progress
//! into a bounded channel until the order reaches a terminal state.

mod backoff;
mod poller;

pub use backoff::Backoff;
pub use poller::{PollEvent, Poller, PollerConfig};
