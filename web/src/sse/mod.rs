//! SSE HTTP handler for the web layer.
//!
//! The push loop itself lives in `bankid::poll`; this module only adapts its events
//! to `text/event-stream`.

pub mod handler;
