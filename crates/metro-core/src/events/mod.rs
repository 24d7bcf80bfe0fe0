//! Event Logging
//!
//! Per-tick event buffering and the JSONL event log.

pub mod logger;

pub use logger::{EventLogger, TickEvents};
