//! Line Setup
//!
//! Station, train and wagon creation.

pub mod line;

pub use line::*;
