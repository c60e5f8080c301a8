//! orgpulse library
//!
//! This module exports the pipeline, report rendering, and configuration
//! layers of the `orgpulse` command for use in integration tests and as a
//! library.

pub mod config;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod summarize;
