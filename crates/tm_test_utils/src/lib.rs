//! # Tournament Telemetry Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fake host and manual clock
//! - Whole-session harness writing to a temp directory
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod harness;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
