//! embed-compare: command-line driver for the `comparison` core.
//!
//! Owns everything the core leaves to its caller: configuration merging,
//! the polling cadence, interrupt handling and report output.

pub mod cli;
pub mod config;
pub mod output;
pub mod runner;
