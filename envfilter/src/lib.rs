// envfilter/src/lib.rs
//! # envfilter CLI
//!
//! This crate provides the command-line host for the `envfilter-core` rule
//! engine: it builds the environment snapshot and run context from flags,
//! dispatches the rule chain, and wraps child processes with the
//! externalize-to-file lifecycle.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod output;
pub mod signals;

pub use commands::dispatch;
