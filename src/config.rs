//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive runtime
//! behavior and helpers to locate configuration and log files on disk.

mod load;
mod schema;

pub use load::default_log_dir;
pub use schema::*;

#[cfg(test)]
mod tests;
