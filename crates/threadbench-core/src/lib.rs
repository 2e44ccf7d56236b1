//! Shared plumbing for the threadbench harnesses.
//!
//! - `config`: layered configuration (defaults, TOML file, environment)
//! - `error`: error taxonomy shared by every harness crate
//! - `task_group`: structured launch/join of OS threads
//! - `timing`: stopwatch, measurements and the aggregated report

pub mod config;
pub mod error;
pub mod task_group;
pub mod timing;

pub use crate::config::{BenchConfig, MutexTermination, QueueConfig, Regime, SortConfig};
pub use error::*;
pub use task_group::{TaskGroup, ThreadBudget};
pub use timing::*;
