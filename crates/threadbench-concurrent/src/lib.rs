//! Shared state for the queue-contention harness
//!
//! - `token`: task identifiers pushed by producers
//! - `racy`: FIFO queue with no synchronization whatsoever
//! - `locked`: FIFO queue behind a single mutex
//! - `flag`: sequentially consistent "producers done" flag

pub mod flag;
pub mod locked;
pub mod racy;
pub mod token;

pub use flag::CompletionFlag;
pub use locked::LockedQueue;
pub use racy::RacyQueue;
pub use token::TaskToken;
