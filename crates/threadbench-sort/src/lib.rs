//! Parallel-sort harness
//!
//! Compares a single-threaded sort of the whole array against cutting it into
//! P equal chunks, sorting each chunk on its own thread, concatenating and
//! sorting once more. The trailing `len % P` elements are not part of any
//! chunk and are dropped from the parallel result.

pub mod harness;
pub mod partition;

pub use harness::{
    generate_input, is_non_decreasing, sort_baseline, sort_partitioned, SortHarness, SortOutcome,
    SortReport,
};
pub use partition::Partition;
