//! Queue-contention harness
//!
//! N producers and M consumers share one FIFO queue under three regimes:
//! no synchronization, an atomic completion flag over an unprotected queue,
//! and a single mutex around every queue access. Each regime gets its own
//! queue and flag, and its wall-clock time is reported.
//!
//! The unsynchronized and flag-gated regimes race on purpose.

pub mod harness;
pub mod regime;

pub use harness::{QueueHarness, QueueReport};
pub use regime::{run_flag_gated, run_mutex_gated, run_unsynchronized, RegimeOutcome, Workload};
