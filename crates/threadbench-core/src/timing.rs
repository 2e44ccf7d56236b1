use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Wall-clock stopwatch over a monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Run `f` and return its output together with how long it took.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let watch = Stopwatch::start();
    let out = f();
    (out, watch.elapsed())
}

/// One labelled duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub label: String,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl Measurement {
    pub fn new(label: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            label: label.into(),
            elapsed,
        }
    }

    /// Whole milliseconds, truncated.
    pub fn millis(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// `label: 12ms`
    pub fn render(&self) -> String {
        format!("{}: {}ms", self.label, self.millis())
    }
}

/// Where and when a harness run happened.
#[derive(Debug, Clone, Serialize)]
pub struct HostInfo {
    pub started_at: DateTime<Utc>,
    pub logical_cpus: usize,
    pub physical_cpus: usize,
}

impl HostInfo {
    pub fn capture() -> Self {
        Self {
            started_at: Utc::now(),
            logical_cpus: num_cpus::get(),
            physical_cpus: num_cpus::get_physical(),
        }
    }
}

pub fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_nanos() as f64 / 1_000_000.0)
}
