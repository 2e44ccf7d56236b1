use std::time::Duration;

use serde::Serialize;
use threadbench_core::{timed, Measurement, Result, SortConfig, Stopwatch, TaskGroup};
use tracing::{debug, info, warn};

use crate::partition::Partition;

/// Random input array; identical for identical seeds.
pub fn generate_input(size: usize, seed: Option<u64>) -> Vec<i32> {
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    (0..size).map(|_| rng.i32(..)).collect()
}

pub fn is_non_decreasing(values: &[i32]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

/// Result of one timed sort.
#[derive(Debug, Clone)]
pub struct SortOutcome {
    /// `None` for the single-threaded baseline.
    pub partition: Option<Partition>,
    pub output: Vec<i32>,
    pub elapsed: Duration,
}

impl SortOutcome {
    pub fn threads(&self) -> usize {
        self.partition.map_or(1, |p| p.chunk_count)
    }

    pub fn dropped(&self) -> usize {
        self.partition.map_or(0, |p| p.dropped())
    }
}

/// Sort a private copy of `input` on the calling thread. The copy is not timed.
pub fn sort_baseline(input: &[i32]) -> SortOutcome {
    let mut data = input.to_vec();
    let ((), elapsed) = timed(|| data.sort_unstable());
    SortOutcome {
        partition: None,
        output: data,
        elapsed,
    }
}

/// Copy `chunk_count` equal chunks out of `input`, sort each on its own thread,
/// concatenate in chunk order and sort the concatenation once more.
///
/// Timing covers the copy through the final sort. Trailing `len % chunk_count`
/// elements are never copied and are absent from the output.
pub fn sort_partitioned(input: &[i32], chunk_count: usize) -> Result<SortOutcome> {
    let partition = Partition::plan(input.len(), chunk_count)?;
    let watch = Stopwatch::start();

    let mut group = TaskGroup::with_capacity("sort-chunk", chunk_count);
    for mut chunk in partition.split(input) {
        // The chunk is moved in and handed back on join; nothing else can see it meanwhile.
        group.spawn(move || {
            chunk.sort_unstable();
            chunk
        })?;
    }
    let chunks = group.join_all()?;

    let mut output = chunks.concat();
    output.sort_unstable();
    let elapsed = watch.elapsed();

    debug!(
        "{} chunk(s) of {} sorted and merged in {:?}",
        chunk_count, partition.chunk_size, elapsed
    );
    Ok(SortOutcome {
        partition: Some(partition),
        output,
        elapsed,
    })
}

/// Summary line for one sort configuration.
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub threads: usize,
    pub chunk_size: usize,
    pub dropped: usize,
    pub len: usize,
    pub sorted: bool,
}

impl SortReport {
    fn from_outcome(label: String, outcome: &SortOutcome) -> Self {
        Self {
            measurement: Measurement::new(label, outcome.elapsed),
            threads: outcome.threads(),
            chunk_size: outcome.partition.map_or(outcome.output.len(), |p| p.chunk_size),
            dropped: outcome.dropped(),
            len: outcome.output.len(),
            sorted: is_non_decreasing(&outcome.output),
        }
    }
}

/// Baseline first, then every configured chunk count, all on the same input values.
pub struct SortHarness {
    config: SortConfig,
}

impl SortHarness {
    pub fn new(config: SortConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    pub fn run(&self) -> Result<Vec<SortReport>> {
        let input = generate_input(self.config.array_size, self.config.seed);
        self.run_on(&input)
    }

    pub fn run_on(&self, input: &[i32]) -> Result<Vec<SortReport>> {
        info!(
            "Sort harness: {} element(s), chunk counts {:?}",
            input.len(),
            self.config.chunk_counts
        );
        let mut reports = Vec::with_capacity(self.config.chunk_counts.len() + 1);

        let baseline = sort_baseline(input);
        info!("single-threaded sort finished in {:?}", baseline.elapsed);
        reports.push(SortReport::from_outcome(
            "single-threaded sort".to_string(),
            &baseline,
        ));

        for &chunk_count in &self.config.chunk_counts {
            let outcome = sort_partitioned(input, chunk_count)?;
            if outcome.dropped() > 0 {
                warn!(
                    "{} trailing element(s) not divisible into {} chunks were dropped",
                    outcome.dropped(),
                    chunk_count
                );
            }
            info!(
                "parallel sort with {} chunk(s) finished in {:?}",
                chunk_count, outcome.elapsed
            );
            reports.push(SortReport::from_outcome(
                format!("parallel sort ({} threads)", chunk_count),
                &outcome,
            ));
        }
        Ok(reports)
    }
}
