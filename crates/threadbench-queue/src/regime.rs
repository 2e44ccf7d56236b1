use std::sync::Arc;
use std::thread;
use std::time::Duration;

use threadbench_concurrent::{CompletionFlag, LockedQueue, RacyQueue, TaskToken};
use threadbench_core::{
    MutexTermination, QueueConfig, Regime, Result, Stopwatch, TaskGroup, ThreadBudget,
};
use tracing::debug;

/// Thread counts and per-producer task count for one regime run.
#[derive(Debug, Clone)]
pub struct Workload {
    pub producers: usize,
    pub consumers: usize,
    pub tasks_per_producer: usize,
    /// Keep every popped token per consumer; off for timed runs.
    pub record_pops: bool,
    /// Shared by the producer and consumer groups of a run.
    pub budget: ThreadBudget,
}

impl Workload {
    pub fn new(producers: usize, consumers: usize, tasks_per_producer: usize) -> Self {
        Self {
            producers,
            consumers,
            tasks_per_producer,
            record_pops: false,
            budget: ThreadBudget::unlimited(),
        }
    }

    pub fn recording(mut self) -> Self {
        self.record_pops = true;
        self
    }

    pub fn with_budget(mut self, budget: ThreadBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn total_tasks(&self) -> usize {
        self.producers * self.tasks_per_producer
    }
}

impl From<&QueueConfig> for Workload {
    fn from(config: &QueueConfig) -> Self {
        Self::new(
            config.producers,
            config.consumers,
            config.tasks_per_producer,
        )
        .with_budget(ThreadBudget::new(config.max_threads))
    }
}

/// What one regime run did and how long it took.
#[derive(Debug, Clone)]
pub struct RegimeOutcome {
    pub regime: Regime,
    pub elapsed: Duration,
    pub pushed: usize,
    /// How many tokens each consumer popped.
    pub popped_per_consumer: Vec<usize>,
    /// Tokens each consumer popped, in pop order. Empty unless the workload records pops.
    pub consumer_logs: Vec<Vec<TaskToken>>,
    /// Tokens still queued once every task was joined.
    pub remaining: usize,
    /// Number of false→true completion flag transitions.
    pub completion_signals: usize,
}

impl RegimeOutcome {
    pub fn popped(&self) -> usize {
        self.popped_per_consumer.iter().sum()
    }

    /// Pushed tokens that are neither popped nor still queued.
    pub fn lost(&self) -> usize {
        self.pushed.saturating_sub(self.popped() + self.remaining)
    }
}

/// Per-consumer tally. Tokens are only stored when recording.
struct PopLog {
    popped: usize,
    tokens: Option<Vec<TaskToken>>,
}

impl PopLog {
    fn new(record: bool) -> Self {
        Self {
            popped: 0,
            tokens: record.then(Vec::new),
        }
    }

    #[inline]
    fn note(&mut self, token: TaskToken) {
        self.popped += 1;
        if let Some(tokens) = &mut self.tokens {
            tokens.push(token);
        }
    }
}

fn token(producer: usize, seq: usize) -> TaskToken {
    TaskToken::new(producer as u32, seq as u32)
}

/// Launch one producer per id, stopping at the first spawn failure.
fn launch_producers(
    group: &mut TaskGroup<()>,
    workload: &Workload,
    push: impl Fn(TaskToken) + Clone + Send + 'static,
) -> Result<()> {
    let tasks = workload.tasks_per_producer;
    (0..workload.producers).try_for_each(|id| {
        let push = push.clone();
        group.spawn(move || {
            for seq in 0..tasks {
                push(token(id, seq));
            }
        })
    })
}

/// Launch the consumers, stopping at the first spawn failure.
fn launch_consumers(
    group: &mut TaskGroup<PopLog>,
    workload: &Workload,
    drain: impl Fn(&mut PopLog) + Clone + Send + 'static,
) -> Result<()> {
    let record = workload.record_pops;
    (0..workload.consumers).try_for_each(|_| {
        let drain = drain.clone();
        group.spawn(move || {
            let mut log = PopLog::new(record);
            drain(&mut log);
            log
        })
    })
}

/// Join both groups, then surface the first error: launch, producers, consumers.
///
/// `between` runs after the producers are joined and before the consumers are,
/// whether or not anything failed, so consumers waiting on it can always finish.
fn join_regime(
    launched: Result<()>,
    producers: TaskGroup<()>,
    consumers: TaskGroup<PopLog>,
    between: impl FnOnce(),
) -> Result<Vec<PopLog>> {
    let produced = producers.join_all();
    between();
    let consumed = consumers.join_all();
    launched?;
    produced?;
    consumed
}

fn outcome(
    regime: Regime,
    workload: &Workload,
    elapsed: Duration,
    logs: Vec<PopLog>,
    remaining: usize,
    completion_signals: usize,
) -> RegimeOutcome {
    let popped_per_consumer = logs.iter().map(|l| l.popped).collect();
    let consumer_logs = logs.into_iter().filter_map(|l| l.tokens).collect();
    RegimeOutcome {
        regime,
        elapsed,
        pushed: workload.total_tasks(),
        popped_per_consumer,
        consumer_logs,
        remaining,
        completion_signals,
    }
}

/// Producers and consumers share one `RacyQueue` with no coordination at all.
///
/// Consumers stop the first time they see the queue empty. Concurrent access is a
/// data race; results (and process survival) are not guaranteed.
pub fn run_unsynchronized(workload: &Workload) -> Result<RegimeOutcome> {
    let queue = Arc::new(RacyQueue::new());
    let watch = Stopwatch::start();

    let mut producers =
        TaskGroup::with_budget("unsync-producer", workload.producers, workload.budget.clone());
    let mut consumers =
        TaskGroup::with_budget("unsync-consumer", workload.consumers, workload.budget.clone());

    let q = queue.clone();
    // Deliberate data race: no lock around the push.
    let launched = launch_producers(&mut producers, workload, move |t| unsafe { q.push(t) })
        .and_then(|()| {
            let q = queue.clone();
            launch_consumers(&mut consumers, workload, move |log| {
                // Deliberate data race: emptiness check and pop are unprotected.
                while !unsafe { q.is_empty() } {
                    if let Some(t) = unsafe { q.pop() } {
                        log.note(t);
                    }
                }
            })
        });

    let logs = join_regime(launched, producers, consumers, || {})?;
    let elapsed = watch.elapsed();

    // Every task is joined, so this thread is the only one left touching the queue.
    let remaining = unsafe { queue.len() };
    Ok(outcome(Regime::Unsynchronized, workload, elapsed, logs, remaining, 0))
}

/// Unprotected queue, but consumers terminate on a `SeqCst` completion flag.
///
/// Producers are joined, the flag is raised, then consumers are joined. Only the
/// termination signal is race-free; push/pop still race.
pub fn run_flag_gated(workload: &Workload) -> Result<RegimeOutcome> {
    let queue = Arc::new(RacyQueue::new());
    let flag = Arc::new(CompletionFlag::new());
    let watch = Stopwatch::start();

    let mut producers =
        TaskGroup::with_budget("flag-producer", workload.producers, workload.budget.clone());
    let mut consumers =
        TaskGroup::with_budget("flag-consumer", workload.consumers, workload.budget.clone());

    let q = queue.clone();
    // Deliberate data race: no lock around the push.
    let launched = launch_producers(&mut producers, workload, move |t| unsafe { q.push(t) })
        .and_then(|()| {
            let q = queue.clone();
            let flag = flag.clone();
            launch_consumers(&mut consumers, workload, move |log| loop {
                // Deliberate data race on every queue access below; the flag itself is atomic.
                if flag.is_done() && unsafe { q.is_empty() } {
                    break;
                }
                if !unsafe { q.is_empty() } {
                    if let Some(t) = unsafe { q.pop() } {
                        log.note(t);
                    }
                }
            })
        });

    let mut completion_signals = 0;
    let logs = join_regime(launched, producers, consumers, || {
        completion_signals = usize::from(flag.mark_done());
        debug!("completion flag raised");
    })?;
    let elapsed = watch.elapsed();

    // Every task is joined, so this thread is the only one left touching the queue.
    let remaining = unsafe { queue.len() };
    Ok(outcome(
        Regime::FlagGated,
        workload,
        elapsed,
        logs,
        remaining,
        completion_signals,
    ))
}

/// One mutex around every push and pop.
///
/// With `ObservedEmpty` a consumer quits on the first empty pop, possibly before a
/// slow producer has pushed anything, so tokens may be left behind. With
/// `ProducersDone` consumers keep polling until the completion flag is raised and
/// the queue is drained.
pub fn run_mutex_gated(
    workload: &Workload,
    termination: MutexTermination,
) -> Result<RegimeOutcome> {
    let queue = Arc::new(LockedQueue::new());
    let flag = Arc::new(CompletionFlag::new());
    let watch = Stopwatch::start();

    let mut producers =
        TaskGroup::with_budget("mutex-producer", workload.producers, workload.budget.clone());
    let mut consumers =
        TaskGroup::with_budget("mutex-consumer", workload.consumers, workload.budget.clone());

    let q = queue.clone();
    let launched = launch_producers(&mut producers, workload, move |t| q.push(t)).and_then(|()| {
        let q = queue.clone();
        let flag = flag.clone();
        launch_consumers(&mut consumers, workload, move |log| match termination {
            MutexTermination::ObservedEmpty => {
                while let Some(t) = q.pop() {
                    log.note(t);
                }
            }
            MutexTermination::ProducersDone => loop {
                // Read the flag before popping: an empty pop after a raised flag is final.
                let done = flag.is_done();
                match q.pop() {
                    Some(t) => log.note(t),
                    None if done => break,
                    None => thread::yield_now(),
                }
            },
        })
    });

    let mut completion_signals = 0;
    let logs = join_regime(launched, producers, consumers, || {
        completion_signals = usize::from(flag.mark_done());
    })?;
    let elapsed = watch.elapsed();

    Ok(outcome(
        Regime::MutexGated,
        workload,
        elapsed,
        logs,
        queue.len(),
        completion_signals,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use threadbench_core::BenchError;

    #[test]
    fn workload_from_config() {
        let config = QueueConfig {
            max_threads: Some(6),
            ..QueueConfig::default()
        };
        let workload = Workload::from(&config);
        assert_eq!(
            (workload.producers, workload.consumers, workload.tasks_per_producer),
            (2, 2, 1000)
        );
        assert_eq!(workload.total_tasks(), 2000);
        assert!(!workload.record_pops);
        assert_eq!(workload.budget.limit(), Some(6));
    }

    #[test]
    fn mutex_drains_everything_when_waiting_for_producers() {
        let outcome = run_mutex_gated(
            &Workload::new(3, 2, 500).recording(),
            MutexTermination::ProducersDone,
        )
        .unwrap();
        assert_eq!(outcome.pushed, 1500);
        assert_eq!(outcome.popped(), 1500);
        assert_eq!(outcome.remaining, 0);
        assert_eq!(outcome.lost(), 0);
        assert_eq!(outcome.completion_signals, 1);

        let unique: HashSet<_> = outcome.consumer_logs.iter().flatten().collect();
        assert_eq!(unique.len(), 1500);
    }

    #[test]
    fn timed_runs_count_without_keeping_tokens() {
        let outcome =
            run_mutex_gated(&Workload::new(2, 2, 300), MutexTermination::ProducersDone).unwrap();
        assert_eq!(outcome.popped_per_consumer.len(), 2);
        assert_eq!(outcome.popped(), 600);
        assert!(outcome.consumer_logs.is_empty());
    }

    #[test]
    fn mutex_without_consumers_keeps_every_token() {
        let outcome =
            run_mutex_gated(&Workload::new(2, 0, 100), MutexTermination::ObservedEmpty).unwrap();
        assert_eq!(outcome.popped(), 0);
        assert_eq!(outcome.remaining, 200);
    }

    #[test]
    fn unsynchronized_single_producer_without_consumers() {
        let outcome = run_unsynchronized(&Workload::new(1, 0, 250)).unwrap();
        assert_eq!(outcome.regime, Regime::Unsynchronized);
        assert_eq!(outcome.remaining, 250);
        assert_eq!(outcome.completion_signals, 0);
    }

    #[test]
    fn flag_gated_raises_flag_once() {
        let outcome = run_flag_gated(&Workload::new(1, 0, 64)).unwrap();
        assert_eq!(outcome.completion_signals, 1);
        assert_eq!(outcome.remaining, 64);
        assert_eq!(outcome.lost(), 0);
    }

    #[test]
    fn producer_spawn_failure_joins_what_started() {
        let budget = ThreadBudget::limited(1);
        let workload = Workload::new(3, 0, 10).with_budget(budget.clone());
        let err = run_unsynchronized(&workload).unwrap_err();
        assert!(matches!(err, BenchError::Spawn { .. }));
        assert_eq!(budget.granted(), 1);
        assert_eq!(budget.live(), 0);
    }
}
