use metrics::{counter, histogram};
use serde::Serialize;
use threadbench_core::{Measurement, QueueConfig, Regime, Result};
use tracing::{info, warn};

use crate::regime::{run_flag_gated, run_mutex_gated, run_unsynchronized, RegimeOutcome, Workload};

/// Summary line for one regime.
#[derive(Debug, Clone, Serialize)]
pub struct QueueReport {
    pub regime: Regime,
    #[serde(flatten)]
    pub measurement: Measurement,
    pub pushed: usize,
    pub popped: usize,
    pub remaining: usize,
    pub lost: usize,
}

impl From<&RegimeOutcome> for QueueReport {
    fn from(outcome: &RegimeOutcome) -> Self {
        Self {
            regime: outcome.regime,
            measurement: Measurement::new(outcome.regime.as_str(), outcome.elapsed),
            pushed: outcome.pushed,
            popped: outcome.popped(),
            remaining: outcome.remaining,
            lost: outcome.lost(),
        }
    }
}

/// Runs the configured regimes one after another, each on freshly built shared state.
pub struct QueueHarness {
    config: QueueConfig,
}

impl QueueHarness {
    pub fn new(config: QueueConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn run(&self) -> Result<Vec<QueueReport>> {
        info!(
            "Queue harness: {} producer(s), {} consumer(s), {} task(s) per producer",
            self.config.producers, self.config.consumers, self.config.tasks_per_producer
        );
        self.config
            .regimes
            .iter()
            .map(|regime| self.run_regime(*regime).map(|o| QueueReport::from(&o)))
            .collect()
    }

    pub fn run_regime(&self, regime: Regime) -> Result<RegimeOutcome> {
        let workload = Workload::from(&self.config);
        info!("Running {} regime ({})", regime, regime.description());
        let outcome = match regime {
            Regime::Unsynchronized => run_unsynchronized(&workload)?,
            Regime::FlagGated => run_flag_gated(&workload)?,
            Regime::MutexGated => run_mutex_gated(&workload, self.config.mutex_termination)?,
        };
        record_metrics(&outcome);

        info!(
            "{} regime finished in {:?}: {} popped, {} left in queue",
            regime,
            outcome.elapsed,
            outcome.popped(),
            outcome.remaining
        );
        if outcome.lost() > 0 {
            warn!(
                "{} regime lost {} token(s) to racing queue access",
                regime,
                outcome.lost()
            );
        }
        if regime == Regime::MutexGated && outcome.remaining > 0 {
            warn!(
                "{} token(s) never consumed: consumers saw an empty queue before producers finished",
                outcome.remaining
            );
        }
        Ok(outcome)
    }
}

fn record_metrics(outcome: &RegimeOutcome) {
    let regime = outcome.regime.as_str();
    counter!("threadbench_tokens_pushed", "regime" => regime).increment(outcome.pushed as u64);
    counter!("threadbench_tokens_popped", "regime" => regime).increment(outcome.popped() as u64);
    histogram!("threadbench_regime_seconds", "regime" => regime).record(outcome.elapsed);
}
