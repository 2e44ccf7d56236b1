use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use threadbench_core::{BenchConfig, HostInfo, MutexTermination, Regime};
use threadbench_queue::{QueueHarness, QueueReport};
use threadbench_sort::{SortHarness, SortReport};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "threadbench")]
#[command(about = "Queue-contention and parallel-sort timing experiments", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (pretty, json)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "THREADBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Number of producer threads
    #[arg(long, global = true)]
    producers: Option<usize>,

    /// Number of consumer threads
    #[arg(long, global = true)]
    consumers: Option<usize>,

    /// Tasks pushed by each producer
    #[arg(long, global = true)]
    tasks_per_producer: Option<usize>,

    /// Regimes to run (comma-separated)
    #[arg(long, global = true, value_enum, value_delimiter = ',')]
    regimes: Vec<RegimeArg>,

    /// When mutex-gated consumers stop
    #[arg(long, global = true, value_enum)]
    mutex_termination: Option<MutexTerminationArg>,

    /// Most threads one queue regime may start
    #[arg(long, global = true)]
    max_threads: Option<usize>,

    /// Number of integers to sort
    #[arg(long, global = true)]
    array_size: Option<usize>,

    /// Chunk counts for the parallel sort (comma-separated)
    #[arg(long, global = true, value_delimiter = ',')]
    chunks: Vec<usize>,

    /// Seed for the sort input
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both harnesses (default)
    All,

    /// Run the queue-contention harness
    Queue,

    /// Run the parallel-sort harness
    Sort,

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum RegimeArg {
    Unsynchronized,
    FlagGated,
    MutexGated,
}

impl From<RegimeArg> for Regime {
    fn from(arg: RegimeArg) -> Self {
        match arg {
            RegimeArg::Unsynchronized => Regime::Unsynchronized,
            RegimeArg::FlagGated => Regime::FlagGated,
            RegimeArg::MutexGated => Regime::MutexGated,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MutexTerminationArg {
    ObservedEmpty,
    ProducersDone,
}

impl From<MutexTerminationArg> for MutexTermination {
    fn from(arg: MutexTerminationArg) -> Self {
        match arg {
            MutexTerminationArg::ObservedEmpty => MutexTermination::ObservedEmpty,
            MutexTerminationArg::ProducersDone => MutexTermination::ProducersDone,
        }
    }
}

#[derive(Serialize)]
struct BenchReport {
    host: HostInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue: Option<Vec<QueueReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<Vec<SortReport>>,
}

fn main() {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "threadbench=debug"
    } else {
        "threadbench=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut config =
        BenchConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, cli);
    config.validate().context("Invalid command-line arguments")?;

    let command = cli.command.as_ref().unwrap_or(&Commands::All);
    if let Commands::Config = command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let run_queue = matches!(command, Commands::All | Commands::Queue);
    let run_sort = matches!(command, Commands::All | Commands::Sort);

    let report = BenchReport {
        host: HostInfo::capture(),
        queue: if run_queue {
            let harness = QueueHarness::new(config.queue.clone())?;
            Some(harness.run().context("Queue-contention harness failed")?)
        } else {
            None
        },
        sort: if run_sort {
            let harness = SortHarness::new(config.sort.clone())?;
            Some(harness.run().context("Parallel-sort harness failed")?)
        } else {
            None
        },
    };
    info!("Harness run complete");

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Pretty => print_pretty(&report, &config, cli.verbose),
    }
    Ok(())
}

fn apply_overrides(config: &mut BenchConfig, cli: &Cli) {
    if let Some(n) = cli.producers {
        config.queue.producers = n;
    }
    if let Some(n) = cli.consumers {
        config.queue.consumers = n;
    }
    if let Some(n) = cli.tasks_per_producer {
        config.queue.tasks_per_producer = n;
    }
    if !cli.regimes.is_empty() {
        config.queue.regimes = cli.regimes.iter().copied().map(Regime::from).collect();
    }
    if let Some(t) = cli.mutex_termination {
        config.queue.mutex_termination = t.into();
    }
    if cli.max_threads.is_some() {
        config.queue.max_threads = cli.max_threads;
    }
    if let Some(n) = cli.array_size {
        config.sort.array_size = n;
    }
    if !cli.chunks.is_empty() {
        config.sort.chunk_counts = cli.chunks.clone();
    }
    if cli.seed.is_some() {
        config.sort.seed = cli.seed;
    }
}

fn print_pretty(report: &BenchReport, config: &BenchConfig, verbose: bool) {
    if let Some(queue) = &report.queue {
        println!(
            "{} ({} producers, {} consumers, {} tasks each)",
            "Queue contention".cyan().bold(),
            config.queue.producers,
            config.queue.consumers,
            config.queue.tasks_per_producer
        );
        for r in queue {
            println!(
                "{}: {}",
                r.measurement.label,
                format!("{}ms", r.measurement.millis()).yellow()
            );
            if verbose {
                println!(
                    "    pushed {}, popped {}, remaining {}, lost {}",
                    r.pushed, r.popped, r.remaining, r.lost
                );
            }
        }
    }

    if let Some(sort) = &report.sort {
        println!(
            "{} ({} elements)",
            "Parallel sort".cyan().bold(),
            config.sort.array_size
        );
        for r in sort {
            println!(
                "{}: {}",
                r.measurement.label,
                format!("{}ms", r.measurement.millis()).yellow()
            );
            if verbose {
                let sorted = if r.sorted { "yes".green() } else { "no".red() };
                println!(
                    "    chunk size {}, dropped {}, result length {}, sorted {}",
                    r.chunk_size, r.dropped, r.len, sorted
                );
            }
        }
    }
}
