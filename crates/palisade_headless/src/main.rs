//! Headless session runner.
//!
//! Runs seeded sessions without graphics for balance sweeps, determinism
//! verification and benchmarking. Reports go to stdout as JSON; logs and
//! human-readable summaries go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Run one session and print the report
//! cargo run -p palisade_headless -- run --scenario standard
//!
//! # Sweep 500 seeds of a scenario file
//! cargo run -p palisade_headless -- batch --scenario scenarios/siege.ron --count 500
//!
//! # Check a scenario file without running it
//! cargo run -p palisade_headless -- validate --scenario scenarios/siege.ron
//!
//! # Verify determinism of one seed
//! cargo run -p palisade_headless -- verify --scenario standard --seed 12345
//!
//! # Measure tick throughput
//! cargo run -p palisade_headless -- benchmark --ticks 10000
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use palisade_headless::batch::{run_batch, verify_determinism, BatchConfig};
use palisade_headless::runner::run_scenario;
use palisade_headless::scenario::Scenario;

#[derive(Parser)]
#[command(name = "palisade_headless")]
#[command(about = "Headless Palisade session runner for balance sweeps and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single session and print its report
    Run {
        /// Scenario preset name or RON file path
        #[arg(short, long, default_value = "standard")]
        scenario: String,

        /// Seed override (defaults to the scenario's own seed)
        #[arg(long)]
        seed: Option<u64>,

        /// Also save the report JSON to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Run a batch of sessions for balance testing
    Batch {
        /// Scenario preset name or RON file path
        #[arg(short, long, default_value = "standard")]
        scenario: String,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel runs (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed; run i uses seed + i
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Parse and validate a scenario without running it
    Validate {
        /// Scenario preset name or RON file path
        #[arg(short, long)]
        scenario: String,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Scenario preset name or RON file path
        #[arg(short, long, default_value = "standard")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Run N ticks for benchmarking
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "10000")]
        ticks: u64,

        /// Scenario preset name or RON file path
        #[arg(short, long, default_value = "standard")]
        scenario: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr; stdout is reserved for reports
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            report,
        }) => {
            cmd_run(&scenario, seed, report);
        }
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
        }) => {
            cmd_batch(scenario, count, parallel, output, seed);
        }
        Some(Commands::Validate { scenario }) => {
            cmd_validate(&scenario);
        }
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => {
            cmd_verify(&scenario, seed, runs);
        }
        Some(Commands::Benchmark { ticks, scenario }) => {
            cmd_benchmark(ticks, &scenario);
        }
        None => {
            cmd_run("standard", None, None);
        }
    }
}

/// Run one session and print the report as JSON.
fn cmd_run(scenario_name: &str, seed: Option<u64>, report_path: Option<PathBuf>) {
    let scenario = match Scenario::resolve(scenario_name) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to resolve scenario '{}': {}", scenario_name, e);
            std::process::exit(1);
        }
    };
    let seed = seed.unwrap_or(scenario.seed);

    let report = match run_scenario(&scenario, seed) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Run failed: {}", e);
            std::process::exit(1);
        }
    };

    let json = match serde_json::to_string_pretty(&report) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Scenario: {} (seed {})", report.scenario, report.seed);
    match report.outcome {
        Some(outcome) => eprintln!("Outcome: {:?} after {} ticks", outcome, report.ticks),
        None => eprintln!("Outcome: timed out after {} ticks", report.ticks),
    }
    eprintln!(
        "Waves cleared: {}, enemies destroyed: {}, tokens left: {}",
        report.waves_cleared, report.enemies_destroyed, report.tokens_final
    );

    if let Some(path) = report_path {
        if let Err(e) = std::fs::write(&path, &json) {
            eprintln!("Failed to write report to {}: {}", path.display(), e);
            std::process::exit(1);
        }
        eprintln!("Report saved to: {}", path.display());
    } else {
        println!("{}", json);
    }
}

/// Run a batch of sessions.
fn cmd_batch(scenario: String, count: u32, parallel: u32, output: PathBuf, seed: u64) {
    if let Err(e) = std::fs::create_dir_all(&output) {
        eprintln!(
            "FATAL: Cannot create output directory '{}': {}",
            output.display(),
            e
        );
        std::process::exit(1);
    }

    let config = BatchConfig {
        scenario,
        run_count: count,
        parallel_runs: parallel,
        output_dir: output.clone(),
        seed_start: seed,
    };

    let results = match run_batch(config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Batch failed: {}", e);
            std::process::exit(1);
        }
    };

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        eprintln!("FATAL: Failed to save results: {}", e);
        std::process::exit(1);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Runs: {}", results.runs.len());
    if !results.errors.is_empty() {
        eprintln!("Runs FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} runs/sec",
        results.runs.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!(
        "\nOutcomes: {} victories, {} defeats, {} timeouts ({:.1}% victory rate)",
        summary.victories,
        summary.defeats,
        summary.timeouts,
        summary.victory_rate * 100.0
    );
    eprintln!(
        "Averages: {:.1} ticks, {:.1} waves cleared, {:.1} tokens left",
        summary.avg_ticks, summary.avg_waves_cleared, summary.avg_tokens_final
    );

    if !results.errors.is_empty() {
        eprintln!("\nRUN FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!(
                "  Run {} (seed {}): {}",
                error.run_index, error.seed, error.message
            );
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
}

/// Parse a scenario and build its session config, reporting any error.
fn cmd_validate(scenario_name: &str) {
    let scenario = match Scenario::resolve(scenario_name) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("INVALID: {}", e);
            std::process::exit(1);
        }
    };

    // build_config runs the full session validation
    let config = match scenario.build_config(scenario.seed) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("INVALID: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("OK: scenario '{}'", scenario.name);
    eprintln!("  Grid: {}x{}", config.grid_width, config.grid_height);
    eprintln!("  Starting tokens: {}", config.starting_tokens);
    eprintln!("  Waves: {}", config.waves.len());
    eprintln!("  Commander: {:?}", scenario.commander);
    eprintln!("  Sim budget: {}s", scenario.max_sim_seconds);
}

/// Verify determinism.
fn cmd_verify(scenario: &str, seed: u64, runs: u32) {
    tracing::info!(scenario, seed, runs, "verifying determinism");

    match verify_determinism(scenario, seed, runs) {
        Ok(true) => {
            eprintln!("PASS: All {} runs produced identical reports", runs);
        }
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FAIL: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run a throughput benchmark.
fn cmd_benchmark(ticks: u64, scenario_name: &str) {
    use palisade_core::session::Session;
    use std::time::Instant;

    let scenario = match Scenario::resolve(scenario_name) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to resolve scenario '{}': {}", scenario_name, e);
            std::process::exit(1);
        }
    };
    let config = match scenario.build_config(scenario.seed) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build config: {}", e);
            std::process::exit(1);
        }
    };
    let interval = config.tick_interval;
    let mut session = match Session::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start session: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Benchmarking '{}' for {} ticks...", scenario.name, ticks);

    // Warmup, with the commander building a board worth simulating
    for _ in 0..100 {
        let _ = scenario.commander.act(&mut session);
        let _ = session.update(interval);
    }

    let start = Instant::now();
    for _ in 0..ticks {
        let _ = scenario.commander.act(&mut session);
        let _ = session.update(interval);
    }
    let elapsed = start.elapsed();
    let tps = ticks as f64 / elapsed.as_secs_f64();

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {}", ticks);
    eprintln!("Duration: {:.3}s", elapsed.as_secs_f64());
    eprintln!("Ticks/second: {:.1}", tps);
    eprintln!("ms/tick: {:.4}", elapsed.as_millis() as f64 / ticks as f64);
    eprintln!("Entities: {}", session.entities().len());
    eprintln!("State hash: {:016x}", session.state_hash());
}
