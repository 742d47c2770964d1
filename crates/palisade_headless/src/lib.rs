//! Headless session runner for balance sweeps and CI verification.
//!
//! This crate drives [`palisade_core`] sessions without graphics:
//!
//! - **Balance sweeps**: Run hundreds of seeded sessions in parallel and
//!   aggregate outcome statistics
//! - **CI verification**: Automated determinism checks across runs
//! - **Scenario files**: Declarative RON setups for reproducible tests
//!
//! # Output
//!
//! - **stdout**: Machine-readable reports (JSON)
//! - **stderr**: Logs and human-readable summaries
//!
//! # Example
//!
//! ```bash
//! # Run one session of the standard scenario
//! cargo run -p palisade_headless -- run --scenario standard
//!
//! # Sweep 500 seeds of a scenario file
//! cargo run -p palisade_headless -- batch --scenario scenarios/siege.ron --count 500
//!
//! # Verify determinism
//! cargo run -p palisade_headless -- verify --scenario standard --seed 12345
//! ```

pub mod batch;
pub mod commander;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, BatchSummary};
pub use commander::CommanderPolicy;
pub use runner::{run_scenario, RunReport};
pub use scenario::{Scenario, ScenarioError};
