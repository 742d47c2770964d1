//! Drives a single scenario from start to terminal state.
//!
//! The runner owns the frame loop: each iteration the scenario's
//! commander acts, the session consumes one frame, and the emitted
//! events are folded into counters. The loop ends on victory, defeat,
//! or the scenario's simulated-time budget.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use palisade_core::entities::Team;
use palisade_core::events::GameEvent;
use palisade_core::session::Session;
use palisade_core::waves::GameOutcome;

use crate::scenario::{Scenario, ScenarioError};

/// Everything a finished run reports. Serializable so batch output can
/// be archived and diffed across balance changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Scenario name the run was built from.
    pub scenario: String,
    /// Seed the session was built with.
    pub seed: u64,
    /// How the session ended, if it did.
    pub outcome: Option<GameOutcome>,
    /// True when the time budget ran out before a terminal state.
    pub timed_out: bool,
    /// Simulated seconds consumed.
    pub sim_seconds: u64,
    /// Ticks fired.
    pub ticks: u64,
    /// Waves completed.
    pub waves_cleared: u32,
    /// Enemy units destroyed.
    pub enemies_destroyed: u32,
    /// Units the commander deployed.
    pub units_deployed: u32,
    /// Deployed units destroyed by enemies.
    pub units_lost: u32,
    /// Draws the commander bought.
    pub draws: u32,
    /// Fog cells revealed after session start.
    pub cells_revealed: u32,
    /// Tokens earned from mining and kill rewards.
    pub tokens_earned: u32,
    /// Tokens spent on draws and deploys.
    pub tokens_spent: u32,
    /// Token balance at the end.
    pub tokens_final: u32,
    /// State hash at the end, for determinism checks.
    pub final_state_hash: u64,
}

/// Run one scenario to completion with the given seed.
///
/// The seed overrides the scenario's own so batches can fan out over a
/// seed range without editing the scenario.
pub fn run_scenario(scenario: &Scenario, seed: u64) -> Result<RunReport, ScenarioError> {
    let config = scenario.build_config(seed)?;
    let mut session = Session::new(config)?;

    tracing::info!(
        scenario = %scenario.name,
        seed,
        max_sim_seconds = scenario.max_sim_seconds,
        "starting run"
    );

    let frame = Duration::from_millis(scenario.frame_millis);
    let budget = Duration::from_secs(scenario.max_sim_seconds);
    let mut elapsed = Duration::ZERO;

    let mut waves_cleared = 0u32;
    let mut enemies_destroyed = 0u32;
    let mut units_deployed = 0u32;
    let mut units_lost = 0u32;
    let mut draws = 0u32;
    let mut cells_revealed = 0u32;
    let mut tokens_earned = 0u32;
    let mut tokens_spent = 0u32;
    // Every balance mutation emits TokensChanged, so the deltas between
    // consecutive totals split cleanly into earned and spent
    let mut last_tokens = session.tokens();

    while session.outcome().is_none() && elapsed < budget {
        let activity = scenario.commander.act(&mut session);
        draws += activity.draws;
        units_deployed += activity.deploys;

        for event in session.update(frame) {
            match event {
                GameEvent::WaveCompleted { .. } => waves_cleared += 1,
                GameEvent::UnitDestroyed { team: Team::Enemy, .. } => enemies_destroyed += 1,
                GameEvent::UnitDestroyed { team: Team::Player, .. } => units_lost += 1,
                GameEvent::CellRevealed { .. } => cells_revealed += 1,
                GameEvent::TokensChanged { total } => {
                    if total > last_tokens {
                        tokens_earned += total - last_tokens;
                    } else {
                        tokens_spent += last_tokens - total;
                    }
                    last_tokens = total;
                }
                _ => {}
            }
        }
        elapsed += frame;
    }

    let report = RunReport {
        scenario: scenario.name.clone(),
        seed,
        outcome: session.outcome(),
        timed_out: session.outcome().is_none(),
        sim_seconds: elapsed.as_secs(),
        ticks: session.current_tick(),
        waves_cleared,
        enemies_destroyed,
        units_deployed,
        units_lost,
        draws,
        cells_revealed,
        tokens_earned,
        tokens_spent,
        tokens_final: session.tokens(),
        final_state_hash: session.state_hash(),
    };

    tracing::info!(
        scenario = %report.scenario,
        seed,
        outcome = ?report.outcome,
        ticks = report.ticks,
        waves_cleared = report.waves_cleared,
        enemies_destroyed = report.enemies_destroyed,
        "run finished"
    );
    Ok(report)
}
