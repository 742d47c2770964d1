//! Events raised by the session for presentation layers.
//!
//! Events accumulate inside the session during an update and are returned
//! (drained) to the caller, who forwards them to whatever rendering, audio
//! or UI cares. The simulation never depends on anyone consuming them.

use serde::{Deserialize, Serialize};

use crate::entities::{EntityId, Team};
use crate::grid::GridPos;
use crate::waves::{GameOutcome, WavePhase};

/// Something observable happened in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An interval tick fired and was dispatched.
    TickFired {
        /// The tick count, starting at 1.
        count: u64,
    },
    /// The token balance changed.
    TokensChanged {
        /// New balance.
        total: u32,
    },
    /// A fog cell was revealed for the first time.
    CellRevealed {
        /// The newly explored cell.
        pos: GridPos,
    },
    /// An attack landed.
    DamageDealt {
        /// Attacking unit.
        attacker: EntityId,
        /// Damaged entity.
        target: EntityId,
        /// Actual damage after clamping.
        amount: u32,
    },
    /// A unit reached zero HP.
    UnitDestroyed {
        /// The destroyed unit.
        id: EntityId,
        /// Side it fought for.
        team: Team,
    },
    /// A resource node was mined out.
    ResourceDestroyed {
        /// The destroyed node.
        id: EntityId,
        /// Its tier.
        tier: u8,
    },
    /// The downtime countdown crossed the warn threshold.
    WaveWarned {
        /// Incoming wave number.
        wave: u32,
    },
    /// A wave's spawn code was executed.
    WaveSpawned {
        /// Wave number.
        wave: u32,
        /// Enemies actually placed.
        enemies: u32,
        /// Resource nodes actually placed.
        resources: u32,
    },
    /// The active wave was cleared.
    WaveCompleted {
        /// Cleared wave number.
        wave: u32,
    },
    /// The wave machine moved to a new phase.
    PhaseChanged {
        /// The phase entered.
        phase: WavePhase,
    },
    /// The session reached its terminal state.
    GameEnded {
        /// Victory or defeat.
        outcome: GameOutcome,
    },
    /// The grid was resized.
    GridResized {
        /// New width in cells.
        width: u32,
        /// New height in cells.
        height: u32,
        /// Occupants dropped because their footprint no longer fit.
        dropped: Vec<EntityId>,
    },
}
