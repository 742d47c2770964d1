//! # Palisade Core
//!
//! Deterministic tick-driven simulation core for Palisade.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded RNG per session)
//! - No floating-point math in simulation state (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs
//! - Replay and snapshot systems
//! - Determinism testing across platforms
//!
//! ## Crate Structure
//!
//! - [`session`] - One running game: the update loop and mutation surface
//! - [`clock`] - Interval tick scheduling
//! - [`grid`] - Cell occupancy and coordinate mapping
//! - [`fog`] - Revealed/visible exploration masks
//! - [`combat`] - Per-tick unit turn resolution
//! - [`waves`] - Wave phase machine and spawn codes
//! - [`deck`] - Weighted draws, hand, draw pricing
//! - [`economy`] - The token ledger
//! - [`placement`] - Deployment validation
//! - [`entities`] - Units, resource nodes, storage
//! - [`data`] - Rosters, scaling tables, wave plans
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod clock;
pub mod combat;
pub mod data;
pub mod deck;
pub mod economy;
pub mod entities;
pub mod error;
pub mod events;
pub mod fog;
pub mod grid;
pub mod math;
pub mod placement;
pub mod session;
pub mod waves;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::IntervalClock;
    pub use crate::data::{EnemyScaling, PlayerUnitDef, ResourceTable, Roster};
    pub use crate::deck::{Deck, DrawError, DrawPolicy, Hand, RarityTable};
    pub use crate::economy::TokenLedger;
    pub use crate::entities::{
        Damageable, EntityId, EntityStorage, Footprint, Occupant, ResourceNode, Team, Unit,
        UnitKindId, UnitStats,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::events::GameEvent;
    pub use crate::fog::FogGrid;
    pub use crate::grid::{CellState, Grid, GridPos};
    pub use crate::math::{Fixed, WorldVec2};
    pub use crate::placement::DeployError;
    pub use crate::session::{Session, SessionConfig};
    pub use crate::waves::{GameOutcome, SpawnCode, WaveData, WaveDirector, WavePhase};
}
