//! Data structures for session configuration.
//!
//! This module contains pure data structures for the player roster, enemy
//! scaling, resource tiers, and wave plans. All structs are designed to be
//! deserialized from RON.
//!
//! **Note:** This module contains no IO - it only defines data types and
//! string parsers. File loading is handled by `palisade_headless`.

mod roster;
mod spawn_data;
mod wave_plan;

pub use roster::{PlayerUnitDef, Roster};
pub use spawn_data::{EnemyScaling, ResourceTable, ResourceTierDef};
pub use wave_plan::{parse_plan, standard_plan, validate_plan};
