//! Player unit roster: the kinds the deck can draw.

use serde::{Deserialize, Serialize};

use crate::deck::{RarityEntry, RarityTable};
use crate::entities::{UnitKindId, UnitStats};
use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Data-driven definition of one deployable unit kind.
///
/// # Example RON
///
/// ```ron
/// PlayerUnitDef(
///     id: "militia",
///     name: "unit.militia.name",
///     rarity_weight: 60,
///     stats: (
///         max_hp: 10,
///         attack_damage: 3,
///         attack_range: 1,
///         attack_interval: 2,
///         resource_cost: 4,
///         kill_reward: 0,
///         charge_distance: 0,
///         reveal_radius: 8589934592,  // Fixed-point for 2.0
///     ),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerUnitDef {
    /// Unique string identifier, referenced by scenarios and save data.
    pub id: String,

    /// Localization key for the display name.
    pub name: String,

    /// Draw weight; the roster's weights must sum to 100.
    pub rarity_weight: u32,

    /// Combat statistics applied at deploy time.
    pub stats: UnitStats,
}

/// The full draw pool, in declaration order. [`UnitKindId`] values index
/// into this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// Deployable unit kinds.
    pub units: Vec<PlayerUnitDef>,
}

impl Roster {
    /// Look up a definition by kind.
    #[must_use]
    pub fn get(&self, kind: UnitKindId) -> Option<&PlayerUnitDef> {
        self.units.get(kind.0 as usize)
    }

    /// Number of kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the roster has no kinds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Build the deck's rarity table from the declared weights.
    pub fn rarity_table(&self) -> Result<RarityTable> {
        RarityTable::new(
            self.units
                .iter()
                .enumerate()
                .map(|(i, def)| RarityEntry {
                    kind: UnitKindId(i as u32),
                    weight: def.rarity_weight,
                })
                .collect(),
        )
    }

    /// Validate roster-wide invariants: at least one kind, weights summing
    /// to 100, and per-kind stats that can actually act.
    pub fn validate(&self) -> Result<()> {
        if self.units.is_empty() {
            return Err(GameError::InvalidConfig("roster has no units".to_string()));
        }
        let _ = self.rarity_table()?;
        for def in &self.units {
            if def.stats.max_hp == 0 {
                return Err(GameError::InvalidConfig(format!("unit '{}' has zero max_hp", def.id)));
            }
            if def.stats.attack_interval == 0 {
                return Err(GameError::InvalidConfig(format!(
                    "unit '{}' has zero attack_interval",
                    def.id
                )));
            }
        }
        Ok(())
    }

    /// The standard three-kind roster used by presets and tests:
    /// 60% militia, 30% lancer, 10% vanguard.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            units: vec![
                PlayerUnitDef {
                    id: "militia".to_string(),
                    name: "unit.militia.name".to_string(),
                    rarity_weight: 60,
                    stats: UnitStats {
                        max_hp: 10,
                        attack_damage: 3,
                        attack_range: 1,
                        attack_interval: 2,
                        resource_cost: 4,
                        kill_reward: 0,
                        charge_distance: 0,
                        reveal_radius: Fixed::from_num(2),
                    },
                },
                PlayerUnitDef {
                    id: "lancer".to_string(),
                    name: "unit.lancer.name".to_string(),
                    rarity_weight: 30,
                    stats: UnitStats {
                        max_hp: 8,
                        attack_damage: 4,
                        attack_range: 2,
                        attack_interval: 2,
                        resource_cost: 6,
                        kill_reward: 0,
                        charge_distance: 1,
                        reveal_radius: Fixed::from_num(2),
                    },
                },
                PlayerUnitDef {
                    id: "vanguard".to_string(),
                    name: "unit.vanguard.name".to_string(),
                    rarity_weight: 10,
                    stats: UnitStats {
                        max_hp: 16,
                        attack_damage: 6,
                        attack_range: 1,
                        attack_interval: 3,
                        resource_cost: 9,
                        kill_reward: 0,
                        charge_distance: 2,
                        reveal_radius: Fixed::from_num(3),
                    },
                },
            ],
        }
    }
}
