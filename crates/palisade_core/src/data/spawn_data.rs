//! Wave spawn tables: enemy strength scaling and resource tiers.

use serde::{Deserialize, Serialize};

use crate::entities::{Footprint, UnitStats};
use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Wave-number-scaled enemy strength table.
///
/// Wave 1 spawns the base values; every later wave adds the per-wave
/// increments. Boss steps (`'3'` in a spawn code) multiply the scaled
/// values on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyScaling {
    /// Hit points at wave 1.
    pub base_hp: u32,
    /// Extra hit points per wave after the first.
    pub hp_per_wave: u32,
    /// Damage at wave 1.
    pub base_damage: u32,
    /// Extra damage per wave after the first.
    pub damage_per_wave: u32,
    /// Attack reach in cells.
    pub attack_range: u32,
    /// Acting-tick interval.
    pub attack_interval: u64,
    /// Charge distance after idle rotation.
    pub charge_distance: u32,
    /// Kill reward at wave 1.
    pub base_kill_reward: u32,
    /// Extra kill reward per wave after the first.
    pub kill_reward_per_wave: u32,
    /// Boss hit point multiplier.
    pub boss_hp_multiplier: u32,
    /// Boss damage multiplier.
    pub boss_damage_multiplier: u32,
    /// Boss kill reward multiplier.
    pub boss_reward_multiplier: u32,
}

impl Default for EnemyScaling {
    fn default() -> Self {
        Self {
            base_hp: 8,
            hp_per_wave: 2,
            base_damage: 2,
            damage_per_wave: 1,
            attack_range: 1,
            attack_interval: 2,
            charge_distance: 1,
            base_kill_reward: 2,
            kill_reward_per_wave: 1,
            boss_hp_multiplier: 4,
            boss_damage_multiplier: 2,
            boss_reward_multiplier: 5,
        }
    }
}

impl EnemyScaling {
    /// Stats for a spawn in the given wave. Enemies cost nothing to spawn
    /// and reveal no fog.
    #[must_use]
    pub fn stats_for(&self, wave: u32, boss: bool) -> UnitStats {
        let steps = wave.saturating_sub(1);
        let mut hp = self.base_hp.saturating_add(self.hp_per_wave.saturating_mul(steps));
        let mut damage = self.base_damage.saturating_add(self.damage_per_wave.saturating_mul(steps));
        let mut reward = self
            .base_kill_reward
            .saturating_add(self.kill_reward_per_wave.saturating_mul(steps));
        if boss {
            hp = hp.saturating_mul(self.boss_hp_multiplier);
            damage = damage.saturating_mul(self.boss_damage_multiplier);
            reward = reward.saturating_mul(self.boss_reward_multiplier);
        }
        UnitStats {
            max_hp: hp,
            attack_damage: damage,
            attack_range: self.attack_range,
            attack_interval: self.attack_interval,
            resource_cost: 0,
            kill_reward: reward,
            charge_distance: self.charge_distance,
            reveal_radius: Fixed::ZERO,
        }
    }

    /// Validate the table can produce live, acting enemies.
    pub fn validate(&self) -> Result<()> {
        if self.base_hp == 0 {
            return Err(GameError::InvalidConfig("enemy base_hp is zero".to_string()));
        }
        if self.attack_interval == 0 {
            return Err(GameError::InvalidConfig("enemy attack_interval is zero".to_string()));
        }
        if self.boss_hp_multiplier == 0 {
            return Err(GameError::InvalidConfig("boss_hp_multiplier is zero".to_string()));
        }
        Ok(())
    }
}

/// One resource tier: hit points, yield, and footprint size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTierDef {
    /// Tier number, 1-based.
    pub tier: u8,
    /// Hit points at full health.
    pub max_hp: u32,
    /// Tokens per point of actual damage.
    pub tokens_per_hit: u32,
    /// Extra tokens on the killing hit.
    pub bonus_tokens: u32,
    /// Footprint width in cells.
    pub width: u32,
    /// Footprint height in cells.
    pub height: u32,
}

impl ResourceTierDef {
    /// The tier's cell footprint.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        Footprint::new(self.width, self.height)
    }
}

/// Resource tiers plus the wave numbers where spawns upgrade to the next
/// tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTable {
    /// Tiers in ascending order.
    pub tiers: Vec<ResourceTierDef>,
    /// Wave numbers at which `'2'` spawns step up a tier.
    pub upgrade_waves: Vec<u32>,
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                ResourceTierDef {
                    tier: 1,
                    max_hp: 10,
                    tokens_per_hit: 1,
                    bonus_tokens: 3,
                    width: 1,
                    height: 1,
                },
                ResourceTierDef {
                    tier: 2,
                    max_hp: 24,
                    tokens_per_hit: 2,
                    bonus_tokens: 8,
                    width: 2,
                    height: 2,
                },
                ResourceTierDef {
                    tier: 3,
                    max_hp: 45,
                    tokens_per_hit: 3,
                    bonus_tokens: 15,
                    width: 3,
                    height: 3,
                },
            ],
            upgrade_waves: vec![3, 6],
        }
    }
}

impl ResourceTable {
    /// Tier spawned by `'2'` steps in the given wave.
    #[must_use]
    pub fn tier_for_wave(&self, wave: u32) -> Option<&ResourceTierDef> {
        if self.tiers.is_empty() {
            return None;
        }
        let upgrades = self.upgrade_waves.iter().filter(|w| wave >= **w).count();
        let index = upgrades.min(self.tiers.len() - 1);
        self.tiers.get(index)
    }

    /// Validate the table holds at least one minable tier.
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(GameError::InvalidConfig("resource table has no tiers".to_string()));
        }
        for def in &self.tiers {
            if def.max_hp == 0 {
                return Err(GameError::InvalidConfig(format!("resource tier {} has zero max_hp", def.tier)));
            }
            if def.width == 0 || def.height == 0 {
                return Err(GameError::InvalidConfig(format!(
                    "resource tier {} has an empty footprint",
                    def.tier
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_stats_scale_with_wave() {
        let scaling = EnemyScaling::default();
        let w1 = scaling.stats_for(1, false);
        assert_eq!(w1.max_hp, 8);
        assert_eq!(w1.attack_damage, 2);
        assert_eq!(w1.kill_reward, 2);
        let w4 = scaling.stats_for(4, false);
        assert_eq!(w4.max_hp, 8 + 2 * 3);
        assert_eq!(w4.attack_damage, 2 + 3);
        assert_eq!(w4.kill_reward, 2 + 3);
        assert_eq!(w4.resource_cost, 0);
        assert_eq!(w4.reveal_radius, Fixed::ZERO);
    }

    #[test]
    fn test_boss_multiplies_scaled_stats() {
        let scaling = EnemyScaling::default();
        let boss = scaling.stats_for(2, true);
        assert_eq!(boss.max_hp, (8 + 2) * 4);
        assert_eq!(boss.attack_damage, (2 + 1) * 2);
        assert_eq!(boss.kill_reward, (2 + 1) * 5);
    }

    #[test]
    fn test_tier_upgrades_at_configured_waves() {
        let table = ResourceTable::default();
        assert_eq!(table.tier_for_wave(1).unwrap().tier, 1);
        assert_eq!(table.tier_for_wave(2).unwrap().tier, 1);
        assert_eq!(table.tier_for_wave(3).unwrap().tier, 2);
        assert_eq!(table.tier_for_wave(5).unwrap().tier, 2);
        assert_eq!(table.tier_for_wave(6).unwrap().tier, 3);
        assert_eq!(table.tier_for_wave(99).unwrap().tier, 3);
    }

    #[test]
    fn test_tier_clamps_to_last_entry() {
        let mut table = ResourceTable::default();
        table.upgrade_waves = vec![2, 3, 4, 5];
        assert_eq!(table.tier_for_wave(50).unwrap().tier, 3);
    }

    #[test]
    fn test_validation_rejects_degenerate_tables() {
        let mut scaling = EnemyScaling::default();
        scaling.attack_interval = 0;
        assert!(scaling.validate().is_err());

        let empty = ResourceTable {
            tiers: Vec::new(),
            upgrade_waves: Vec::new(),
        };
        assert!(empty.validate().is_err());
        assert!(empty.tier_for_wave(1).is_none());

        let mut table = ResourceTable::default();
        table.tiers[1].width = 0;
        assert!(table.validate().is_err());
    }
}
