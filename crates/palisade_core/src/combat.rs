//! Unit turn resolution: facing scans, attacks, idle rotation, charges.
//!
//! On its acting ticks a unit attacks along its current facing if the scan
//! finds a target; only when nothing is engaged does it rotate one step,
//! optionally charge forward, and scan again. A locked-on unit therefore
//! holds its facing and hits every acting tick.
//!
//! Resolution works on a cloned copy of the acting unit and writes it back
//! at the end, so target lookups can borrow storage mutably without
//! aliasing the attacker.

use crate::entities::{Damageable, EntityId, EntityStorage, Occupant, Team, Unit};
use crate::error::{GameError, Result};
use crate::grid::{Grid, GridPos};

/// One landed hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    /// Attacking unit.
    pub attacker: EntityId,
    /// Damaged entity.
    pub target: EntityId,
    /// Actual damage after clamping. Always positive; zero-damage
    /// engagements (hitting an already-dead occupant) are not reported.
    pub amount: u32,
}

/// Outcome of one unit's acting tick. The session applies tokens, events
/// and the end-of-tick destruction sweep from this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Hits landed this turn.
    pub damage: Vec<DamageEvent>,
    /// Tokens the player earned: mining yield, kill bonuses, kill rewards.
    pub tokens_earned: u32,
    /// Entities that reached zero HP this turn.
    pub destroyed: Vec<EntityId>,
    /// Charge movement, if the unit relocated.
    pub moved: Option<(GridPos, GridPos)>,
    /// Whether the unit took its idle rotation step.
    pub rotated: bool,
}

/// Resolve one acting tick for `unit_id`.
///
/// Destroyed grid cells are left in place here; the session frees them in
/// its end-of-tick sweep so that same-tick attackers still find (and
/// zero-clamp against) dying occupants.
pub fn resolve_unit_turn(
    grid: &mut Grid,
    entities: &mut EntityStorage,
    unit_id: EntityId,
) -> Result<TurnReport> {
    let mut unit = match entities.get(unit_id) {
        Some(Occupant::Unit(u)) => u.clone(),
        Some(Occupant::Resource(_)) => {
            return Err(GameError::InvalidState(format!(
                "entity {unit_id} is a resource node, not a unit"
            )))
        }
        None => return Err(GameError::EntityNotFound(unit_id)),
    };

    let mut report = TurnReport::default();
    if unit.is_destroyed() {
        return Ok(report);
    }

    if try_attack(grid, entities, &unit, &mut report) {
        write_back(entities, unit);
        return Ok(report);
    }

    // Nothing engaged: rotate, charge if able, scan again
    unit.rotate_scan_step();
    report.rotated = true;
    if unit.stats.charge_distance > 0 {
        charge(grid, &mut unit, &mut report);
    }
    let _ = try_attack(grid, entities, &unit, &mut report);
    write_back(entities, unit);
    Ok(report)
}

/// Scan along the unit's facing and attack the first occupant found.
///
/// Returns `true` if a target was engaged (even for a zero-damage hit on a
/// dying occupant). Allies block the ray without effect, as does a
/// resource node in front of an enemy unit: enemies never mine.
fn try_attack(grid: &Grid, entities: &mut EntityStorage, attacker: &Unit, report: &mut TurnReport) -> bool {
    let (dx, dy) = attacker.facing.delta();
    for step in 1..=attacker.stats.attack_range as i32 {
        let pos = attacker.position.offset(dx * step, dy * step);
        if !grid.is_valid_cell(pos) {
            return false;
        }
        let Some(target_id) = grid.cell_occupant(pos) else {
            continue;
        };
        let Some(target) = entities.get_mut(target_id) else {
            // Stale handle; treat as blocking terrain until the sweep
            return false;
        };
        return match target {
            Occupant::Unit(t) if t.team != attacker.team => {
                let actual = t.take_damage(attacker.stats.attack_damage);
                if actual > 0 {
                    report.damage.push(DamageEvent {
                        attacker: attacker.id,
                        target: target_id,
                        amount: actual,
                    });
                    if t.is_destroyed() {
                        report.destroyed.push(target_id);
                        if attacker.team == Team::Player {
                            report.tokens_earned += t.stats.kill_reward;
                        }
                    }
                }
                true
            }
            Occupant::Resource(node) if attacker.team == Team::Player => {
                let actual = node.take_damage(attacker.stats.attack_damage);
                if actual > 0 {
                    report.damage.push(DamageEvent {
                        attacker: attacker.id,
                        target: target_id,
                        amount: actual,
                    });
                    report.tokens_earned += node.tokens_per_hit * actual;
                    if node.is_destroyed() {
                        report.tokens_earned += node.bonus_tokens;
                        report.destroyed.push(target_id);
                    }
                }
                true
            }
            _ => false,
        };
    }
    false
}

/// Walk up to `charge_distance` contiguous empty cells along the current
/// facing, stopping before the first occupied cell or the grid edge. The
/// grid re-registration is a single remove/place pair.
fn charge(grid: &mut Grid, unit: &mut Unit, report: &mut TurnReport) {
    let (dx, dy) = unit.facing.delta();
    let start = unit.position;
    let mut pos = start;
    let mut steps = 0;
    while steps < unit.stats.charge_distance {
        let next = pos.offset(dx, dy);
        if !grid.is_cell_empty(next) {
            break;
        }
        pos = next;
        steps += 1;
    }
    if pos != start {
        let state = unit.cell_state();
        let _ = grid.remove_unit(start);
        let placed = grid.place_unit(pos, unit.id, state);
        debug_assert!(placed, "charge cells were verified empty");
        unit.position = pos;
        report.moved = Some((start, pos));
    }
}

fn write_back(entities: &mut EntityStorage, unit: Unit) {
    if let Some(stored) = entities.get_mut(unit.id).and_then(Occupant::as_unit_mut) {
        *stored = unit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Facing, Footprint, ResourceNode, UnitKindId, UnitOrigin, UnitStats};
    use crate::grid::CellState;
    use crate::math::Fixed;

    fn stats() -> UnitStats {
        UnitStats {
            max_hp: 10,
            attack_damage: 3,
            attack_range: 1,
            attack_interval: 2,
            resource_cost: 4,
            kill_reward: 2,
            charge_distance: 0,
            reveal_radius: Fixed::from_num(2),
        }
    }

    struct Field {
        grid: Grid,
        entities: EntityStorage,
    }

    impl Field {
        fn new(w: u32, h: u32) -> Self {
            Self {
                grid: Grid::new(w, h, Fixed::from_num(1)),
                entities: EntityStorage::new(),
            }
        }

        fn add_unit(&mut self, team: Team, pos: GridPos, stats: UnitStats) -> EntityId {
            let origin = match team {
                Team::Player => UnitOrigin::Drafted(UnitKindId(0)),
                Team::Enemy => UnitOrigin::Wave { wave: 1, boss: false },
            };
            let id = self
                .entities
                .spawn(|id| Occupant::Unit(Unit::spawn(id, team, origin, stats, pos)));
            let state = match team {
                Team::Player => CellState::PlayerUnit,
                Team::Enemy => CellState::EnemyUnit,
            };
            assert!(self.grid.place_unit(pos, id, state));
            id
        }

        fn add_resource(&mut self, pos: GridPos, hp: u32, per_hit: u32, bonus: u32) -> EntityId {
            let id = self.entities.spawn(|id| {
                Occupant::Resource(ResourceNode::spawn(id, 1, per_hit, bonus, Footprint::SINGLE, pos, hp))
            });
            assert!(self.grid.place_unit(pos, id, CellState::Resource));
            id
        }

        fn unit(&self, id: EntityId) -> &Unit {
            self.entities.get(id).and_then(Occupant::as_unit).unwrap()
        }

        fn resolve(&mut self, id: EntityId) -> TurnReport {
            resolve_unit_turn(&mut self.grid, &mut self.entities, id).unwrap()
        }
    }

    #[test]
    fn test_locked_target_attacks_without_rotating() {
        let mut field = Field::new(4, 4);
        let soldier = field.add_unit(Team::Player, GridPos::new(1, 1), stats());
        let node = field.add_resource(GridPos::new(1, 2), 10, 1, 3);

        let report = field.resolve(soldier);
        assert!(!report.rotated);
        assert_eq!(report.damage, vec![DamageEvent { attacker: soldier, target: node, amount: 3 }]);
        assert_eq!(report.tokens_earned, 3);
        assert_eq!(field.unit(soldier).facing, Facing::North);

        // Still locked on the following acting ticks
        let report = field.resolve(soldier);
        assert!(!report.rotated);
        assert_eq!(report.tokens_earned, 3);
    }

    #[test]
    fn test_idle_unit_rotates_by_team_direction() {
        let mut field = Field::new(6, 6);
        let player = field.add_unit(Team::Player, GridPos::new(1, 1), stats());
        let enemy = field.add_unit(Team::Enemy, GridPos::new(4, 4), stats());

        let report = field.resolve(player);
        assert!(report.rotated);
        assert!(report.damage.is_empty());
        assert_eq!(field.unit(player).facing, Facing::East);

        let report = field.resolve(enemy);
        assert!(report.rotated);
        assert_eq!(field.unit(enemy).facing, Facing::West);
    }

    #[test]
    fn test_rotation_finds_target_same_tick() {
        let mut field = Field::new(4, 4);
        let player = field.add_unit(Team::Player, GridPos::new(1, 1), stats());
        // Nothing north, enemy to the east: rotate then hit in one turn
        let enemy = field.add_unit(Team::Enemy, GridPos::new(2, 1), stats());

        let report = field.resolve(player);
        assert!(report.rotated);
        assert_eq!(report.damage.len(), 1);
        assert_eq!(report.damage[0].target, enemy);
        assert_eq!(field.unit(enemy).current_hp, 7);
        assert_eq!(field.unit(player).facing, Facing::East);
    }

    #[test]
    fn test_ray_stops_at_first_occupant() {
        let mut field = Field::new(4, 6);
        let mut long_range = stats();
        long_range.attack_range = 3;
        let player = field.add_unit(Team::Player, GridPos::new(1, 1), long_range);
        // Ally two cells ahead shields the enemy behind it
        let ally = field.add_unit(Team::Player, GridPos::new(1, 3), stats());
        let enemy = field.add_unit(Team::Enemy, GridPos::new(1, 4), stats());

        let report = field.resolve(player);
        // Blocked north; rotation sweeps east where nothing stands
        assert!(report.rotated);
        assert!(report.damage.is_empty());
        assert_eq!(field.unit(ally).current_hp, 10);
        assert_eq!(field.unit(enemy).current_hp, 10);
    }

    #[test]
    fn test_range_reaches_across_empty_cells() {
        let mut field = Field::new(3, 6);
        let mut long_range = stats();
        long_range.attack_range = 3;
        let player = field.add_unit(Team::Player, GridPos::new(1, 1), long_range);
        let enemy = field.add_unit(Team::Enemy, GridPos::new(1, 4), stats());

        let report = field.resolve(player);
        assert!(!report.rotated);
        assert_eq!(report.damage[0].target, enemy);
    }

    #[test]
    fn test_scan_stops_at_grid_edge() {
        let mut field = Field::new(3, 3);
        let mut long_range = stats();
        long_range.attack_range = 5;
        // On the north edge facing north: the ray leaves the grid at once
        let player = field.add_unit(Team::Player, GridPos::new(1, 2), long_range);
        let report = field.resolve(player);
        assert!(report.rotated);
        assert!(report.damage.is_empty());
    }

    #[test]
    fn test_enemy_hits_player_unit_for_no_tokens() {
        let mut field = Field::new(4, 4);
        let enemy = field.add_unit(Team::Enemy, GridPos::new(1, 2), stats());
        let player = field.add_unit(Team::Player, GridPos::new(1, 3), stats());

        let report = field.resolve(enemy);
        assert_eq!(report.damage.len(), 1);
        assert_eq!(report.damage[0].target, player);
        assert_eq!(report.tokens_earned, 0);
        assert_eq!(field.unit(player).current_hp, 7);
    }

    #[test]
    fn test_enemies_never_mine_resources() {
        let mut field = Field::new(4, 4);
        let enemy = field.add_unit(Team::Enemy, GridPos::new(1, 1), stats());
        let node = field.add_resource(GridPos::new(1, 2), 10, 1, 3);

        let report = field.resolve(enemy);
        // Resource blocks the ray without effect; the enemy goes idle
        assert!(report.rotated);
        assert!(report.damage.is_empty());
        assert_eq!(report.tokens_earned, 0);
        let hp = field.entities.get(node).and_then(Occupant::as_resource).unwrap().current_hp;
        assert_eq!(hp, 10);
    }

    #[test]
    fn test_mining_yield_and_lethal_bonus() {
        let mut field = Field::new(4, 4);
        let mut heavy = stats();
        heavy.attack_damage = 4;
        let soldier = field.add_unit(Team::Player, GridPos::new(1, 1), heavy);
        let node = field.add_resource(GridPos::new(1, 2), 6, 2, 5);

        let report = field.resolve(soldier);
        // 4 actual damage at 2 tokens each
        assert_eq!(report.tokens_earned, 8);
        assert!(report.destroyed.is_empty());

        let report = field.resolve(soldier);
        // 2 remaining HP clamps the hit; lethal adds the 5-token bonus
        assert_eq!(report.damage[0].amount, 2);
        assert_eq!(report.tokens_earned, 2 * 2 + 5);
        assert_eq!(report.destroyed, vec![node]);
    }

    #[test]
    fn test_kill_reward_on_enemy_death() {
        let mut field = Field::new(4, 4);
        let mut lethal = stats();
        lethal.attack_damage = 10;
        let player = field.add_unit(Team::Player, GridPos::new(1, 1), lethal);
        let mut bounty = stats();
        bounty.kill_reward = 7;
        let enemy = field.add_unit(Team::Enemy, GridPos::new(1, 2), bounty);

        let report = field.resolve(player);
        assert_eq!(report.destroyed, vec![enemy]);
        assert_eq!(report.tokens_earned, 7);
    }

    #[test]
    fn test_dead_occupant_blocks_but_yields_nothing() {
        let mut field = Field::new(4, 4);
        let mut lethal = stats();
        lethal.attack_damage = 10;
        let first = field.add_unit(Team::Player, GridPos::new(1, 1), lethal);
        let second = field.add_unit(Team::Player, GridPos::new(1, 3), lethal);
        // Both soldiers face the node between them
        let mut south = Unit::spawn(
            second,
            Team::Player,
            UnitOrigin::Drafted(UnitKindId(0)),
            lethal,
            GridPos::new(1, 3),
        );
        south.facing = Facing::South;
        *field.entities.get_mut(second).and_then(Occupant::as_unit_mut).unwrap() = south;
        let node = field.add_resource(GridPos::new(1, 2), 6, 1, 3);

        let report = field.resolve(first);
        assert_eq!(report.tokens_earned, 6 + 3);
        assert_eq!(report.destroyed, vec![node]);

        // Cell not yet swept: the second attacker engages the corpse,
        // deals zero, earns nothing, and the node is not destroyed twice
        let report = field.resolve(second);
        assert!(!report.rotated);
        assert!(report.damage.is_empty());
        assert_eq!(report.tokens_earned, 0);
        assert!(report.destroyed.is_empty());
    }

    #[test]
    fn test_charge_covers_distance_and_reregisters() {
        let mut field = Field::new(6, 6);
        let mut charger = stats();
        charger.charge_distance = 2;
        let player = field.add_unit(Team::Player, GridPos::new(0, 0), charger);

        let report = field.resolve(player);
        // Rotated east, then charged two empty cells
        assert!(report.rotated);
        assert_eq!(report.moved, Some((GridPos::new(0, 0), GridPos::new(2, 0))));
        assert_eq!(field.unit(player).position, GridPos::new(2, 0));
        assert!(field.grid.cell(GridPos::new(0, 0)).unwrap().is_empty());
        assert_eq!(field.grid.cell_occupant(GridPos::new(2, 0)), Some(player));
    }

    #[test]
    fn test_charge_stops_before_occupied_cell_then_attacks() {
        let mut field = Field::new(8, 3);
        let mut charger = stats();
        charger.charge_distance = 4;
        let player = field.add_unit(Team::Player, GridPos::new(0, 0), charger);
        let enemy = field.add_unit(Team::Enemy, GridPos::new(3, 0), stats());

        let report = field.resolve(player);
        // East charge halts one short of the enemy, then the re-scan hits it
        assert_eq!(report.moved, Some((GridPos::new(0, 0), GridPos::new(2, 0))));
        assert_eq!(report.damage.len(), 1);
        assert_eq!(report.damage[0].target, enemy);
    }

    #[test]
    fn test_charge_stops_at_edge() {
        let mut field = Field::new(4, 4);
        let mut charger = stats();
        charger.charge_distance = 10;
        let player = field.add_unit(Team::Player, GridPos::new(2, 0), charger);

        let report = field.resolve(player);
        // Facing east after rotation; the edge caps the run at x=3
        assert_eq!(report.moved, Some((GridPos::new(2, 0), GridPos::new(3, 0))));
    }

    #[test]
    fn test_missing_entity_is_an_error() {
        let mut field = Field::new(3, 3);
        let err = resolve_unit_turn(&mut field.grid, &mut field.entities, 42).unwrap_err();
        assert!(matches!(err, GameError::EntityNotFound(42)));
    }
}
