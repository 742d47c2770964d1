//! Entities that occupy the grid: combat units and resource nodes.
//!
//! Entities live in an id-keyed [`EntityStorage`]; the grid stores only
//! their handles. All lifecycle transitions (spawn, damage, destruction)
//! go through the typed APIs here so the destroyed flag flips exactly once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::grid::{CellState, GridPos};
use crate::math::{fixed_serde, Fixed};

/// Unique entity identifier, allocated monotonically per session.
pub type EntityId = u64;

/// Index into the player unit roster (the deck's draw pool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitKindId(pub u32);

/// Which side an entity fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Player-deployed units.
    Player,
    /// Wave-spawned attackers.
    Enemy,
}

impl Team {
    /// Idle-scan rotation direction: player units sweep clockwise, enemy
    /// units counter-clockwise.
    #[must_use]
    pub const fn rotates_clockwise(self) -> bool {
        matches!(self, Team::Player)
    }

    /// The opposing team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }
}

/// Cardinal facing. North is +y so "north edge" means the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Toward +y.
    North,
    /// Toward +x.
    East,
    /// Toward -y.
    South,
    /// Toward -x.
    West,
}

impl Facing {
    /// Cell-coordinate step along this facing.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Facing::North => (0, 1),
            Facing::East => (1, 0),
            Facing::South => (0, -1),
            Facing::West => (-1, 0),
        }
    }

    /// One 90-degree step clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Facing::North => Facing::East,
            Facing::East => Facing::South,
            Facing::South => Facing::West,
            Facing::West => Facing::North,
        }
    }

    /// One 90-degree step counter-clockwise.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        match self {
            Facing::North => Facing::West,
            Facing::West => Facing::South,
            Facing::South => Facing::East,
            Facing::East => Facing::North,
        }
    }

    /// One rotation step in the given direction.
    #[must_use]
    pub const fn rotated(self, clockwise: bool) -> Self {
        if clockwise {
            self.clockwise()
        } else {
            self.counter_clockwise()
        }
    }
}

/// Combat statistics for a unit. Immutable after spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Hit points at full health.
    pub max_hp: u32,
    /// Damage dealt per attack before clamping.
    pub attack_damage: u32,
    /// Attack reach in cells along the current facing.
    pub attack_range: u32,
    /// The unit acts on ticks where `count % attack_interval == 0`.
    pub attack_interval: u64,
    /// Token cost to deploy from the hand. Zero for wave spawns.
    pub resource_cost: u32,
    /// Tokens granted to the player when this unit is destroyed.
    pub kill_reward: u32,
    /// Maximum contiguous empty cells walked after an idle rotation.
    pub charge_distance: u32,
    /// Fog reveal radius in cells around the occupied cell (Euclidean,
    /// fixed-point so fractional radii are exact).
    #[serde(with = "fixed_serde")]
    pub reveal_radius: Fixed,
}

/// How a unit entered play, for presentation and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitOrigin {
    /// Deployed from the hand; carries the roster index it was drawn as.
    Drafted(UnitKindId),
    /// Spawned by a wave's spawn code.
    Wave {
        /// Wave number that spawned it.
        wave: u32,
        /// Whether the spawn step was a boss step.
        boss: bool,
    },
}

/// A combat unit occupying exactly one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Storage handle.
    pub id: EntityId,
    /// Owning side.
    pub team: Team,
    /// How this unit entered play.
    pub origin: UnitOrigin,
    /// Combat statistics.
    pub stats: UnitStats,
    /// Occupied cell.
    pub position: GridPos,
    /// Current facing.
    pub facing: Facing,
    /// Remaining hit points.
    pub current_hp: u32,
    destroyed: bool,
}

impl Unit {
    /// Create a live unit at full health, facing north.
    #[must_use]
    pub fn spawn(id: EntityId, team: Team, origin: UnitOrigin, stats: UnitStats, position: GridPos) -> Self {
        Self {
            id,
            team,
            origin,
            stats,
            position,
            facing: Facing::North,
            current_hp: stats.max_hp,
            destroyed: false,
        }
    }

    /// Whether the unit acts on the given tick count.
    #[must_use]
    pub const fn acts_on_tick(&self, count: u64) -> bool {
        self.stats.attack_interval != 0 && count % self.stats.attack_interval == 0
    }

    /// Rotate one idle-scan step in this team's direction.
    pub fn rotate_scan_step(&mut self) {
        self.facing = self.facing.rotated(self.team.rotates_clockwise());
    }

    /// Grid cell state this unit's cell carries.
    #[must_use]
    pub const fn cell_state(&self) -> CellState {
        match self.team {
            Team::Player => CellState::PlayerUnit,
            Team::Enemy => CellState::EnemyUnit,
        }
    }
}

/// Rectangular cell footprint, anchored at the lowest (x, y) corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl Footprint {
    /// Single-cell footprint.
    pub const SINGLE: Self = Self { width: 1, height: 1 };

    /// Create a footprint. Zero dimensions are clamped to one cell.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width: if width == 0 { 1 } else { width },
            height: if height == 0 { 1 } else { height },
        }
    }

    /// All cells covered when anchored at `anchor`.
    pub fn cells(self, anchor: GridPos) -> impl Iterator<Item = GridPos> + Clone {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |dy| (0..w).map(move |dx| GridPos::new(anchor.x + dx, anchor.y + dy)))
    }
}

/// A destructible resource node; mining it (attacking it) yields tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Storage handle.
    pub id: EntityId,
    /// Tier 1..=3; higher tiers are larger and richer.
    pub tier: u8,
    /// Tokens granted per point of actual damage dealt.
    pub tokens_per_hit: u32,
    /// Extra tokens granted on the killing hit.
    pub bonus_tokens: u32,
    /// Covered cell rectangle.
    pub footprint: Footprint,
    /// Anchor cell (lowest x, y of the footprint).
    pub anchor: GridPos,
    /// Hit points at full health.
    pub max_hp: u32,
    /// Remaining hit points.
    pub current_hp: u32,
    destroyed: bool,
}

impl ResourceNode {
    /// Create a live node at full health.
    #[must_use]
    pub fn spawn(
        id: EntityId,
        tier: u8,
        tokens_per_hit: u32,
        bonus_tokens: u32,
        footprint: Footprint,
        anchor: GridPos,
        max_hp: u32,
    ) -> Self {
        Self {
            id,
            tier,
            tokens_per_hit,
            bonus_tokens,
            footprint,
            anchor,
            max_hp,
            current_hp: max_hp,
            destroyed: false,
        }
    }

    /// All cells this node covers.
    pub fn cells(&self) -> impl Iterator<Item = GridPos> + Clone {
        self.footprint.cells(self.anchor)
    }
}

/// Common surface for anything that tracks hit points on the grid.
pub trait Damageable {
    /// Remaining hit points.
    fn current_hp(&self) -> u32;
    /// Hit points at full health.
    fn max_hp(&self) -> u32;
    /// Apply damage clamped to remaining HP. Returns the actual damage
    /// dealt; always 0 once destroyed. Flips the destroyed flag exactly
    /// once when HP reaches zero.
    fn take_damage(&mut self, amount: u32) -> u32;
    /// Whether this entity has been destroyed.
    fn is_destroyed(&self) -> bool;
}

impl Damageable for Unit {
    fn current_hp(&self) -> u32 {
        self.current_hp
    }

    fn max_hp(&self) -> u32 {
        self.stats.max_hp
    }

    fn take_damage(&mut self, amount: u32) -> u32 {
        if self.destroyed {
            return 0;
        }
        let actual = amount.min(self.current_hp);
        self.current_hp -= actual;
        if self.current_hp == 0 {
            self.destroyed = true;
        }
        actual
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Damageable for ResourceNode {
    fn current_hp(&self) -> u32 {
        self.current_hp
    }

    fn max_hp(&self) -> u32 {
        self.max_hp
    }

    fn take_damage(&mut self, amount: u32) -> u32 {
        if self.destroyed {
            return 0;
        }
        let actual = amount.min(self.current_hp);
        self.current_hp -= actual;
        if self.current_hp == 0 {
            self.destroyed = true;
        }
        actual
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Anything that can occupy grid cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupant {
    /// A combat unit.
    Unit(Unit),
    /// A resource node.
    Resource(ResourceNode),
}

impl Occupant {
    /// Storage handle.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        match self {
            Occupant::Unit(u) => u.id,
            Occupant::Resource(r) => r.id,
        }
    }

    /// Cell state this occupant's cells carry.
    #[must_use]
    pub const fn cell_state(&self) -> CellState {
        match self {
            Occupant::Unit(u) => u.cell_state(),
            Occupant::Resource(_) => CellState::Resource,
        }
    }

    /// Borrow as a unit, if it is one.
    #[must_use]
    pub const fn as_unit(&self) -> Option<&Unit> {
        match self {
            Occupant::Unit(u) => Some(u),
            Occupant::Resource(_) => None,
        }
    }

    /// Mutably borrow as a unit, if it is one.
    pub fn as_unit_mut(&mut self) -> Option<&mut Unit> {
        match self {
            Occupant::Unit(u) => Some(u),
            Occupant::Resource(_) => None,
        }
    }

    /// Borrow as a resource node, if it is one.
    #[must_use]
    pub const fn as_resource(&self) -> Option<&ResourceNode> {
        match self {
            Occupant::Resource(r) => Some(r),
            Occupant::Unit(_) => None,
        }
    }

    /// All cells this occupant covers.
    pub fn cells(&self) -> Vec<GridPos> {
        match self {
            Occupant::Unit(u) => vec![u.position],
            Occupant::Resource(r) => r.cells().collect(),
        }
    }
}

impl Damageable for Occupant {
    fn current_hp(&self) -> u32 {
        match self {
            Occupant::Unit(u) => u.current_hp(),
            Occupant::Resource(r) => r.current_hp(),
        }
    }

    fn max_hp(&self) -> u32 {
        match self {
            Occupant::Unit(u) => u.max_hp(),
            Occupant::Resource(r) => r.max_hp(),
        }
    }

    fn take_damage(&mut self, amount: u32) -> u32 {
        match self {
            Occupant::Unit(u) => u.take_damage(amount),
            Occupant::Resource(r) => r.take_damage(amount),
        }
    }

    fn is_destroyed(&self) -> bool {
        match self {
            Occupant::Unit(u) => u.is_destroyed(),
            Occupant::Resource(r) => r.is_destroyed(),
        }
    }
}

/// Id-keyed entity storage with monotonic id allocation.
///
/// # Determinism
///
/// `HashMap` iteration order is not deterministic; any logic that iterates
/// entities must go through [`EntityStorage::sorted_ids`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStorage {
    entities: HashMap<EntityId, Occupant>,
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and insert the occupant built from it.
    pub fn spawn(&mut self, build: impl FnOnce(EntityId) -> Occupant) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        let occupant = build(id);
        debug_assert_eq!(occupant.id(), id);
        let _ = self.entities.insert(id, occupant);
        id
    }

    /// Look up an occupant.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Occupant> {
        self.entities.get(&id)
    }

    /// Mutably look up an occupant.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Occupant> {
        self.entities.get_mut(&id)
    }

    /// Remove an occupant, returning it if present.
    pub fn remove(&mut self, id: EntityId) -> Option<Occupant> {
        self.entities.remove(&id)
    }

    /// Number of live occupants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All ids in ascending order, for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate occupants in unspecified order (queries only).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Occupant)> {
        self.entities.iter()
    }
}
