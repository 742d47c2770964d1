//! The session: one running game owning every service.
//!
//! The session wires the clock, grid, fog, ledger, deck, wave director and
//! entity storage together and exposes the whole mutation surface the
//! presentation layer is allowed to touch. All state lives here by value;
//! nothing is global.
//!
//! # Update Order
//!
//! Each [`Session::update`] call, in this order:
//! 1. **Interval ticks** - fired tick counts dispatch combat turns to
//!    subscribed units in subscription order
//! 2. **Wave machine** - the director consumes the frame delta and the
//!    live enemy count; its actions (warn, activate, complete) execute
//! 3. **Defeat check** - zero player units, empty hand, and an
//!    unaffordable draw while a wave is active ends the game
//! 4. **Vision** - the visible mask recomputes around player units
//!
//! # Determinism
//!
//! Two sessions built from the same config (same seed) and fed the same
//! sequence of calls produce identical [`Session::state_hash`] values.
//! All randomness flows through the session's seeded RNG; all entity
//! iteration is id-sorted or subscription-ordered.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::clock::IntervalClock;
use crate::combat::{self, TurnReport};
use crate::data::{validate_plan, EnemyScaling, ResourceTable, Roster};
use crate::deck::{Deck, DrawError, DrawPolicy};
use crate::economy::TokenLedger;
use crate::entities::{
    Damageable, EntityId, EntityStorage, Occupant, ResourceNode, Team, Unit, UnitKindId, UnitOrigin,
};
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::fog::FogGrid;
use crate::grid::{CellState, Grid, GridPos};
use crate::math::{fixed_serde, Fixed};
use crate::placement::{validate_deploy, DeployError};
use crate::waves::{
    DirectorAction, DowntimeSchedule, GameOutcome, SpawnStep, WaveData, WaveDirector, WavePhase,
};

/// Everything needed to start a session. Validated as a whole by
/// [`SessionConfig::validate`] before any state is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Grid width in cells.
    pub grid_width: u32,
    /// Grid height in cells.
    pub grid_height: u32,
    /// World-space edge length of one cell.
    #[serde(with = "fixed_serde")]
    pub cell_size: Fixed,
    /// Interval between ticks.
    pub tick_interval: Duration,
    /// Opening token balance.
    pub starting_tokens: u32,
    /// Draw pricing.
    pub draw_policy: DrawPolicy,
    /// Hand slot count.
    pub hand_capacity: usize,
    /// Southern rows revealed at session start so the player has ground
    /// to deploy on.
    pub home_rows: u32,
    /// Deployable unit kinds and their draw weights.
    pub roster: Roster,
    /// Enemy strength scaling per wave.
    pub enemy_scaling: EnemyScaling,
    /// Resource tiers for `'2'` spawns.
    pub resource_table: ResourceTable,
    /// The wave schedule.
    pub waves: Vec<WaveData>,
    /// Downtime between waves.
    pub downtime: DowntimeSchedule,
    /// Warn this long before a wave activates.
    pub warn_threshold: Duration,
    /// Weight (out of 100) given to fogged ground when choosing a
    /// resource spawn cell.
    pub hidden_spawn_weight: u32,
    /// RNG seed; everything random in the session derives from it.
    pub seed: u64,
}

impl SessionConfig {
    /// The standard preset: 12x12 grid, one-second ticks, the standard
    /// roster and eight-wave plan.
    #[must_use]
    pub fn standard(seed: u64) -> Self {
        Self {
            grid_width: 12,
            grid_height: 12,
            cell_size: Fixed::from_num(1),
            tick_interval: Duration::from_secs(1),
            starting_tokens: 12,
            draw_policy: DrawPolicy {
                base_cost: 6,
                cost_increment: 1,
                discount: None,
            },
            hand_capacity: 5,
            home_rows: 2,
            roster: Roster::standard(),
            enemy_scaling: EnemyScaling::default(),
            resource_table: ResourceTable::default(),
            waves: crate::data::standard_plan(),
            downtime: DowntimeSchedule::default(),
            warn_threshold: Duration::from_secs(5),
            hidden_spawn_weight: 70,
            seed,
        }
    }

    /// Validate the configuration as a whole.
    pub fn validate(&self) -> Result<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(GameError::InvalidConfig("grid dimensions must be positive".to_string()));
        }
        if self.tick_interval.is_zero() {
            return Err(GameError::InvalidConfig("tick_interval must be positive".to_string()));
        }
        if self.hand_capacity == 0 {
            return Err(GameError::InvalidConfig("hand_capacity must be positive".to_string()));
        }
        if self.hidden_spawn_weight > 100 {
            return Err(GameError::InvalidConfig(format!(
                "hidden_spawn_weight {} exceeds 100",
                self.hidden_spawn_weight
            )));
        }
        self.roster.validate()?;
        self.enemy_scaling.validate()?;
        self.resource_table.validate()?;
        validate_plan(&self.waves)?;
        Ok(())
    }
}

/// One running game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    config: SessionConfig,
    grid: Grid,
    fog: FogGrid,
    clock: IntervalClock,
    ledger: TokenLedger,
    deck: Deck,
    director: WaveDirector,
    entities: EntityStorage,
    /// Tick subscribers in subscription order.
    subscribers: Vec<EntityId>,
    rng: ChaCha8Rng,
    #[serde(skip)]
    events: Vec<GameEvent>,
}

impl Session {
    /// Build a session from a validated config.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let table = config.roster.rarity_table()?;
        let mut session = Self {
            grid: Grid::new(config.grid_width, config.grid_height, config.cell_size),
            fog: FogGrid::new(config.grid_width, config.grid_height),
            clock: IntervalClock::new(config.tick_interval),
            ledger: TokenLedger::new(config.starting_tokens),
            deck: Deck::new(config.draw_policy, table, config.hand_capacity),
            director: WaveDirector::new(config.waves.clone(), config.downtime, config.warn_threshold),
            entities: EntityStorage::new(),
            subscribers: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: Vec::new(),
            config,
        };
        session.reveal_home_rows();
        Ok(session)
    }

    fn reveal_home_rows(&mut self) {
        let rows = self.config.home_rows.min(self.grid.height()) as i32;
        for y in 0..rows {
            for x in 0..self.grid.width() as i32 {
                let _ = self.fog.reveal_cell(GridPos::new(x, y));
            }
        }
    }

    // ==== Queries ====

    /// The config this session was built from.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The occupancy grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The fog masks.
    #[must_use]
    pub const fn fog(&self) -> &FogGrid {
        &self.fog
    }

    /// The wave director.
    #[must_use]
    pub const fn director(&self) -> &WaveDirector {
        &self.director
    }

    /// The deck (hand, draw count, pool).
    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Entity storage.
    #[must_use]
    pub const fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Current token balance.
    #[must_use]
    pub const fn tokens(&self) -> u32 {
        self.ledger.balance()
    }

    /// Count of the most recently fired tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.clock.count()
    }

    /// Fraction of the current interval elapsed, for UI.
    #[must_use]
    pub fn tick_progress(&self) -> f32 {
        self.clock.progress()
    }

    /// Whether the clock is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Current wave phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.director.phase()
    }

    /// Final outcome once the game ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<GameOutcome> {
        self.director.outcome()
    }

    /// Price of the next draw right now.
    #[must_use]
    pub fn draw_cost(&self) -> u32 {
        self.deck.current_cost(self.clock.count())
    }

    /// Look up an entity.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&Occupant> {
        self.entities.get(id)
    }

    // ==== Mutations ====

    /// Advance the session by one frame and drain the event buffer.
    ///
    /// Does nothing (beyond draining) while paused or after game over.
    pub fn update(&mut self, dt: Duration) -> Vec<GameEvent> {
        if self.clock.is_paused() || self.director.is_terminal() {
            return std::mem::take(&mut self.events);
        }

        for count in self.clock.advance(dt) {
            self.run_tick(count);
        }

        let live_enemies = self.grid.count_cells(CellState::EnemyUnit);
        let actions = self.director.update(dt, live_enemies);
        self.execute_director_actions(actions);

        self.check_defeat();
        self.refresh_vision();

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        std::mem::take(&mut self.events)
    }

    /// Drain buffered events without advancing time. Useful after
    /// [`Session::deploy_from_hand`] and friends.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pause the clock (and with it the wave countdown).
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Resume from pause; partial tick progress is preserved.
    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// Buy one deck draw into the hand.
    pub fn draw_unit(&mut self) -> std::result::Result<UnitKindId, DrawError> {
        let tick = self.clock.count();
        let (kind, cost) = self.deck.draw(&mut self.ledger, &mut self.rng, tick)?;
        tracing::debug!(kind = kind.0, cost, "draw committed");
        self.events.push(GameEvent::TokensChanged {
            total: self.ledger.balance(),
        });
        Ok(kind)
    }

    /// Deploy the unit in `slot` onto `pos`.
    ///
    /// Validates bounds, occupancy, fog and cost before committing; a
    /// refused deploy changes nothing. On success the unit spends its
    /// cost, leaves the hand, occupies the cell, subscribes to the clock,
    /// and reveals fog around itself.
    pub fn deploy_from_hand(&mut self, slot: usize, pos: GridPos) -> std::result::Result<EntityId, DeployError> {
        let Some(kind) = self.deck.hand().get(slot) else {
            return Err(DeployError::EmptyHandSlot { slot });
        };
        let Some(def) = self.config.roster.get(kind) else {
            // The hand only ever holds kinds drawn from the roster
            return Err(DeployError::EmptyHandSlot { slot });
        };
        let stats = def.stats;
        validate_deploy(&self.grid, &self.fog, &self.ledger, pos, stats.resource_cost)?;

        let spent = self.ledger.spend(stats.resource_cost);
        debug_assert!(spent, "validated as affordable");
        let taken = self.deck.take_from_hand(slot);
        debug_assert_eq!(taken, Some(kind));
        let id = self
            .entities
            .spawn(|id| Occupant::Unit(Unit::spawn(id, Team::Player, UnitOrigin::Drafted(kind), stats, pos)));
        let placed = self.grid.place_unit(pos, id, CellState::PlayerUnit);
        debug_assert!(placed, "validated as empty");
        self.subscribe(id);
        self.events.push(GameEvent::TokensChanged {
            total: self.ledger.balance(),
        });
        for cell in self.fog.reveal_radius(pos, stats.reveal_radius) {
            self.events.push(GameEvent::CellRevealed { pos: cell });
        }
        tracing::debug!(entity = id, %pos, "deployed from hand");
        Ok(id)
    }

    /// Take an occupant off the grid entirely (presentation-driven
    /// removal, not destruction: no events, no rewards, no refund).
    pub fn remove_unit(&mut self, pos: GridPos) -> Option<EntityId> {
        let id = self.grid.cell_occupant(pos)?;
        if let Some(occupant) = self.entities.get(id) {
            let cells = occupant.cells();
            self.grid.remove_footprint(cells);
        }
        let _ = self.entities.remove(id);
        self.unsubscribe(id);
        Some(id)
    }

    /// Resize the grid, re-centering occupants and shifting the fog by
    /// the same offset. Occupants whose footprint no longer fits are
    /// dropped (storage and subscriptions included). Only callable
    /// between updates, which `&mut self` already guarantees.
    pub fn resize_grid(&mut self, new_width: u32, new_height: u32) {
        let report = self.grid.resize(new_width, new_height);
        self.fog.resize(new_width, new_height, report.offset);
        for &id in &report.relocated {
            if let Some(occupant) = self.entities.get_mut(id) {
                match occupant {
                    Occupant::Unit(u) => u.position = u.position.offset(report.offset.0, report.offset.1),
                    Occupant::Resource(r) => r.anchor = r.anchor.offset(report.offset.0, report.offset.1),
                }
            }
        }
        for &id in &report.dropped {
            let _ = self.entities.remove(id);
            self.unsubscribe(id);
        }
        tracing::info!(
            width = new_width,
            height = new_height,
            relocated = report.relocated.len(),
            dropped = report.dropped.len(),
            "grid resized"
        );
        self.events.push(GameEvent::GridResized {
            width: self.grid.width(),
            height: self.grid.height(),
            dropped: report.dropped,
        });
    }

    // ==== Tick dispatch ====

    fn subscribe(&mut self, id: EntityId) {
        if !self.subscribers.contains(&id) {
            self.subscribers.push(id);
        }
    }

    fn unsubscribe(&mut self, id: EntityId) {
        self.subscribers.retain(|s| *s != id);
    }

    fn run_tick(&mut self, count: u64) {
        self.events.push(GameEvent::TickFired { count });

        let mut tick_destroyed: Vec<EntityId> = Vec::new();
        // Snapshot so handlers that mutate the subscriber list (deaths)
        // do not skew this tick's dispatch
        let roster: Vec<EntityId> = self.subscribers.clone();
        for id in roster {
            let acts = match self.entities.get(id) {
                Some(Occupant::Unit(u)) if !u.is_destroyed() => u.acts_on_tick(count),
                _ => false,
            };
            if !acts {
                continue;
            }
            match combat::resolve_unit_turn(&mut self.grid, &mut self.entities, id) {
                Ok(report) => self.apply_turn_report(&report, &mut tick_destroyed),
                Err(e) => {
                    // One failing handler must not starve the rest of the tick
                    tracing::warn!(entity = id, error = %e, "tick handler failed, continuing dispatch");
                }
            }
        }
        self.sweep_destroyed(&tick_destroyed);
    }

    fn apply_turn_report(&mut self, report: &TurnReport, tick_destroyed: &mut Vec<EntityId>) {
        for hit in &report.damage {
            self.events.push(GameEvent::DamageDealt {
                attacker: hit.attacker,
                target: hit.target,
                amount: hit.amount,
            });
        }
        if report.tokens_earned > 0 {
            let total = self.ledger.add(report.tokens_earned);
            self.events.push(GameEvent::TokensChanged { total });
        }
        tick_destroyed.extend_from_slice(&report.destroyed);
    }

    /// Free cells, storage and subscriptions of everything that died this
    /// tick. Deferred to tick end so same-tick attackers found the dying
    /// occupant in place and clamped against it.
    fn sweep_destroyed(&mut self, ids: &[EntityId]) {
        for &id in ids {
            let (cells, event) = match self.entities.get(id) {
                Some(Occupant::Unit(u)) => (vec![u.position], GameEvent::UnitDestroyed { id, team: u.team }),
                Some(Occupant::Resource(r)) => {
                    (r.cells().collect(), GameEvent::ResourceDestroyed { id, tier: r.tier })
                }
                None => continue,
            };
            self.grid.remove_footprint(cells);
            let _ = self.entities.remove(id);
            self.unsubscribe(id);
            self.events.push(event);
        }
    }

    // ==== Wave execution ====

    fn execute_director_actions(&mut self, actions: Vec<DirectorAction>) {
        for action in actions {
            match action {
                DirectorAction::WarnWave { wave } => {
                    self.events.push(GameEvent::WaveWarned { wave });
                }
                DirectorAction::ActivateWave(wave) => self.activate_wave(&wave),
                DirectorAction::CompleteWave { wave } => {
                    self.events.push(GameEvent::WaveCompleted { wave });
                    self.events.push(GameEvent::PhaseChanged {
                        phase: WavePhase::Complete,
                    });
                }
                DirectorAction::EnterPreparation { .. } => {
                    self.events.push(GameEvent::PhaseChanged {
                        phase: WavePhase::Preparation,
                    });
                }
                DirectorAction::DeclareVictory => {
                    self.events.push(GameEvent::PhaseChanged {
                        phase: WavePhase::GameOver,
                    });
                    self.events.push(GameEvent::GameEnded {
                        outcome: GameOutcome::Victory,
                    });
                }
            }
        }
    }

    /// Execute a wave's spawn code, then report the spawn results back to
    /// the director.
    fn activate_wave(&mut self, wave: &WaveData) {
        self.events.push(GameEvent::PhaseChanged {
            phase: WavePhase::Active,
        });
        let mut enemies = 0u32;
        let mut resources = 0u32;
        for &step in wave.spawn_code.steps() {
            match step {
                SpawnStep::Skip => {}
                SpawnStep::Enemy => {
                    if self.spawn_wave_enemy(wave.number, false) {
                        enemies += 1;
                    }
                }
                SpawnStep::Boss => {
                    if self.spawn_wave_enemy(wave.number, true) {
                        enemies += 1;
                    }
                }
                SpawnStep::Resource => {
                    if self.spawn_wave_resource(wave.number) {
                        resources += 1;
                    }
                }
            }
        }
        self.director.wave_activated(enemies);
        tracing::info!(wave = wave.number, enemies, resources, "wave activated");
        self.events.push(GameEvent::WaveSpawned {
            wave: wave.number,
            enemies,
            resources,
        });
    }

    /// Spawn one enemy at a random free north-edge cell. Returns `false`
    /// (logged) if the edge row is full.
    fn spawn_wave_enemy(&mut self, wave: u32, boss: bool) -> bool {
        let row = self.grid.height() as i32 - 1;
        let candidates: Vec<GridPos> = (0..self.grid.width() as i32)
            .map(|x| GridPos::new(x, row))
            .filter(|pos| self.grid.is_cell_empty(*pos))
            .collect();
        if candidates.is_empty() {
            tracing::warn!(wave, boss, "no free north-edge cell, enemy spawn skipped");
            return false;
        }
        let pos = candidates[self.rng.gen_range(0..candidates.len())];
        let stats = self.config.enemy_scaling.stats_for(wave, boss);
        let id = self
            .entities
            .spawn(|id| Occupant::Unit(Unit::spawn(id, Team::Enemy, UnitOrigin::Wave { wave, boss }, stats, pos)));
        let placed = self.grid.place_unit(pos, id, CellState::EnemyUnit);
        debug_assert!(placed, "candidate cell was empty");
        self.subscribe(id);
        true
    }

    /// Spawn one resource node at a random anchor whose whole footprint is
    /// free, biased toward fogged ground by the configured weight.
    fn spawn_wave_resource(&mut self, wave: u32) -> bool {
        let Some(tier) = self.config.resource_table.tier_for_wave(wave).copied() else {
            tracing::warn!(wave, "no resource tier configured, spawn skipped");
            return false;
        };
        let footprint = tier.footprint();
        let mut hidden = Vec::new();
        let mut revealed = Vec::new();
        for y in 0..self.grid.height() as i32 {
            for x in 0..self.grid.width() as i32 {
                let anchor = GridPos::new(x, y);
                if !footprint.cells(anchor).all(|cell| self.grid.is_cell_empty(cell)) {
                    continue;
                }
                if self.fog.is_revealed(anchor) {
                    revealed.push(anchor);
                } else {
                    hidden.push(anchor);
                }
            }
        }
        if hidden.is_empty() && revealed.is_empty() {
            tracing::warn!(wave, tier = tier.tier, "no room for resource footprint, spawn skipped");
            return false;
        }
        // The bias roll always happens so the RNG stream does not depend
        // on which bucket happened to be empty
        let bias_roll = self.rng.gen_range(0..100u32);
        let pick_hidden = if hidden.is_empty() {
            false
        } else if revealed.is_empty() {
            true
        } else {
            bias_roll < self.config.hidden_spawn_weight
        };
        let bucket = if pick_hidden { &hidden } else { &revealed };
        let anchor = bucket[self.rng.gen_range(0..bucket.len())];
        let id = self.entities.spawn(|id| {
            Occupant::Resource(ResourceNode::spawn(
                id,
                tier.tier,
                tier.tokens_per_hit,
                tier.bonus_tokens,
                footprint,
                anchor,
                tier.max_hp,
            ))
        });
        let cells: Vec<GridPos> = footprint.cells(anchor).collect();
        let placed = self.grid.place_footprint(cells, id, CellState::Resource);
        debug_assert!(placed, "anchor footprint was verified empty");
        true
    }

    /// Deadlock defeat: mid-wave with no units on the grid, nothing in
    /// the hand, and a draw the player cannot pay for.
    fn check_defeat(&mut self) {
        if self.director.phase() != WavePhase::Active {
            return;
        }
        if self.grid.count_cells(CellState::PlayerUnit) > 0 {
            return;
        }
        if !self.deck.hand().is_empty() {
            return;
        }
        if self.ledger.can_afford(self.deck.current_cost(self.clock.count())) {
            return;
        }
        if self.director.declare_defeat() {
            tracing::info!("defeat: no units, empty hand, unaffordable draw");
            self.events.push(GameEvent::PhaseChanged {
                phase: WavePhase::GameOver,
            });
            self.events.push(GameEvent::GameEnded {
                outcome: GameOutcome::Defeat,
            });
        }
    }

    fn refresh_vision(&mut self) {
        let sights: Vec<(GridPos, Fixed)> = self
            .subscribers
            .iter()
            .filter_map(|id| self.entities.get(*id).and_then(Occupant::as_unit))
            .filter(|u| u.team == Team::Player && !u.is_destroyed())
            .map(|u| (u.position, u.stats.reveal_radius))
            .collect();
        let newly = self.fog.update_vision(&sights);
        for pos in newly {
            self.events.push(GameEvent::CellRevealed { pos });
        }
    }

    // ==== Snapshots ====

    /// Calculate a hash of the current session state.
    ///
    /// Used by the determinism harness. Two sessions with identical state
    /// produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.clock.count().hash(&mut hasher);
        self.ledger.balance().hash(&mut hasher);
        self.deck.draws().hash(&mut hasher);
        self.deck.hand().slots().hash(&mut hasher);

        self.grid.width().hash(&mut hasher);
        self.grid.height().hash(&mut hasher);
        for y in 0..self.grid.height() as i32 {
            for x in 0..self.grid.width() as i32 {
                let pos = GridPos::new(x, y);
                if let Some(cell) = self.grid.cell(pos) {
                    cell.state.hash(&mut hasher);
                    cell.occupant.hash(&mut hasher);
                }
                self.fog.is_revealed(pos).hash(&mut hasher);
            }
        }

        // Entities in deterministic order
        let ids = self.entities.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            match self.entities.get(id) {
                Some(Occupant::Unit(u)) => {
                    id.hash(&mut hasher);
                    u.team.hash(&mut hasher);
                    u.position.hash(&mut hasher);
                    u.facing.hash(&mut hasher);
                    u.current_hp.hash(&mut hasher);
                    u.stats.hash(&mut hasher);
                }
                Some(Occupant::Resource(r)) => {
                    id.hash(&mut hasher);
                    r.anchor.hash(&mut hasher);
                    r.tier.hash(&mut hasher);
                    r.current_hp.hash(&mut hasher);
                }
                None => {}
            }
        }

        self.subscribers.hash(&mut hasher);
        self.director.phase().hash(&mut hasher);
        self.director.outcome().hash(&mut hasher);
        self.director.current_wave().hash(&mut hasher);
        self.director.downtime_remaining().hash(&mut hasher);
        self.director.upcoming().len().hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the session for snapshot testing.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize session: {e}")))
    }

    /// Deserialize a session from snapshot bytes. The event buffer comes
    /// back empty.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize session: {e}")))
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        for y in 0..self.grid.height() as i32 {
            for x in 0..self.grid.width() as i32 {
                let pos = GridPos::new(x, y);
                let Some(cell) = self.grid.cell(pos) else { continue };
                match cell.occupant {
                    None => assert!(cell.is_empty(), "occupant-less cell {pos} has state {:?}", cell.state),
                    Some(id) => {
                        let occupant = self.entities.get(id);
                        assert!(occupant.is_some(), "cell {pos} points at missing entity {id}");
                        if let Some(occupant) = occupant {
                            assert_eq!(
                                occupant.cell_state(),
                                cell.state,
                                "cell {pos} state disagrees with entity {id}"
                            );
                        }
                    }
                }
                if self.fog.is_visible(pos) {
                    assert!(self.fog.is_revealed(pos), "visible cell {pos} is not revealed");
                }
            }
        }
        for id in self.entities.sorted_ids() {
            if let Some(occupant) = self.entities.get(id) {
                for cell in occupant.cells() {
                    assert_eq!(
                        self.grid.cell_occupant(cell),
                        Some(id),
                        "entity {id} cell {cell} is not registered to it"
                    );
                }
            }
        }
    }
}
