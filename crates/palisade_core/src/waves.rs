//! Wave scheduling: spawn codes, downtime, and the phase state machine.
//!
//! The director is pure state: it consumes frame deltas and a live-enemy
//! count, and returns [`DirectorAction`]s for the session to execute. It
//! never touches the grid or storage itself, which keeps the machine
//! testable without a full session.
//!
//! # Spawn codes
//!
//! A wave's contents are a string over `{'0','1','2','3'}`, interpreted
//! left to right: skip, enemy, resource node, boss. The string form is an
//! external contract and round-trips verbatim through parse, `Display`,
//! and serde.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{GameError, Result};

/// One character of a spawn code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnStep {
    /// `'0'`: no spawn for this step.
    Skip,
    /// `'1'`: one enemy at a north-edge cell.
    Enemy,
    /// `'2'`: one resource node, biased toward fogged ground.
    Resource,
    /// `'3'`: one boss enemy at a north-edge cell.
    Boss,
}

impl SpawnStep {
    /// Decode one spawn-code character.
    #[must_use]
    pub const fn from_digit(c: char) -> Option<Self> {
        match c {
            '0' => Some(SpawnStep::Skip),
            '1' => Some(SpawnStep::Enemy),
            '2' => Some(SpawnStep::Resource),
            '3' => Some(SpawnStep::Boss),
            _ => None,
        }
    }

    /// The character this step encodes as.
    #[must_use]
    pub const fn digit(self) -> char {
        match self {
            SpawnStep::Skip => '0',
            SpawnStep::Enemy => '1',
            SpawnStep::Resource => '2',
            SpawnStep::Boss => '3',
        }
    }

    /// Whether this step spawns an enemy combatant.
    #[must_use]
    pub const fn is_enemy(self) -> bool {
        matches!(self, SpawnStep::Enemy | SpawnStep::Boss)
    }
}

/// Parsed spawn code. The original string is recoverable via `Display`.
/// The default code is empty and spawns nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SpawnCode {
    steps: Vec<SpawnStep>,
}

impl SpawnCode {
    /// Parse a code string, rejecting any character outside
    /// `{'0','1','2','3'}`.
    pub fn parse(code: &str) -> Result<Self> {
        let mut steps = Vec::with_capacity(code.len());
        for (position, c) in code.char_indices() {
            match SpawnStep::from_digit(c) {
                Some(step) => steps.push(step),
                None => {
                    return Err(GameError::InvalidSpawnCode {
                        code: code.to_string(),
                        found: c,
                        position,
                    })
                }
            }
        }
        Ok(Self { steps })
    }

    /// The decoded steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[SpawnStep] {
        &self.steps
    }

    /// Number of enemy-spawning steps (`'1'` and `'3'`).
    #[must_use]
    pub fn enemy_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_enemy()).count()
    }

    /// Number of resource steps (`'2'`).
    #[must_use]
    pub fn resource_steps(&self) -> usize {
        self.steps.iter().filter(|s| matches!(s, SpawnStep::Resource)).count()
    }

    /// Whether the code contains no steps at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for SpawnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step.digit())?;
        }
        Ok(())
    }
}

impl FromStr for SpawnCode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SpawnCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpawnCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// One scheduled wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveData {
    /// Wave number, 1-based, as shown to the player.
    pub number: u32,
    /// What this wave spawns.
    pub spawn_code: SpawnCode,
    /// Downtime before this wave begins, overriding the global schedule.
    #[serde(default)]
    pub peace_period: Option<Duration>,
}

/// Where the session is in the wave cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Downtime countdown before the next wave.
    Preparation,
    /// A wave's spawns are (or were) on the field.
    Active,
    /// Transient: the wave was just cleared. Resolves to `Preparation` or
    /// `GameOver` within the same update.
    Complete,
    /// Terminal. See [`WaveDirector::outcome`].
    GameOver,
}

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Every scheduled wave was cleared.
    Victory,
    /// The player ran out of units, hand, and draw money mid-wave.
    Defeat,
}

/// Global downtime schedule between waves. Per-wave peace periods
/// override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeSchedule {
    /// Countdown before the first wave.
    pub initial: Duration,
    /// Downtime between waves before shortening kicks in.
    pub base: Duration,
    /// Reduction per completed wave past `shorten_after`.
    pub step_down: Duration,
    /// Completed-wave count after which downtime starts shrinking.
    pub shorten_after: u32,
    /// Downtime never drops below this.
    pub floor: Duration,
}

impl Default for DowntimeSchedule {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(10),
            base: Duration::from_secs(20),
            step_down: Duration::from_secs(2),
            shorten_after: 5,
            floor: Duration::from_secs(8),
        }
    }
}

impl DowntimeSchedule {
    /// Downtime granted after clearing wave `completed_wave`.
    #[must_use]
    pub fn downtime_after(&self, completed_wave: u32) -> Duration {
        if completed_wave <= self.shorten_after {
            return self.base;
        }
        let steps = completed_wave - self.shorten_after;
        self.base.saturating_sub(self.step_down * steps).max(self.floor)
    }
}

/// What the session must do in response to a director update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorAction {
    /// The downtime countdown crossed the warn threshold.
    WarnWave {
        /// Number of the incoming wave.
        wave: u32,
    },
    /// Execute this wave's spawn code, then report back via
    /// [`WaveDirector::wave_activated`].
    ActivateWave(WaveData),
    /// The active wave was cleared.
    CompleteWave {
        /// Number of the cleared wave.
        wave: u32,
    },
    /// Downtime toward the next wave began.
    EnterPreparation {
        /// Length of the new countdown.
        downtime: Duration,
    },
    /// The final wave was cleared.
    DeclareVictory,
}

/// Wave phase state machine.
///
/// Drive it with [`WaveDirector::update`] once per frame (frame deltas,
/// not tick counts: downtime runs on wall time). After executing an
/// [`DirectorAction::ActivateWave`], the session must call
/// [`WaveDirector::wave_activated`]; completion is gated on that report so
/// a wave can never be cleared before its spawns hit the grid. A wave
/// whose code spawned no enemies (pure-resource waves, or every spawn cell
/// blocked) completes on the next update instead of stalling forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDirector {
    phase: WavePhase,
    outcome: Option<GameOutcome>,
    waves: Vec<WaveData>,
    next_index: usize,
    schedule: DowntimeSchedule,
    warn_threshold: Duration,
    countdown: Duration,
    warned: bool,
    current_wave: Option<u32>,
    enemies_spawned: u32,
    activation_recorded: bool,
}

impl WaveDirector {
    /// Director in `Preparation` counting down the schedule's initial
    /// downtime toward the first wave.
    #[must_use]
    pub fn new(waves: Vec<WaveData>, schedule: DowntimeSchedule, warn_threshold: Duration) -> Self {
        Self {
            phase: WavePhase::Preparation,
            outcome: None,
            waves,
            next_index: 0,
            schedule,
            warn_threshold,
            countdown: schedule.initial,
            warned: false,
            current_wave: None,
            enemies_spawned: 0,
            activation_recorded: false,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Final outcome, once `GameOver`.
    #[must_use]
    pub const fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Whether the machine reached its terminal phase.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase == WavePhase::GameOver
    }

    /// Number of the active (or most recently activated) wave.
    #[must_use]
    pub const fn current_wave(&self) -> Option<u32> {
        self.current_wave
    }

    /// Remaining downtime while in `Preparation`.
    #[must_use]
    pub fn downtime_remaining(&self) -> Option<Duration> {
        match self.phase {
            WavePhase::Preparation => Some(self.countdown),
            _ => None,
        }
    }

    /// Waves not yet activated, in schedule order.
    #[must_use]
    pub fn upcoming(&self) -> &[WaveData] {
        &self.waves[self.next_index.min(self.waves.len())..]
    }

    /// Enemies the current wave actually put on the grid.
    #[must_use]
    pub const fn enemies_spawned(&self) -> u32 {
        self.enemies_spawned
    }

    /// Record the result of executing the activated wave's spawn code.
    pub fn wave_activated(&mut self, enemies_spawned: u32) {
        self.enemies_spawned = enemies_spawned;
        self.activation_recorded = true;
    }

    /// Force the terminal defeat state. Returns `true` if this call ended
    /// the game (idempotent afterwards).
    pub fn declare_defeat(&mut self) -> bool {
        if self.phase == WavePhase::GameOver {
            return false;
        }
        self.phase = WavePhase::GameOver;
        self.outcome = Some(GameOutcome::Defeat);
        true
    }

    /// Advance the machine by one frame.
    ///
    /// `live_enemy_cells` is the current count of enemy-occupied grid
    /// cells. Returns the actions the session must execute, in order.
    pub fn update(&mut self, dt: Duration, live_enemy_cells: usize) -> Vec<DirectorAction> {
        match self.phase {
            WavePhase::GameOver => Vec::new(),
            WavePhase::Preparation => self.update_preparation(dt),
            WavePhase::Active => {
                if self.activation_recorded && live_enemy_cells == 0 {
                    self.resolve_complete()
                } else {
                    Vec::new()
                }
            }
            // Complete is transient; resolve it if a snapshot restored here
            WavePhase::Complete => self.resolve_complete(),
        }
    }

    fn update_preparation(&mut self, dt: Duration) -> Vec<DirectorAction> {
        let mut actions = Vec::new();
        let Some(wave) = self.waves.get(self.next_index) else {
            // Empty schedule: nothing left to fight
            self.phase = WavePhase::GameOver;
            self.outcome = Some(GameOutcome::Victory);
            actions.push(DirectorAction::DeclareVictory);
            return actions;
        };
        let wave_number = wave.number;
        self.countdown = self.countdown.saturating_sub(dt);
        if !self.warned && self.countdown <= self.warn_threshold {
            self.warned = true;
            actions.push(DirectorAction::WarnWave { wave: wave_number });
        }
        if self.countdown.is_zero() {
            self.phase = WavePhase::Active;
            self.current_wave = Some(wave_number);
            self.enemies_spawned = 0;
            self.activation_recorded = false;
            actions.push(DirectorAction::ActivateWave(wave.clone()));
            self.next_index += 1;
        }
        actions
    }

    fn resolve_complete(&mut self) -> Vec<DirectorAction> {
        let cleared = self.current_wave.unwrap_or(0);
        self.phase = WavePhase::Complete;
        let mut actions = vec![DirectorAction::CompleteWave { wave: cleared }];
        if self.next_index >= self.waves.len() {
            self.phase = WavePhase::GameOver;
            self.outcome = Some(GameOutcome::Victory);
            actions.push(DirectorAction::DeclareVictory);
        } else {
            self.countdown = self.waves[self.next_index]
                .peace_period
                .unwrap_or_else(|| self.schedule.downtime_after(cleared));
            self.warned = false;
            self.phase = WavePhase::Preparation;
            actions.push(DirectorAction::EnterPreparation {
                downtime: self.countdown,
            });
        }
        actions
    }
}
