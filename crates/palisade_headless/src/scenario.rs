//! Scenario loading and configuration.
//!
//! Scenarios are declarative overrides on top of the standard session
//! config: grid size, token economy, wave schedule and the scripted
//! commander that plays the run. They keep RON files short and readable
//! while everything unspecified falls back to the standard preset.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use palisade_core::error::GameError;
use palisade_core::session::SessionConfig;
use palisade_core::waves::WaveData;

use crate::commander::CommanderPolicy;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario produced an invalid session config.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// One wave in a scenario's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveEntry {
    /// Wave number, 1-based.
    pub number: u32,
    /// Spawn code over the digits 0-3.
    pub code: String,
    /// Downtime before this wave, overriding the global schedule.
    #[serde(default)]
    pub peace_seconds: Option<u64>,
}

/// A complete scenario configuration.
///
/// Every `Option` field overrides the corresponding piece of
/// [`SessionConfig::standard`]; `None` keeps the standard value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Base RNG seed (batch runs offset from it).
    pub seed: u64,
    /// Grid dimensions (width, height) in cells.
    #[serde(default)]
    pub grid_size: Option<(u32, u32)>,
    /// Opening token balance.
    #[serde(default)]
    pub starting_tokens: Option<u32>,
    /// Hand slot count.
    #[serde(default)]
    pub hand_capacity: Option<usize>,
    /// Wave schedule override.
    #[serde(default)]
    pub waves: Option<Vec<WaveEntry>>,
    /// The scripted player for this run.
    pub commander: CommanderPolicy,
    /// Give up after this much simulated time.
    pub max_sim_seconds: u64,
    /// Frame size fed to the session each step.
    pub frame_millis: u64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::standard()
    }
}

impl Scenario {
    /// The standard eight-wave defense played by a greedy commander.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            description: "Standard eight-wave defense with a greedy commander".to_string(),
            seed: 0,
            grid_size: None,
            starting_tokens: None,
            hand_capacity: None,
            waves: None,
            commander: CommanderPolicy::Greedy,
            max_sim_seconds: 600,
            frame_millis: 250,
        }
    }

    /// Short downtimes and enemy-heavy codes; stresses the defeat path.
    #[must_use]
    pub fn rush() -> Self {
        Self {
            name: "rush".to_string(),
            description: "Compressed schedule of enemy-heavy waves".to_string(),
            seed: 0,
            grid_size: Some((10, 10)),
            starting_tokens: Some(10),
            hand_capacity: None,
            waves: Some(vec![
                WaveEntry { number: 1, code: "11".to_string(), peace_seconds: Some(4) },
                WaveEntry { number: 2, code: "111".to_string(), peace_seconds: Some(6) },
                WaveEntry { number: 3, code: "1113".to_string(), peace_seconds: Some(6) },
                WaveEntry { number: 4, code: "11131".to_string(), peace_seconds: Some(8) },
            ]),
            commander: CommanderPolicy::Greedy,
            max_sim_seconds: 300,
            frame_millis: 250,
        }
    }

    /// Resource-heavy waves played by a hoarding commander.
    #[must_use]
    pub fn gold_rush() -> Self {
        Self {
            name: "gold_rush".to_string(),
            description: "Resource-heavy waves with a reserve-keeping commander".to_string(),
            seed: 0,
            grid_size: None,
            starting_tokens: Some(16),
            hand_capacity: None,
            waves: Some(vec![
                WaveEntry { number: 1, code: "22".to_string(), peace_seconds: None },
                WaveEntry { number: 2, code: "2212".to_string(), peace_seconds: None },
                WaveEntry { number: 3, code: "12212".to_string(), peace_seconds: None },
                WaveEntry { number: 4, code: "122122".to_string(), peace_seconds: None },
            ]),
            commander: CommanderPolicy::Reserve { floor: 8 },
            max_sim_seconds: 600,
            frame_millis: 250,
        }
    }

    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Resolve a name to a builtin preset, or treat it as a file path.
    pub fn resolve(name: &str) -> Result<Self, ScenarioError> {
        match name {
            "standard" => Ok(Self::standard()),
            "rush" => Ok(Self::rush()),
            "gold_rush" => Ok(Self::gold_rush()),
            path => Self::load(path),
        }
    }

    /// Build the session config this scenario describes, seeded with
    /// `seed` (batch runners pass varying offsets of [`Scenario::seed`]).
    pub fn build_config(&self, seed: u64) -> Result<SessionConfig, ScenarioError> {
        let mut config = SessionConfig::standard(seed);
        if let Some((width, height)) = self.grid_size {
            config.grid_width = width;
            config.grid_height = height;
        }
        if let Some(tokens) = self.starting_tokens {
            config.starting_tokens = tokens;
        }
        if let Some(capacity) = self.hand_capacity {
            config.hand_capacity = capacity;
        }
        if let Some(entries) = &self.waves {
            let mut waves = Vec::with_capacity(entries.len());
            for entry in entries {
                waves.push(WaveData {
                    number: entry.number,
                    spawn_code: entry.code.parse()?,
                    peace_period: entry.peace_seconds.map(Duration::from_secs),
                });
            }
            config.waves = waves;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_build() {
        for name in ["standard", "rush", "gold_rush"] {
            let scenario = Scenario::resolve(name).unwrap();
            assert_eq!(scenario.name, name);
            let config = scenario.build_config(scenario.seed).unwrap();
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_overrides_apply() {
        let scenario = Scenario::rush();
        let config = scenario.build_config(7).unwrap();
        assert_eq!(config.grid_width, 10);
        assert_eq!(config.starting_tokens, 10);
        assert_eq!(config.waves.len(), 4);
        assert_eq!(config.waves[0].spawn_code.to_string(), "11");
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            Scenario(
                name: "Test",
                description: "Test scenario",
                seed: 3,
                grid_size: Some((6, 6)),
                waves: Some([
                    WaveEntry(number: 1, code: "12"),
                    WaveEntry(number: 2, code: "112", peace_seconds: Some(5)),
                ]),
                commander: Idle,
                max_sim_seconds: 120,
                frame_millis: 500,
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.name, "Test");
        let config = scenario.build_config(scenario.seed).unwrap();
        assert_eq!(config.grid_width, 6);
        assert_eq!(config.waves[1].peace_period, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_bad_spawn_code_is_rejected() {
        let mut scenario = Scenario::standard();
        scenario.waves = Some(vec![WaveEntry {
            number: 1,
            code: "1x2".to_string(),
            peace_seconds: None,
        }]);
        assert!(matches!(
            scenario.build_config(0),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file_error() {
        let err = Scenario::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ScenarioError::FileNotFound(_)));
    }

    #[test]
    fn test_shipped_scenario_files_build() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../scenarios");
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let scenario = Scenario::load(&path).unwrap();
            let config = scenario.build_config(scenario.seed).unwrap();
            assert!(config.validate().is_ok(), "{} must build", path.display());
        }
    }
}
