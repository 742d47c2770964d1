//! Test fixtures and helpers.
//!
//! Pre-built session configurations and fixed-point shorthand
//! for consistent testing.

use std::time::Duration;

use fixed::types::I32F32;
use palisade_core::session::{Session, SessionConfig};
use palisade_core::waves::WaveData;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// The standard config with a short opening downtime, so tests reach the
/// first wave quickly.
#[must_use]
pub fn quick_start_config(seed: u64) -> SessionConfig {
    let mut config = SessionConfig::standard(seed);
    config.downtime.initial = Duration::from_secs(2);
    config
}

/// A config whose waves never come, for tests that only exercise the
/// tick/deploy side.
#[must_use]
pub fn peaceful_config(seed: u64) -> SessionConfig {
    let mut config = SessionConfig::standard(seed);
    config.downtime.initial = Duration::from_secs(100_000);
    config
}

/// A one-wave config with the given spawn code.
///
/// # Panics
///
/// Panics if `code` is not a valid spawn code (test setup error).
#[must_use]
pub fn single_wave_config(seed: u64, code: &str) -> SessionConfig {
    let mut config = quick_start_config(seed);
    config.waves = vec![WaveData {
        number: 1,
        spawn_code: code.parse().unwrap(),
        peace_period: None,
    }];
    config
}

/// Build a session from the standard config.
///
/// # Panics
///
/// Panics if the standard config fails validation (test setup error).
#[must_use]
pub fn standard_session(seed: u64) -> Session {
    Session::new(SessionConfig::standard(seed)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), I32F32::from_num(3));
        assert_eq!(fixed_f(1.5), I32F32::from_num(1.5));
    }

    #[test]
    fn test_fixture_configs_validate() {
        assert!(quick_start_config(1).validate().is_ok());
        assert!(peaceful_config(1).validate().is_ok());
        assert!(single_wave_config(1, "112").validate().is_ok());
    }
}
