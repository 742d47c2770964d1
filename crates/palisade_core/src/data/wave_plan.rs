//! Wave plan parsing and the standard preset schedule.

use crate::error::{GameError, Result};
use crate::waves::WaveData;

/// Parse a RON wave list, e.g. from a scenario file:
///
/// ```ron
/// [
///     (number: 1, spawn_code: "1"),
///     (number: 2, spawn_code: "121"),
///     (number: 3, spawn_code: "11311", peace_period: Some((secs: 30, nanos: 0))),
/// ]
/// ```
pub fn parse_plan(text: &str) -> Result<Vec<WaveData>> {
    let waves: Vec<WaveData> = ron::from_str(text).map_err(|e| GameError::DataParseError {
        path: "<wave plan>".to_string(),
        message: e.to_string(),
    })?;
    validate_plan(&waves)?;
    Ok(waves)
}

/// Check numbering is 1-based and strictly ascending.
pub fn validate_plan(waves: &[WaveData]) -> Result<()> {
    for (i, wave) in waves.iter().enumerate() {
        let expected = i as u32 + 1;
        if wave.number != expected {
            return Err(GameError::InvalidConfig(format!(
                "wave at position {i} is numbered {}, expected {expected}",
                wave.number
            )));
        }
    }
    Ok(())
}

/// The standard eight-wave preset: enemies ramp up, resources appear from
/// wave 2, bosses close out waves 5 and 8.
#[must_use]
pub fn standard_plan() -> Vec<WaveData> {
    let codes = ["1", "121", "1121", "21121", "112113", "211211", "1121121", "11211213"];
    codes
        .iter()
        .enumerate()
        .map(|(i, code)| WaveData {
            number: i as u32 + 1,
            // Preset codes are all valid digits, so the parse cannot fail
            spawn_code: code.parse().unwrap_or_default(),
            peace_period: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_plan_is_valid() {
        let plan = standard_plan();
        assert_eq!(plan.len(), 8);
        assert!(validate_plan(&plan).is_ok());
        assert_eq!(plan[0].spawn_code.to_string(), "1");
        assert_eq!(plan[4].spawn_code.enemy_steps(), 5);
    }

    #[test]
    fn test_parse_plan_from_ron() {
        let text = r#"[
            (number: 1, spawn_code: "1"),
            (number: 2, spawn_code: "121"),
        ]"#;
        let plan = parse_plan(text).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].spawn_code.resource_steps(), 1);
        assert_eq!(plan[1].peace_period, None);
    }

    #[test]
    fn test_parse_plan_rejects_bad_numbering() {
        let text = r#"[
            (number: 1, spawn_code: "1"),
            (number: 3, spawn_code: "1"),
        ]"#;
        assert!(matches!(parse_plan(text), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_plan_rejects_bad_spawn_code() {
        let text = r#"[(number: 1, spawn_code: "17")]"#;
        assert!(matches!(parse_plan(text), Err(GameError::DataParseError { .. })));
    }
}
