//! Config - Tuning constants for a race session
//!
//! Fixed when a race is initialized. Every field has a default, so a
//! JSON document only needs the values it changes.

use serde::{Deserialize, Serialize};

use crate::game_server::error::ConfigError;
use crate::game_server::race::RaceConfig;
use crate::game_server::typing::TypingConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub race: RaceConfig,
    pub typing: TypingConfig,
}

impl GameConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.race.validate()?;
        self.typing.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let config = GameConfig::from_json(
            r#"{ "race": { "distance": 400, "pacer": { "max_speed": 150 } },
                 "typing": { "prompts": ["hola"] } }"#,
        )
        .unwrap();

        assert_eq!(config.race.distance, 400.0);
        assert_eq!(config.race.pacer_count, 3);
        assert_eq!(config.race.pacer.max_speed, 150.0);
        assert_eq!(config.race.pacer.base_acceleration, 15.0);
        assert_eq!(config.race.player.max_speed, 200.0);
        assert_eq!(config.typing.prompts, vec!["hola".to_string()]);
        assert_eq!(config.typing.bonus_threshold, 3);
    }

    #[test]
    fn empty_document_is_the_default_game() {
        let config = GameConfig::from_json("{}").unwrap();
        assert_eq!(config.race.distance, 1000.0);
        assert_eq!(config.typing.prompts.len(), 20);
    }

    #[test]
    fn invalid_values_are_rejected_up_front() {
        let err = GameConfig::from_json(r#"{ "race": { "distance": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveDistance(_)));

        let err = GameConfig::from_json(r#"{ "typing": { "prompts": [] } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCorpus));

        let err = GameConfig::from_json(r#"{ "typing": { "bonus_multiplier": 0.5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::BonusMultiplierTooSmall(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json("{ race: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Failed to parse config"));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = GameConfig::default();
        let raw = serde_json::to_string(&config).unwrap();
        let parsed = GameConfig::from_json(&raw).unwrap();
        assert_eq!(parsed.typing.prompts, config.typing.prompts);
        assert_eq!(parsed.race.pacer.brake_chance, config.race.pacer.brake_chance);
    }
}
