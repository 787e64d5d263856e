//! Error - Configuration failures reported once at race setup
//!
//! The simulation itself is total; only building a race from a
//! configuration can fail.

/// Errors raised while validating or parsing a [`GameConfig`](super::config::GameConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Race distance must be positive, got {0}")]
    NonPositiveDistance(f32),

    #[error("Too many pacers: {count} (at most {max})")]
    TooManyPacers { count: u32, max: u32 },

    #[error("Max speed for {who} must be positive, got {value}")]
    NonPositiveMaxSpeed { who: &'static str, value: f32 },

    #[error("Invalid value for {field}: {value}")]
    InvalidParameter { field: &'static str, value: f32 },

    #[error("Bonus multiplier must be at least 1, got {0}")]
    BonusMultiplierTooSmall(f32),

    #[error("Prompt corpus is empty")]
    EmptyCorpus,

    #[error("Prompt {0} in the corpus is empty")]
    EmptyPrompt(usize),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
