//! Game Server Module
//!
//! Race-state coordination for the typing racer: competitors, the
//! typing challenge that drives the player, and the coordinator that
//! ranks everyone and detects the finish. Rendering and audio live in
//! the frontend and talk to this module via Tauri commands.

pub mod competitor;
pub mod config;
pub mod error;
pub mod race;
pub mod simulation;
pub mod typing;

pub use competitor::{Accelerate, Competitor, CompetitorRole, PacerConfig, PlayerConfig};
pub use config::GameConfig;
pub use error::ConfigError;
pub use race::{RaceConfig, RaceCoordinator, RaceResult, RaceStatus};
pub use simulation::{GameServer, GameSnapshot, GameState};
pub use typing::{KeyOutcome, PromptWindow, TypingChallenge, TypingConfig};
