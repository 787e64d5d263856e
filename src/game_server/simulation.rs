//! Simulation - Main game server and loop
//!
//! Owns the race and the typing challenge, advances them each tick,
//! routes keystrokes to the player, and provides the interface for
//! Tauri commands.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::game_server::config::GameConfig;
use crate::game_server::error::ConfigError;
use crate::game_server::race::{RaceCoordinator, RaceResult, RaceSnapshot, RaceStatus};
use crate::game_server::typing::{KeyOutcome, TypingChallenge, TypingSnapshot};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Idle,
    Ready,
    Racing,
    Results,
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub tick_rate: f32,
    pub avg_tick_time_ms: f32,
    pub competitor_count: u32,
    pub game_state: GameState,
    pub accuracy: f32,
}

/// Everything the presentation layer draws in one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub state: GameState,
    pub race: RaceSnapshot,
    pub typing: TypingSnapshot,
}

/// Main game server
pub struct GameServer {
    /// Current game state
    state: GameState,
    /// Active race (if any)
    race: Option<RaceCoordinator>,
    /// Typing challenge driving the player
    typing: Option<TypingChallenge>,
    /// Target tick rate (ticks per second)
    tick_rate: f32,
    /// Last tick timestamp
    last_tick: Instant,
    /// Recent tick durations for averaging
    tick_times: Vec<f32>,
    /// Whether the simulation is advancing
    running: bool,
}

impl GameServer {
    /// Create a new game server
    pub fn new() -> Self {
        Self {
            state: GameState::Idle,
            race: None,
            typing: None,
            tick_rate: 60.0,
            last_tick: Instant::now(),
            tick_times: Vec::with_capacity(60),
            running: false,
        }
    }

    /// Initialize a new race with given config
    pub fn init_race(&mut self, config: GameConfig) -> Result<(), ConfigError> {
        let race = RaceCoordinator::new(config.race)?;
        let typing = TypingChallenge::new(config.typing)?;
        self.install(race, typing);
        Ok(())
    }

    /// Initialize with reproducible pacer and prompt randomness
    pub fn init_race_seeded(&mut self, config: GameConfig, seed: u64) -> Result<(), ConfigError> {
        let race = RaceCoordinator::with_seed(config.race, seed)?;
        let typing = TypingChallenge::with_seed(config.typing, seed.wrapping_add(1))?;
        self.install(race, typing);
        Ok(())
    }

    fn install(&mut self, race: RaceCoordinator, typing: TypingChallenge) {
        log::info!(
            "Race initialized: {} competitors over {}m",
            race.competitors().len(),
            race.config().distance
        );
        self.race = Some(race);
        self.typing = Some(typing);
        self.state = GameState::Ready;
        self.running = false;
        self.tick_times.clear();
    }

    /// Start ticking a ready race
    pub fn start_race(&mut self) {
        if self.race.is_none() {
            log::warn!("start_race called before init_race");
            return;
        }
        if self.state == GameState::Results {
            self.restart();
            return;
        }
        self.state = GameState::Racing;
        self.running = true;
        self.last_tick = Instant::now();
        log::info!("Race started");
    }

    /// Start/restart signal: back to the grid and go again
    pub fn restart(&mut self) {
        let (Some(race), Some(typing)) = (&mut self.race, &mut self.typing) else {
            log::warn!("restart called before init_race");
            return;
        };
        race.reset();
        typing.reset();
        self.state = GameState::Racing;
        self.running = true;
        self.last_tick = Instant::now();
        log::info!("Race restarted");
    }

    /// Perform a single simulation tick using wall-clock time
    pub fn tick(&mut self) -> Option<GameSnapshot> {
        if !self.running {
            return self.get_snapshot();
        }

        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        // Track tick timing
        let tick_start = Instant::now();
        let snapshot = self.step(delta);

        let tick_time = tick_start.elapsed().as_secs_f32() * 1000.0;
        self.tick_times.push(tick_time);
        if self.tick_times.len() > 60 {
            self.tick_times.remove(0);
        }

        snapshot
    }

    /// Advance the simulation by `delta` seconds
    pub fn step(&mut self, delta: f32) -> Option<GameSnapshot> {
        if self.running {
            if let (Some(race), Some(typing)) = (&mut self.race, &mut self.typing) {
                race.tick(delta);
                typing.update(delta);

                if race.status() == RaceStatus::Finished {
                    self.state = GameState::Results;
                    self.running = false;
                }
            }
        }
        self.get_snapshot()
    }

    /// Route a keystroke to the typing challenge while racing
    pub fn submit_key(&mut self, key: char) -> Option<KeyOutcome> {
        if self.state != GameState::Racing || !self.running {
            log::warn!("Ignoring key {:?} while {:?}", key, self.state);
            return None;
        }

        let (Some(race), Some(typing)) = (&mut self.race, &mut self.typing) else {
            return None;
        };
        let player = race.player_mut()?;
        let outcome = typing.submit_key(key, player);
        log::debug!("Key {:?} -> {:?}", key, outcome);
        Some(outcome)
    }

    /// Get current snapshot
    pub fn get_snapshot(&self) -> Option<GameSnapshot> {
        let race = self.race.as_ref()?;
        let typing = self.typing.as_ref()?;
        Some(GameSnapshot {
            state: self.state,
            race: race.get_snapshot(),
            typing: typing.snapshot(),
        })
    }

    /// Get final standings, `None` until the race finishes
    pub fn get_results(&self) -> Option<Vec<RaceResult>> {
        self.race
            .as_ref()
            .filter(|race| race.is_finished())
            .map(|race| race.results().to_vec())
    }

    /// Get server statistics
    pub fn get_stats(&self) -> ServerStats {
        let avg_tick_time = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        ServerStats {
            tick_rate: self.tick_rate,
            avg_tick_time_ms: avg_tick_time,
            competitor_count: self
                .race
                .as_ref()
                .map(|r| r.competitors().len() as u32)
                .unwrap_or(0),
            game_state: self.state,
            accuracy: self.typing.as_ref().map(|t| t.accuracy()).unwrap_or(1.0),
        }
    }

    /// Get current game state
    pub fn get_state(&self) -> GameState {
        self.state
    }

    /// Reset to idle state
    pub fn reset(&mut self) {
        self.state = GameState::Idle;
        self.race = None;
        self.typing = None;
        self.running = false;
        self.tick_times.clear();
    }

    /// Pause the simulation
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Resume the simulation
    pub fn resume(&mut self) {
        if self.state == GameState::Racing {
            self.running = true;
            self.last_tick = Instant::now();
        }
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_server::typing::TypingConfig;

    fn config(prompt: &str) -> GameConfig {
        GameConfig {
            typing: TypingConfig {
                prompts: vec![prompt.to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn ready_server(prompt: &str) -> GameServer {
        let mut server = GameServer::new();
        server.init_race_seeded(config(prompt), 5).unwrap();
        server
    }

    #[test]
    fn lifecycle_moves_through_states() {
        let mut server = GameServer::new();
        assert_eq!(server.get_state(), GameState::Idle);
        assert!(server.get_snapshot().is_none());

        server.init_race_seeded(config("hola"), 1).unwrap();
        assert_eq!(server.get_state(), GameState::Ready);

        server.start_race();
        assert_eq!(server.get_state(), GameState::Racing);
        assert!(server.is_running());

        server.reset();
        assert_eq!(server.get_state(), GameState::Idle);
        assert!(server.get_snapshot().is_none());
    }

    #[test]
    fn keys_are_ignored_until_racing() {
        let mut server = ready_server("hola");
        assert_eq!(server.submit_key('h'), None);

        server.start_race();
        assert!(matches!(
            server.submit_key('h'),
            Some(KeyOutcome::Matched { .. })
        ));
    }

    #[test]
    fn typed_keys_speed_up_the_player() {
        let mut server = ready_server("hola");
        server.start_race();

        for key in "hola".chars() {
            server.submit_key(key);
        }

        let snapshot = server.get_snapshot().unwrap();
        let player = &snapshot.race.competitors[0];
        // 2.5 + 2.5 + 5 + 5
        assert!((player.speed - 15.0).abs() < 1e-4);
        assert!(snapshot.typing.waiting_for_prompt);
        assert_eq!(snapshot.typing.window.percent_complete, 100);
    }

    #[test]
    fn step_advances_prompt_timer() {
        let mut server = ready_server("ab");
        server.start_race();
        server.submit_key('a');
        server.submit_key('b');

        let snapshot = server.step(1.0).unwrap();

        assert!(!snapshot.typing.waiting_for_prompt);
        assert_eq!(snapshot.typing.window.percent_complete, 0);
    }

    #[test]
    fn paused_server_does_not_advance() {
        let mut server = ready_server("hola");
        server.start_race();
        server.pause();

        let snapshot = server.step(1.0).unwrap();
        assert_eq!(snapshot.race.elapsed_time, 0.0);
        assert_eq!(server.submit_key('h'), None);

        server.resume();
        let snapshot = server.step(1.0).unwrap();
        assert_eq!(snapshot.race.elapsed_time, 1.0);
    }

    #[test]
    fn init_rejects_invalid_config() {
        let mut server = GameServer::new();
        let mut bad = config("hola");
        bad.race.distance = 0.0;

        assert!(server.init_race(bad).is_err());
        assert_eq!(server.get_state(), GameState::Idle);

        let mut crowded = config("hola");
        crowded.race.pacer_count = u32::MAX;
        assert!(matches!(
            server.init_race(crowded),
            Err(ConfigError::TooManyPacers { .. })
        ));

        let mut no_prompts = config("hola");
        no_prompts.typing.prompts.clear();
        assert!(matches!(
            server.init_race_seeded(no_prompts, 1),
            Err(ConfigError::EmptyCorpus)
        ));
        assert_eq!(server.get_state(), GameState::Idle);
    }

    #[test]
    fn step_ignores_non_finite_delta() {
        let mut server = ready_server("hola");
        server.start_race();
        server.submit_key('h');

        let snapshot = server.step(f32::INFINITY).unwrap();

        assert_eq!(snapshot.state, GameState::Racing);
        assert_eq!(snapshot.race.elapsed_time, 0.0);
        assert!(snapshot.race.competitors.iter().all(|c| c.distance == 0.0));
        assert_eq!(snapshot.race.competitors[0].speed, 2.5);
    }

    #[test]
    fn stats_report_competitors_and_accuracy() {
        let mut server = ready_server("hola");
        server.start_race();
        server.submit_key('h');
        server.submit_key('x');

        let stats = server.get_stats();
        assert_eq!(stats.competitor_count, 4);
        assert_eq!(stats.game_state, GameState::Racing);
        assert!((stats.accuracy - 0.5).abs() < 1e-6);
    }
}
