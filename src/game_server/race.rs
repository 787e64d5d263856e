//! Race - Race configuration and coordination
//!
//! Owns every competitor, ranks them by distance each tick, and
//! detects the finish.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::game_server::competitor::{
    usable_delta, Competitor, CompetitorRole, CompetitorSnapshot, PacerConfig, PlayerConfig,
};
use crate::game_server::error::ConfigError;

/// Largest pacer field a race accepts
pub const MAX_PACERS: u32 = 16;

/// Race configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Total race distance in meters
    pub distance: f32,
    /// Number of scripted pacers racing the player
    pub pacer_count: u32,
    pub player: PlayerConfig,
    pub pacer: PacerConfig,
    /// Lateral gap between pacers on the grid
    pub pacer_spacing: f32,
    /// Pacers line up this far along the track from the player
    pub pacer_start_offset: f32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            distance: 1000.0,
            pacer_count: 3,
            player: PlayerConfig::default(),
            pacer: PacerConfig::default(),
            pacer_spacing: 1.0,
            pacer_start_offset: -5.0,
        }
    }
}

impl RaceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.distance.is_finite() || self.distance <= 0.0 {
            return Err(ConfigError::NonPositiveDistance(self.distance));
        }
        if self.pacer_count > MAX_PACERS {
            return Err(ConfigError::TooManyPacers {
                count: self.pacer_count,
                max: MAX_PACERS,
            });
        }
        if !self.player.max_speed.is_finite() || self.player.max_speed <= 0.0 {
            return Err(ConfigError::NonPositiveMaxSpeed {
                who: "player",
                value: self.player.max_speed,
            });
        }
        if !self.pacer.max_speed.is_finite() || self.pacer.max_speed <= 0.0 {
            return Err(ConfigError::NonPositiveMaxSpeed {
                who: "pacer",
                value: self.pacer.max_speed,
            });
        }

        let non_negative = [
            ("player.deceleration", self.player.deceleration),
            ("pacer.base_acceleration", self.pacer.base_acceleration),
            ("pacer.acceleration_variance", self.pacer.acceleration_variance),
            ("pacer.catch_up_factor", self.pacer.catch_up_factor),
            ("pacer.leader_jitter", self.pacer.leader_jitter),
            ("pacer.brake_rate", self.pacer.brake_rate),
            ("pacer.brake_reference_hz", self.pacer.brake_reference_hz),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidParameter { field, value });
            }
        }

        if !self.pacer.decision_interval.is_finite() || self.pacer.decision_interval <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                field: "pacer.decision_interval",
                value: self.pacer.decision_interval,
            });
        }
        if !(0.0..=1.0).contains(&self.pacer.brake_chance) {
            return Err(ConfigError::InvalidParameter {
                field: "pacer.brake_chance",
                value: self.pacer.brake_chance,
            });
        }
        Ok(())
    }
}

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    Running,
    Finished,
}

/// Final placing of one competitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceResult {
    pub competitor_id: u32,
    pub name: String,
    pub role: CompetitorRole,
    pub position: u32,
    pub distance: f32,
}

/// Race state: competitors, standings and finish detection
#[derive(Debug, Clone)]
pub struct RaceCoordinator {
    config: RaceConfig,
    status: RaceStatus,
    /// Player first, then pacers, in insertion order
    competitors: Vec<Competitor>,
    /// Competitor indices, leader first
    standings: Vec<usize>,
    player_rank: u32,
    /// Simulated seconds since the start
    elapsed_time: f32,
    /// Frozen when the race finishes
    final_standings: Vec<RaceResult>,
    rng: StdRng,
}

impl RaceCoordinator {
    /// Create a race with a fresh grid
    pub fn new(config: RaceConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with reproducible pacer behavior
    pub fn with_seed(config: RaceConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RaceConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let competitors = Self::build_grid(&config);
        let mut race = Self {
            config,
            status: RaceStatus::Running,
            competitors,
            standings: Vec::new(),
            player_rank: 1,
            elapsed_time: 0.0,
            final_standings: Vec::new(),
            rng,
        };
        race.rank_competitors();
        Ok(race)
    }

    /// Player in the center lane, pacers spread across the row behind
    fn build_grid(config: &RaceConfig) -> Vec<Competitor> {
        let mut grid = Vec::with_capacity(config.pacer_count as usize + 1);
        grid.push(Competitor::player(0, "Player", &config.player, [0.0, 0.5, 0.0]));

        let center = (config.pacer_count.saturating_sub(1)) as f32 / 2.0;
        for i in 0..config.pacer_count {
            let lane = (i as f32 - center) * config.pacer_spacing;
            grid.push(Competitor::pacer(
                i + 1,
                format!("Pacer {}", i + 1),
                &config.pacer,
                [lane, 0.5, config.pacer_start_offset],
            ));
        }
        grid
    }

    /// Advance every competitor, then re-rank or finish
    pub fn tick(&mut self, delta: f32) {
        if self.status == RaceStatus::Finished {
            return;
        }
        let delta = usable_delta(delta);

        for competitor in &mut self.competitors {
            competitor.tick(delta, &mut self.rng);
        }
        self.elapsed_time += delta;

        if self.finish_reached() {
            self.finish();
        } else {
            self.rank_competitors();
        }
    }

    /// Player crossed the line, or every pacer did
    fn finish_reached(&self) -> bool {
        let target = self.config.distance;
        let player_done = self.player().distance() >= target;

        let mut pacers = self.competitors.iter().filter(|c| !c.is_player()).peekable();
        let pacers_done = pacers.peek().is_some() && pacers.all(|c| c.distance() >= target);

        player_done || pacers_done
    }

    fn finish(&mut self) {
        self.rank_competitors();
        self.status = RaceStatus::Finished;

        self.final_standings = self
            .standings
            .iter()
            .enumerate()
            .map(|(place, &index)| {
                let c = &self.competitors[index];
                RaceResult {
                    competitor_id: c.id(),
                    name: c.name().to_string(),
                    role: c.role(),
                    position: place as u32 + 1,
                    distance: c.distance(),
                }
            })
            .collect();

        log::info!(
            "Race finished after {:.1}s, player placed {}",
            self.elapsed_time,
            self.player_rank
        );
    }

    /// Stable sort by distance, farthest first; ties keep insertion order
    fn rank_competitors(&mut self) {
        let competitors = &self.competitors;
        let mut order: Vec<usize> = (0..competitors.len()).collect();
        order.sort_by(|&a, &b| {
            competitors[b]
                .distance()
                .partial_cmp(&competitors[a].distance())
                .unwrap_or(Ordering::Equal)
        });

        for (place, &index) in order.iter().enumerate() {
            let rank = place as u32 + 1;
            self.competitors[index].set_rank(rank);
            if self.competitors[index].is_player() {
                self.player_rank = rank;
            }
        }
        self.standings = order;
    }

    /// Back to the start line, running again
    pub fn reset(&mut self) {
        for competitor in &mut self.competitors {
            competitor.reset();
        }
        self.status = RaceStatus::Running;
        self.elapsed_time = 0.0;
        self.final_standings.clear();
        self.rank_competitors();
        log::info!("Race reset with {} competitors", self.competitors.len());
    }

    /// 1-based place of the player in the last ranking
    pub fn player_rank(&self) -> u32 {
        self.player_rank
    }

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == RaceStatus::Finished
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn player(&self) -> &Competitor {
        &self.competitors[0]
    }

    /// Mutable player access for input handlers; `None` once the race is over
    pub fn player_mut(&mut self) -> Option<&mut Competitor> {
        match self.status {
            RaceStatus::Running => self.competitors.first_mut(),
            RaceStatus::Finished => None,
        }
    }

    /// Final standings, empty until the race finishes
    pub fn results(&self) -> &[RaceResult] {
        &self.final_standings
    }

    /// Player distance as a fraction of the race, in [0, 1]
    pub fn player_progress(&self) -> f32 {
        (self.player().distance() / self.config.distance).clamp(0.0, 1.0)
    }

    /// Get current leader
    pub fn get_leader(&self) -> Option<&Competitor> {
        self.standings.first().map(|&index| &self.competitors[index])
    }

    /// Get competitor by ID
    pub fn get_competitor(&self, id: u32) -> Option<&Competitor> {
        self.competitors.iter().find(|c| c.id() == id)
    }

    /// Get compact snapshot for IPC transfer
    pub fn get_snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            status: self.status,
            elapsed_time: self.elapsed_time,
            race_distance: self.config.distance,
            player_rank: self.player_rank,
            player_progress: self.player_progress(),
            competitors: self.competitors.iter().map(CompetitorSnapshot::from).collect(),
        }
    }
}

/// Compact race snapshot for IPC transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub elapsed_time: f32,
    pub race_distance: f32,
    pub player_rank: u32,
    pub player_progress: f32,
    pub competitors: Vec<CompetitorSnapshot>,
}
