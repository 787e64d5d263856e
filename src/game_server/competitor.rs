//! Competitor - Individual racer state and behavior
//!
//! Each competitor has speed (km/h), distance along the race (meters),
//! and a rank assigned by the coordinator. The player coasts down
//! between typing impulses; pacers follow a catch-up policy that is
//! re-evaluated on a fixed cadence.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// km/h to m/s
const KMH_PER_MS: f32 = 3.6;

/// Tick length usable by the integrators: negative or non-finite deltas count as zero.
pub fn usable_delta(delta: f32) -> f32 {
    if delta.is_finite() {
        delta.max(0.0)
    } else {
        0.0
    }
}

/// Anything that can receive a forward speed impulse.
pub trait Accelerate {
    /// Increase speed by `amount` km/h immediately.
    fn apply_acceleration(&mut self, amount: f32);
}

/// Player tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Top speed (km/h)
    pub max_speed: f32,
    /// Natural slowdown (km/h per second)
    pub deceleration: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_speed: 200.0,
            deceleration: 20.0,
        }
    }
}

/// Pacer tuning and catch-up policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacerConfig {
    /// Top speed (km/h), slightly below the player's
    pub max_speed: f32,
    /// Impulse applied on each decision while trailing (km/h)
    pub base_acceleration: f32,
    /// Upper bound of the random extra impulse (km/h)
    pub acceleration_variance: f32,
    /// Extra impulse per place behind the leader (km/h)
    pub catch_up_factor: f32,
    /// Symmetric speed jitter applied while leading (km/h)
    pub leader_jitter: f32,
    /// Seconds of simulated time between decisions
    pub decision_interval: f32,
    /// Chance to brake per frame at `brake_reference_hz` while leading
    pub brake_chance: f32,
    /// Frame rate the brake chance was tuned against
    pub brake_reference_hz: f32,
    /// Braking strength (km/h per second)
    pub brake_rate: f32,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            max_speed: 180.0,
            base_acceleration: 15.0,
            acceleration_variance: 5.0,
            catch_up_factor: 2.0,
            leader_jitter: 5.0,
            decision_interval: 0.5,
            brake_chance: 0.2,
            brake_reference_hz: 60.0,
            brake_rate: 5.0,
        }
    }
}

impl PacerConfig {
    /// Speed change for one policy decision.
    ///
    /// The leader wanders by up to `leader_jitter` either way. Everyone
    /// else pushes forward, harder the further back they sit. An
    /// unranked pacer gets no catch-up bonus.
    pub fn decision_impulse<R: Rng + ?Sized>(&self, rank: Option<u32>, rng: &mut R) -> f32 {
        match rank {
            Some(1) => (rng.gen::<f32>() * 2.0 - 1.0) * self.leader_jitter,
            rank => {
                let places_behind = rank.map_or(0, |r| r.saturating_sub(1));
                self.base_acceleration
                    + places_behind as f32 * self.catch_up_factor
                    + rng.gen::<f32>() * self.acceleration_variance
            }
        }
    }

    /// Probability that a leading pacer brakes during a tick of `delta` seconds.
    ///
    /// Scaled so a tick at `brake_reference_hz` sees exactly `brake_chance`.
    pub fn brake_probability(&self, delta: f32) -> f32 {
        if self.brake_chance <= 0.0 || delta <= 0.0 {
            return 0.0;
        }
        let frames = delta * self.brake_reference_hz;
        1.0 - (1.0 - self.brake_chance.min(1.0)).powf(frames)
    }
}

/// Who is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitorRole {
    Player,
    Pacer,
}

/// Per-tick speed source
#[derive(Debug, Clone)]
enum Drive {
    Coast { deceleration: f32 },
    Pacer { policy: PacerConfig, since_decision: f32 },
}

/// Complete state for a single competitor
#[derive(Debug, Clone)]
pub struct Competitor {
    id: u32,
    name: String,
    role: CompetitorRole,
    drive: Drive,
    max_speed: f32,
    /// Current speed (km/h), within [0, max_speed]
    speed: f32,
    /// Distance traveled (meters), never decreases
    distance: f32,
    /// 1-based place, assigned by the coordinator
    rank: Option<u32>,
    world_position: [f32; 3],
    start_position: [f32; 3],
}

impl Competitor {
    /// Create the typing-driven player
    pub fn player(id: u32, name: impl Into<String>, config: &PlayerConfig, start: [f32; 3]) -> Self {
        Self::new(
            id,
            name.into(),
            CompetitorRole::Player,
            Drive::Coast {
                deceleration: config.deceleration,
            },
            config.max_speed,
            start,
        )
    }

    /// Create a scripted pacer
    pub fn pacer(id: u32, name: impl Into<String>, config: &PacerConfig, start: [f32; 3]) -> Self {
        Self::new(
            id,
            name.into(),
            CompetitorRole::Pacer,
            Drive::Pacer {
                policy: config.clone(),
                since_decision: 0.0,
            },
            config.max_speed,
            start,
        )
    }

    fn new(
        id: u32,
        name: String,
        role: CompetitorRole,
        drive: Drive,
        max_speed: f32,
        start: [f32; 3],
    ) -> Self {
        Self {
            id,
            name,
            role,
            drive,
            max_speed,
            speed: 0.0,
            distance: 0.0,
            rank: None,
            world_position: start,
            start_position: start,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> CompetitorRole {
        self.role
    }

    pub fn is_player(&self) -> bool {
        self.role == CompetitorRole::Player
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn rank(&self) -> Option<u32> {
        self.rank
    }

    pub fn world_position(&self) -> [f32; 3] {
        self.world_position
    }

    /// Record this competitor's place in the race
    pub fn set_rank(&mut self, rank: u32) {
        self.rank = Some(rank);
    }

    /// Place the competitor in the 3D scene
    pub fn set_world_position(&mut self, position: [f32; 3]) {
        self.world_position = position;
    }

    /// Advance one simulation tick of `delta` seconds
    pub fn tick<R: Rng + ?Sized>(&mut self, delta: f32, rng: &mut R) {
        let delta = usable_delta(delta);

        match &mut self.drive {
            Drive::Coast { deceleration } => {
                self.speed -= *deceleration * delta;
            }
            Drive::Pacer {
                policy,
                since_decision,
            } => {
                *since_decision += delta;
                if *since_decision >= policy.decision_interval {
                    *since_decision = 0.0;
                    let impulse = policy.decision_impulse(self.rank, rng);
                    log::debug!("{} decides {:+.1} km/h (rank {:?})", self.name, impulse, self.rank);
                    self.speed += impulse;
                }

                if self.rank == Some(1) && rng.gen::<f32>() < policy.brake_probability(delta) {
                    self.speed -= policy.brake_rate * delta;
                }
            }
        }

        self.speed = self.speed.clamp(0.0, self.max_speed);

        let distance_delta = self.speed / KMH_PER_MS * delta;
        self.distance += distance_delta;
        self.world_position[2] += distance_delta;
    }

    /// Back to the grid: stopped, unranked, at the starting offset
    pub fn reset(&mut self) {
        self.speed = 0.0;
        self.distance = 0.0;
        self.rank = None;
        self.world_position = self.start_position;
        if let Drive::Pacer { since_decision, .. } = &mut self.drive {
            *since_decision = 0.0;
        }
    }

    #[cfg(test)]
    pub(crate) fn place_at(&mut self, distance: f32) {
        self.distance = distance;
    }
}

impl Accelerate for Competitor {
    fn apply_acceleration(&mut self, amount: f32) {
        if amount.is_nan() || amount <= 0.0 {
            return;
        }
        self.speed = (self.speed + amount).min(self.max_speed);
    }
}

/// Compact competitor state for IPC transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorSnapshot {
    pub id: u32,
    pub name: String,
    pub role: CompetitorRole,
    pub speed: f32,
    pub distance: f32,
    pub rank: Option<u32>,
    pub world_position: [f32; 3],
}

impl From<&Competitor> for CompetitorSnapshot {
    fn from(state: &Competitor) -> Self {
        Self {
            id: state.id,
            name: state.name.clone(),
            role: state.role,
            speed: state.speed,
            distance: state.distance,
            rank: state.rank,
            world_position: state.world_position,
        }
    }
}
