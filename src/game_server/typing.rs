//! Typing - Prompt matching that turns keystrokes into acceleration
//!
//! The player types the active prompt one character at a time. Each
//! correct key accelerates the player's car, and a streak of correct
//! keys doubles the impulse. Completing a prompt queues the next one
//! after a short pause.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::game_server::competitor::{usable_delta, Accelerate};
use crate::game_server::error::ConfigError;

/// Built-in prompt corpus
pub const DEFAULT_PROMPTS: &[&str] = &[
    "¿Cómo se llama el campeón de buceo argentino? Arturo Mido.",
    "¿Por qué los argentinos no pueden usar auriculares? Porque ya vienen con altavoz incluido.",
    "¿Cómo le dicen a un argentino con medio cerebro? Superdotado.",
    "¿Qué le dice un árbol a otro? ¡Qué pasa loco, tanto tiempo!",
    "¿Por qué los argentinos comen milanesa en los casamientos? Porque siempre hay que esperar al que se empana.",
    "¿Por qué los argentinos no juegan al escondite? Porque nadie los busca.",
    "¿Sabés cómo evitar que un argentino se ahogue? Fácil, solo dejá de aplaudirle.",
    "¿Qué es una obra de teatro argentina sin actores? Una mejora.",
    "¿Cómo se dice 'ya volví' en argentino? Soy yo, boludo, abrime.",
    "¿Cómo le dicen a Batman en Argentina? El Boludo de la Capa.",
    "¿Cómo se reconoce a un argentino en el Paraíso? Es el único que quiere irse porque no conoce a nadie.",
    "¿Por qué no hay hipermercados en Argentina? Porque se les queman los súper.",
    "Si un argentino y un mexicano se tiran de un avión, ¿quién llega primero al suelo? El mexicano, porque el argentino se para en cada nube a preguntar si ya llegó a Europa.",
    "Buenos Aires es tan húmeda que los peces salen del río a secarse.",
    "¿Qué hace un argentino cuando su equipo ganó el Mundial? Apaga la PlayStation.",
    "Si un argentino dice que va a llegar en 5 minutos, ¿Cuánto tiempo hay que esperar? Hasta que te canses.",
    "Los argentinos no mueren, desencarnan. Porque carne es lo que nunca les falta.",
    "¿Cómo se suicida un argentino? ¡Subiéndose a su ego y tirándose a su coeficiente intelectual!",
    "Si un argentino te dice 'haceme la segunda', no te está pidiendo que lo imites, sino que lo ayudes.",
    "¿Sabés por qué los argentinos tienen las narices grandes? Porque el aire es gratis.",
];

/// Typing tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Impulse per correct key (km/h)
    pub acceleration_per_key: f32,
    /// Consecutive correct keys needed for the bonus
    pub bonus_threshold: u32,
    /// Impulse multiplier once the streak reaches the threshold
    pub bonus_multiplier: f32,
    /// Pause before the next prompt appears (seconds)
    pub next_prompt_delay: f32,
    /// Typed characters kept visible behind the cursor
    pub visible_typed: usize,
    /// Characters visible ahead of the cursor
    pub visible_ahead: usize,
    /// Prompt corpus
    pub prompts: Vec<String>,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            acceleration_per_key: 2.5,
            bonus_threshold: 3,
            bonus_multiplier: 2.0,
            next_prompt_delay: 1.0,
            visible_typed: 15,
            visible_ahead: 25,
            prompts: DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl TypingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.acceleration_per_key.is_finite() || self.acceleration_per_key < 0.0 {
            return Err(ConfigError::InvalidParameter {
                field: "typing.acceleration_per_key",
                value: self.acceleration_per_key,
            });
        }
        if !self.bonus_multiplier.is_finite() || self.bonus_multiplier < 1.0 {
            return Err(ConfigError::BonusMultiplierTooSmall(self.bonus_multiplier));
        }
        if self.next_prompt_delay.is_nan() || self.next_prompt_delay < 0.0 {
            return Err(ConfigError::InvalidParameter {
                field: "typing.next_prompt_delay",
                value: self.next_prompt_delay,
            });
        }
        if self.prompts.is_empty() {
            return Err(ConfigError::EmptyCorpus);
        }
        if let Some(index) = self.prompts.iter().position(|p| p.is_empty()) {
            return Err(ConfigError::EmptyPrompt(index));
        }
        Ok(())
    }
}

/// Fold a character for comparison: strip accents, lowercase, and map
/// the inverted Spanish marks to their plain ASCII forms.
pub fn normalize_char(c: char) -> String {
    match c {
        '¿' => "?".to_string(),
        '¡' => "!".to_string(),
        _ => c
            .nfd()
            .filter(|m| !('\u{0300}'..='\u{036f}').contains(m))
            .flat_map(char::to_lowercase)
            .collect(),
    }
}

/// Result of a single keystroke
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KeyOutcome {
    /// Correct key; the player was accelerated
    Matched {
        acceleration: f32,
        bonus: bool,
        completed: bool,
    },
    /// Wrong key; streak lost
    Mismatched { expected: char },
    /// Key arrived after the prompt was finished; a new prompt was selected
    PromptAdvanced,
}

/// Sliding view over the active prompt for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptWindow {
    /// Tail of what was already typed
    pub typed: String,
    /// Character expected next (space once the prompt is complete)
    pub current: char,
    /// Upcoming characters after `current`
    pub ahead: String,
    /// More typed text exists before `typed`
    pub truncated_before: bool,
    /// More prompt text exists after `ahead`
    pub truncated_after: bool,
    pub percent_complete: u32,
}

/// Typing progress for IPC transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingSnapshot {
    pub window: PromptWindow,
    pub streak: u32,
    pub waiting_for_prompt: bool,
    pub prompts_completed: u32,
    pub keys_matched: u32,
    pub keys_missed: u32,
}

/// Active prompt and the typist's progress through it
#[derive(Debug, Clone)]
pub struct TypingChallenge {
    config: TypingConfig,
    prompt: Vec<char>,
    typed: String,
    cursor: usize,
    streak: u32,
    /// Seconds left before the next prompt is selected
    pending_prompt: Option<f32>,
    prompts_completed: u32,
    keys_matched: u32,
    keys_missed: u32,
    rng: StdRng,
}

impl TypingChallenge {
    /// Create a challenge and select its first prompt
    pub fn new(config: TypingConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Same as [`new`](Self::new) with reproducible prompt selection
    pub fn with_seed(config: TypingConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: TypingConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut challenge = Self {
            config,
            prompt: Vec::new(),
            typed: String::new(),
            cursor: 0,
            streak: 0,
            pending_prompt: None,
            prompts_completed: 0,
            keys_matched: 0,
            keys_missed: 0,
            rng,
        };
        challenge.select_prompt();
        Ok(challenge)
    }

    /// Pick a random prompt from the corpus and start over on it
    pub fn select_prompt(&mut self) {
        let index = self.rng.gen_range(0..self.config.prompts.len());
        self.prompt = self.config.prompts[index].chars().collect();
        self.typed.clear();
        self.cursor = 0;
        self.streak = 0;
        self.pending_prompt = None;
        log::debug!("Selected prompt {}", index);
    }

    /// Feed one keystroke; correct keys accelerate `target`
    pub fn submit_key<A: Accelerate + ?Sized>(&mut self, key: char, target: &mut A) -> KeyOutcome {
        if self.is_complete() {
            log::info!("Prompt already complete, moving to the next one");
            let streak = self.streak;
            self.select_prompt();
            self.streak = streak;
            return KeyOutcome::PromptAdvanced;
        }

        let expected = self.prompt[self.cursor];
        if normalize_char(key) != normalize_char(expected) {
            log::debug!("Wrong key {:?}, expected {:?}", key, expected);
            self.streak = 0;
            self.keys_missed += 1;
            return KeyOutcome::Mismatched { expected };
        }

        // Keep the prompt's own spelling in the typed buffer
        self.typed.push(expected);
        self.cursor += 1;
        self.streak += 1;
        self.keys_matched += 1;

        let bonus = self.streak >= self.config.bonus_threshold;
        let acceleration = if bonus {
            self.config.acceleration_per_key * self.config.bonus_multiplier
        } else {
            self.config.acceleration_per_key
        };
        target.apply_acceleration(acceleration);

        let completed = self.is_complete();
        if completed {
            self.prompts_completed += 1;
            self.pending_prompt = Some(self.config.next_prompt_delay);
            log::info!(
                "Prompt complete, next in {:.1}s",
                self.config.next_prompt_delay
            );
        }

        KeyOutcome::Matched {
            acceleration,
            bonus,
            completed,
        }
    }

    /// Advance the deferred next-prompt timer by `delta` seconds
    pub fn update(&mut self, delta: f32) {
        if let Some(remaining) = self.pending_prompt.as_mut() {
            *remaining -= usable_delta(delta);
            if *remaining <= 0.0 {
                self.select_prompt();
            }
        }
    }

    /// Clear progress and counters, then select a new prompt
    pub fn reset(&mut self) {
        self.prompts_completed = 0;
        self.keys_matched = 0;
        self.keys_missed = 0;
        self.select_prompt();
    }

    pub fn prompt_text(&self) -> String {
        self.prompt.iter().collect()
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.prompt.len()
    }

    pub fn has_pending_prompt(&self) -> bool {
        self.pending_prompt.is_some()
    }

    pub fn current_char(&self) -> Option<char> {
        self.prompt.get(self.cursor).copied()
    }

    /// Up to `visible_ahead` characters after the current one
    pub fn lookahead(&self) -> String {
        self.prompt
            .iter()
            .skip(self.cursor + 1)
            .take(self.config.visible_ahead)
            .collect()
    }

    pub fn percent_complete(&self) -> u32 {
        if self.prompt.is_empty() {
            return 100;
        }
        (self.cursor * 100 / self.prompt.len()) as u32
    }

    pub fn window(&self) -> PromptWindow {
        let skip = self.cursor.saturating_sub(self.config.visible_typed);
        PromptWindow {
            typed: self.typed.chars().skip(skip).collect(),
            current: self.current_char().unwrap_or(' '),
            ahead: self.lookahead(),
            truncated_before: skip > 0,
            truncated_after: self.cursor + 1 + self.config.visible_ahead < self.prompt.len(),
            percent_complete: self.percent_complete(),
        }
    }

    pub fn snapshot(&self) -> TypingSnapshot {
        TypingSnapshot {
            window: self.window(),
            streak: self.streak,
            waiting_for_prompt: self.has_pending_prompt(),
            prompts_completed: self.prompts_completed,
            keys_matched: self.keys_matched,
            keys_missed: self.keys_missed,
        }
    }

    /// Share of keystrokes that matched, 1.0 before any input
    pub fn accuracy(&self) -> f32 {
        let total = self.keys_matched + self.keys_missed;
        if total == 0 {
            1.0
        } else {
            self.keys_matched as f32 / total as f32
        }
    }
}
