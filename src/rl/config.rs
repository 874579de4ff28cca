//! DQN hyperparameter configuration

use serde::{Deserialize, Serialize};

/// Configuration for the DQN training loop
///
/// Defaults: gamma 0.95, epsilon 1.0 decaying by 0.995 per episode to a floor
/// of 0.05, batches of 32 from a replay buffer of 10 000 transitions, and a
/// target sync every 10 episodes.
///
/// # Example
///
/// ```rust
/// use life_shaper::rl::DqnConfig;
///
/// let config = DqnConfig {
///     learning_rate: 5e-4,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    /// Learning rate for the Adam optimizer
    ///
    /// Default: 1e-3
    pub learning_rate: f64,

    /// Discount factor applied to bootstrapped targets
    ///
    /// Default: 0.95
    pub gamma: f32,

    /// Exploration rate at the first episode
    ///
    /// Default: 1.0
    pub epsilon_start: f32,

    /// Lower bound for the exploration rate
    ///
    /// Default: 0.05
    pub epsilon_min: f32,

    /// Multiplicative decay applied to epsilon at the end of every episode
    ///
    /// Default: 0.995
    pub epsilon_decay: f32,

    /// Transitions per training step
    ///
    /// Default: 32
    pub batch_size: usize,

    /// Maximum number of transitions kept in the replay buffer
    ///
    /// Default: 10000
    pub buffer_capacity: usize,

    /// Copy live parameters into the target network every N episodes
    ///
    /// Default: 10
    pub target_sync_interval: usize,

    /// Step limit per episode
    ///
    /// Default: 100
    pub max_steps: usize,

    /// Similarity above which an episode counts as solved
    ///
    /// Default: 0.95
    pub success_threshold: f32,

    /// Width of the hidden layers in the Q-network
    ///
    /// Default: 128
    pub hidden_dim: usize,

    /// Seed for exploration, sampling and resets (random if unset)
    pub seed: Option<u64>,
}

impl DqnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration parameters
    ///
    /// # Returns
    ///
    /// `Ok(())` if all parameters are valid, `Err(String)` with an error message otherwise.
    pub fn validate(&self) -> Result<(), String> {
        if self.learning_rate <= 0.0 {
            return Err(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(format!("gamma must be in (0, 1), got {}", self.gamma));
        }

        if !(0.0..=1.0).contains(&self.epsilon_start) {
            return Err(format!(
                "epsilon_start must be in [0, 1], got {}",
                self.epsilon_start
            ));
        }

        if !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(format!(
                "epsilon_min must be in [0, 1], got {}",
                self.epsilon_min
            ));
        }

        if self.epsilon_min > self.epsilon_start {
            return Err(format!(
                "epsilon_min ({}) cannot exceed epsilon_start ({})",
                self.epsilon_min, self.epsilon_start
            ));
        }

        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(format!(
                "epsilon_decay must be in (0, 1], got {}",
                self.epsilon_decay
            ));
        }

        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }

        if self.buffer_capacity < self.batch_size {
            return Err(format!(
                "buffer_capacity ({}) cannot be smaller than batch_size ({})",
                self.buffer_capacity, self.batch_size
            ));
        }

        if self.target_sync_interval == 0 {
            return Err("target_sync_interval must be at least 1".to_string());
        }

        if self.max_steps == 0 {
            return Err("max_steps must be at least 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.success_threshold) {
            return Err(format!(
                "success_threshold must be in [0, 1], got {}",
                self.success_threshold
            ));
        }

        if self.hidden_dim == 0 {
            return Err("hidden_dim must be at least 1".to_string());
        }

        Ok(())
    }
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.95,
            epsilon_start: 1.0,
            epsilon_min: 0.05,
            epsilon_decay: 0.995,
            batch_size: 32,
            buffer_capacity: 10_000,
            target_sync_interval: 10,
            max_steps: 100,
            success_threshold: 0.95,
            hidden_dim: 128,
            seed: None,
        }
    }
}
