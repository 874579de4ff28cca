//! Headless training mode
//!
//! This module runs the DQN training loop without a UI. It prints progress
//! every few episodes, periodically saves checkpoints, and stops early when
//! the training handle is cleared (Ctrl+C).
//!
//! # Example
//!
//! ```rust,ignore
//! use life_shaper::modes::{TrainMode, TrainConfig};
//! use life_shaper::rl::{default_device, TrainingBackend};
//! use std::path::PathBuf;
//!
//! let train_config = TrainConfig::new(2000, PathBuf::from("models/shaper"));
//! let device = default_device();
//! let mut train_mode = TrainMode::<TrainingBackend>::new(train_config, device)?;
//! train_mode.run()?;
//! ```

use anyhow::{Context, Result, bail};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::life::{GridEnvironment, LifeConfig};
use crate::rl::{
    BurnQFunction, DqnConfig, QNetworkConfig, TrainingHandle, TrainingLoop, load_model, save_model,
};

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of episodes to train
    pub num_episodes: usize,

    /// Path to save the final trained model
    pub save_path: PathBuf,

    /// Save a checkpoint every N episodes
    pub checkpoint_frequency: usize,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Environment configuration (grid size, target pattern, boundary)
    pub life_config: LifeConfig,

    /// DQN hyperparameters
    pub dqn_config: DqnConfig,

    /// Model to continue training from
    pub resume: Option<PathBuf>,
}

impl TrainConfig {
    /// Create a new training configuration with defaults
    ///
    /// # Example
    ///
    /// ```rust
    /// use life_shaper::modes::TrainConfig;
    /// use std::path::PathBuf;
    ///
    /// let config = TrainConfig::new(2000, PathBuf::from("models/shaper"));
    /// assert_eq!(config.checkpoint_frequency, 500);
    /// ```
    pub fn new(num_episodes: usize, save_path: PathBuf) -> Self {
        Self {
            num_episodes,
            save_path,
            checkpoint_frequency: 500,
            log_frequency: 50,
            life_config: LifeConfig::default(),
            dqn_config: DqnConfig::default(),
            resume: None,
        }
    }
}

/// Environment and hyperparameters as read from a JSON config file
///
/// Both sections and every field inside them are optional.
///
/// ```json
/// { "life": { "grid_size": 8, "target_pattern": "beacon" }, "dqn": { "gamma": 0.9 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub life: LifeConfig,
    pub dqn: DqnConfig,
}

impl SessionConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse config {:?}", path))
    }
}

/// Build a training session, optionally restoring a saved model
///
/// A restored model must have been trained on the same grid size; its
/// episode counter and epsilon carry over.
pub fn build_session<B: AutodiffBackend>(
    life_config: LifeConfig,
    dqn_config: DqnConfig,
    resume: Option<&Path>,
    device: B::Device,
) -> Result<TrainingLoop<BurnQFunction<B>>> {
    life_config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid environment configuration: {}", e))?;

    let env = match dqn_config.seed {
        Some(seed) => GridEnvironment::with_seed(life_config, seed)?,
        None => GridEnvironment::new(life_config)?,
    };
    let grid_size = env.config().grid_size;
    let learning_rate = dqn_config.learning_rate;

    let Some(path) = resume else {
        let network_config = QNetworkConfig::new(grid_size).with_hidden_dim(dqn_config.hidden_dim);
        let policy = BurnQFunction::new(network_config.clone(), learning_rate, device.clone());
        let target = BurnQFunction::new(network_config, learning_rate, device);
        return TrainingLoop::new(env, policy, target, dqn_config);
    };

    let (network, metadata) = load_model::<B>(path, &device)
        .with_context(|| format!("Failed to load model from {:?}", path))?;

    if metadata.network_config.grid_size != grid_size {
        bail!(
            "model at {:?} was trained on a {n}x{n} grid, not {m}x{m}",
            path,
            n = metadata.network_config.grid_size,
            m = grid_size
        );
    }

    let target = BurnQFunction::new(metadata.network_config.clone(), learning_rate, device.clone());
    let policy =
        BurnQFunction::from_network(network, metadata.network_config, learning_rate, device);

    let mut training = TrainingLoop::new(env, policy, target, dqn_config)?;
    training.resume(metadata.episodes_trained, metadata.epsilon);
    info!(
        episodes = metadata.episodes_trained,
        epsilon = metadata.epsilon,
        "resumed from saved model"
    );

    Ok(training)
}

/// Training mode for the DQN agent
///
/// Runs episodes until the configured count is reached or training is stopped.
/// Periodically logs progress and saves checkpoints.
pub struct TrainMode<B: AutodiffBackend> {
    /// Training session (environment, agent, replay buffer)
    training: TrainingLoop<BurnQFunction<B>>,

    /// Training configuration
    config: TrainConfig,
}

impl<B: AutodiffBackend> TrainMode<B> {
    /// Create a new training mode
    ///
    /// # Arguments
    ///
    /// * `config` - Training configuration
    /// * `device` - Device for computation
    pub fn new(config: TrainConfig, device: B::Device) -> Result<Self> {
        if config.log_frequency == 0 || config.checkpoint_frequency == 0 {
            bail!("log and checkpoint frequencies must be at least 1");
        }

        let training = build_session::<B>(
            config.life_config.clone(),
            config.dqn_config.clone(),
            config.resume.as_deref(),
            device,
        )?;

        Ok(Self { training, config })
    }

    /// Handle for stopping the run from another task
    pub fn handle(&self) -> TrainingHandle {
        self.training.handle()
    }

    /// Stop training when Ctrl+C is received
    ///
    /// Must be called from within a Tokio runtime.
    pub fn stop_on_ctrl_c(&self) {
        let handle = self.handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.stop();
            }
        });
    }

    /// Run the training loop
    ///
    /// Trains for the configured number of episodes, logging progress and
    /// saving checkpoints periodically. The final model is saved even when
    /// training is interrupted.
    pub fn run(&mut self) -> Result<()> {
        self.print_header();

        let handle = self.handle();
        handle.start();

        let mut completed = 0;
        while completed < self.config.num_episodes {
            let Some(summary) = self.training.run_episode()? else {
                println!("\nTraining interrupted after {} episodes", completed);
                break;
            };
            completed += 1;

            if completed % self.config.log_frequency == 0 {
                self.print_progress(summary.episode + 1);
            }

            if completed % self.config.checkpoint_frequency == 0 {
                self.save_checkpoint()?;
            }
        }
        handle.stop();

        self.save_model()?;

        println!("\nTraining complete!");
        println!("Final model saved to: {:?}", self.config.save_path);
        println!("\nFinal Statistics:");
        println!("{}", self.training.stats().format_summary());

        Ok(())
    }

    /// Save a checkpoint of the current model
    fn save_checkpoint(&self) -> Result<()> {
        let checkpoint_path = self
            .config
            .save_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!("checkpoint_ep{}", self.training.episode()));

        save_model(&self.training, &checkpoint_path)
            .with_context(|| format!("Failed to save checkpoint to {:?}", checkpoint_path))?;

        println!("  Checkpoint saved: {:?}", checkpoint_path);

        Ok(())
    }

    /// Save the final trained model
    fn save_model(&self) -> Result<()> {
        save_model(&self.training, &self.config.save_path).with_context(|| {
            format!("Failed to save final model to {:?}", self.config.save_path)
        })
    }

    pub fn training(&self) -> &TrainingLoop<BurnQFunction<B>> {
        &self.training
    }

    /// Print training header information
    fn print_header(&self) {
        let life = &self.config.life_config;
        let dqn = &self.config.dqn_config;

        println!("{}", "=".repeat(70));
        println!("DQN Training - Life Shaper");
        println!("{}", "=".repeat(70));
        println!("Episodes: {}", self.config.num_episodes);
        println!(
            "Grid: {n}x{n} ({:?}), target: {}, auto-evolve: {}",
            life.boundary,
            life.target_pattern,
            life.auto_evolve,
            n = life.grid_size
        );
        println!("DQN Config:");
        println!("  Learning rate: {}", dqn.learning_rate);
        println!("  Gamma: {}", dqn.gamma);
        println!(
            "  Epsilon: {} -> {} (decay {})",
            dqn.epsilon_start, dqn.epsilon_min, dqn.epsilon_decay
        );
        println!("  Batch size: {}", dqn.batch_size);
        println!("  Replay capacity: {}", dqn.buffer_capacity);
        println!("  Target sync: every {} episodes", dqn.target_sync_interval);
        println!("  Max steps: {}", dqn.max_steps);
        if let Some(path) = &self.config.resume {
            println!("Resuming from: {:?} (episode {})", path, self.training.episode());
        }
        println!("Checkpoints: Every {} episodes", self.config.checkpoint_frequency);
        println!("Logging: Every {} episodes", self.config.log_frequency);
        println!("Save path: {:?}", self.config.save_path);
        println!("{}", "=".repeat(70));
        println!();
    }

    /// Print training progress
    fn print_progress(&self, episode: usize) {
        println!(
            "[Episode {}] eps {:.3} | {}",
            episode,
            self.training.epsilon(),
            self.training.stats().format_summary()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{TrainingBackend, default_device, persistence::metadata_path};
    use tempfile::TempDir;

    fn small_config(save_path: PathBuf, episodes: usize) -> TrainConfig {
        let mut config = TrainConfig::new(episodes, save_path);
        config.life_config = LifeConfig::new(5).with_pattern("block");
        config.dqn_config = DqnConfig {
            batch_size: 4,
            buffer_capacity: 100,
            max_steps: 5,
            hidden_dim: 16,
            seed: Some(1),
            ..Default::default()
        };
        config.log_frequency = 1;
        config.checkpoint_frequency = 2;
        config
    }

    #[test]
    fn test_train_config_creation() {
        let config = TrainConfig::new(1000, PathBuf::from("test"));
        assert_eq!(config.num_episodes, 1000);
        assert_eq!(config.save_path, PathBuf::from("test"));
        assert!(config.resume.is_none());
    }

    #[test]
    fn test_session_config_from_partial_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{ "life": { "grid_size": 8, "target_pattern": "beacon" }, "dqn": { "gamma": 0.9 } }"#,
        )
        .unwrap();

        let config = SessionConfig::from_json_file(&path).unwrap();

        assert_eq!(config.life.grid_size, 8);
        assert_eq!(config.life.target_pattern, "beacon");
        assert_eq!(config.life.initial_density, LifeConfig::default().initial_density);
        assert_eq!(config.dqn.gamma, 0.9);
        assert_eq!(config.dqn.batch_size, DqnConfig::default().batch_size);
    }

    #[test]
    fn test_session_config_rejects_bad_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ life: ").unwrap();

        assert!(SessionConfig::from_json_file(&path).is_err());
        assert!(SessionConfig::from_json_file(&temp_dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_invalid_environment_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = small_config(temp_dir.path().join("model"), 1);
        config.life_config.target_pattern = "spaceship".to_string();

        assert!(TrainMode::<TrainingBackend>::new(config, default_device()).is_err());
    }

    #[test]
    fn test_run_saves_final_model_and_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let save_path = temp_dir.path().join("model");

        let config = small_config(save_path.clone(), 3);
        let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();
        train_mode.run().unwrap();

        assert_eq!(train_mode.training().episode(), 3);
        assert!(metadata_path(&save_path).exists());
        assert!(metadata_path(&temp_dir.path().join("checkpoint_ep2")).exists());
        assert!(!train_mode.handle().is_active());
    }

    #[test]
    fn test_resume_continues_episode_count() {
        let temp_dir = TempDir::new().unwrap();
        let save_path = temp_dir.path().join("model");

        let mut first =
            TrainMode::<TrainingBackend>::new(small_config(save_path.clone(), 2), default_device())
                .unwrap();
        first.run().unwrap();
        let epsilon = first.training().epsilon();

        let mut config = small_config(temp_dir.path().join("resumed"), 1);
        config.resume = Some(save_path);
        let resumed = TrainMode::<TrainingBackend>::new(config, default_device()).unwrap();

        assert_eq!(resumed.training().episode(), 2);
        assert_eq!(resumed.training().epsilon(), epsilon);
    }

    #[test]
    fn test_resume_rejects_other_grid_size() {
        let temp_dir = TempDir::new().unwrap();
        let save_path = temp_dir.path().join("model");

        let mut first =
            TrainMode::<TrainingBackend>::new(small_config(save_path.clone(), 1), default_device())
                .unwrap();
        first.run().unwrap();

        let mut config = small_config(temp_dir.path().join("other"), 1);
        config.life_config = LifeConfig::new(6).with_pattern("toad");
        config.resume = Some(save_path);

        assert!(TrainMode::<TrainingBackend>::new(config, default_device()).is_err());
    }
}
