//! Model persistence for saving and loading trained Q-networks
//!
//! This module saves the live Q-network of a training session together with
//! the configuration and progress needed to rebuild it and resume training.
//! Weights go through Burn's Record system, metadata through serde_json.

use super::{BurnQFunction, DqnConfig, QNetwork, QNetworkConfig, TrainingLoop};
use crate::life::LifeConfig;
use anyhow::{Context, Result};
use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata saved with the model
///
/// Contains configuration and training information needed to properly
/// reconstruct the network and continue where training stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// DQN hyperparameters used during training
    pub dqn_config: DqnConfig,

    /// Environment the network was trained on
    pub life_config: LifeConfig,

    /// Shape of the Q-network
    pub network_config: QNetworkConfig,

    /// Number of episodes completed
    pub episodes_trained: usize,

    /// Total training steps completed
    pub training_steps: usize,

    /// Exploration rate when the model was saved
    pub epsilon: f32,

    /// Version identifier for compatibility checking
    pub version: String,
}

impl ModelMetadata {
    /// Capture the configuration and progress of a training session
    pub fn from_training<B: AutodiffBackend>(training: &TrainingLoop<BurnQFunction<B>>) -> Self {
        Self {
            dqn_config: training.config().clone(),
            life_config: training.environment().config().clone(),
            network_config: training.agent().policy().config().clone(),
            episodes_trained: training.episode(),
            training_steps: training.agent().training_steps(),
            epsilon: training.epsilon(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Path of the JSON sidecar holding a model's metadata
pub fn metadata_path(path: &Path) -> PathBuf {
    path.with_extension("meta.json")
}

/// Save the live Q-network of a training session
///
/// Creates parent directories if they don't exist. The model is saved in two
/// files:
/// - `<path>.mpk` - Network weights (Burn record format; the recorder adds the extension)
/// - `<path>.meta.json` - Metadata as JSON
pub fn save_model<B: AutodiffBackend>(
    training: &TrainingLoop<BurnQFunction<B>>,
    path: &Path,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let record = training.agent().policy().network().clone().into_record();

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(record, path.to_path_buf())
        .context("Failed to save network weights")?;

    let metadata = ModelMetadata::from_training(training);
    let meta_path = metadata_path(path);
    let meta_json =
        serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
    std::fs::write(&meta_path, meta_json)
        .with_context(|| format!("Failed to write metadata to {:?}", meta_path))?;

    Ok(())
}

/// Load a trained network and its metadata
///
/// # Arguments
///
/// * `path` - Path the model was saved under (without extension)
/// * `device` - Device to load the model onto
pub fn load_model<B: AutodiffBackend>(
    path: &Path,
    device: &B::Device,
) -> Result<(QNetwork<B>, ModelMetadata)> {
    let meta_path = metadata_path(path);
    let meta_json = std::fs::read_to_string(&meta_path)
        .with_context(|| format!("Failed to read metadata from {:?}", meta_path))?;
    let metadata: ModelMetadata =
        serde_json::from_str(&meta_json).context("Failed to deserialize metadata")?;

    let network = metadata.network_config.init::<B>(device);

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("Failed to load network weights from {:?}", path))?;

    Ok((network.load_record(record), metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::life::GridEnvironment;
    use crate::rl::{QFunction, TrainingBackend, default_device};
    use tempfile::TempDir;

    fn small_training() -> TrainingLoop<BurnQFunction<TrainingBackend>> {
        let life = LifeConfig::new(5).with_pattern("blinker");
        let env = GridEnvironment::with_seed(life, 3).unwrap();
        let network = QNetworkConfig::new(5).with_hidden_dim(16);
        let config = DqnConfig {
            batch_size: 4,
            buffer_capacity: 50,
            max_steps: 6,
            seed: Some(9),
            ..Default::default()
        };
        let policy = BurnQFunction::new(network.clone(), config.learning_rate, default_device());
        let target = BurnQFunction::new(network, config.learning_rate, default_device());
        TrainingLoop::new(env, policy, target, config).unwrap()
    }

    #[test]
    fn test_metadata_captures_progress() {
        let mut training = small_training();
        training.run(2).unwrap();

        let metadata = ModelMetadata::from_training(&training);

        assert_eq!(metadata.episodes_trained, 2);
        assert_eq!(metadata.life_config.target_pattern, "blinker");
        assert_eq!(metadata.network_config.hidden_dim, 16);
        assert_eq!(metadata.epsilon, training.epsilon());
        assert_eq!(metadata.training_steps, training.agent().training_steps());
    }

    #[test]
    fn test_metadata_serialization() {
        let metadata = ModelMetadata::from_training(&small_training());

        let json = serde_json::to_string(&metadata).unwrap();
        let deserialized: ModelMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, metadata);
    }

    #[test]
    fn test_save_and_load_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("models").join("shaper");

        let mut training = small_training();
        training.run(1).unwrap();
        save_model(&training, &path).unwrap();

        assert!(metadata_path(&path).exists());

        let device = default_device();
        let (network, metadata) = load_model::<TrainingBackend>(&path, &device).unwrap();
        assert_eq!(metadata.episodes_trained, 1);

        let restored =
            BurnQFunction::from_network(network, metadata.network_config, 1e-3, device);
        let state = training.grid().to_state_vector();
        let original = training.agent().policy().predict(&state).unwrap();
        let loaded = restored.predict(&state).unwrap();

        for (a, b) in original.iter().zip(&loaded) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_load_missing_model_fails() {
        let dir = TempDir::new().unwrap();
        let result = load_model::<TrainingBackend>(&dir.path().join("absent"), &default_device());
        assert!(result.is_err());
    }
}
