//! Deep Q-learning for shaping Game of Life grids
//!
//! Provides:
//! - Similarity-based reward shaping
//! - Bounded FIFO replay buffer with uniform sampling
//! - The `QFunction` collaborator contract and its burn MLP implementation
//! - Epsilon-greedy agent with bootstrapped targets from a frozen target network
//! - The episode-driven training loop and model persistence

pub mod agent;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod network;
pub mod observation;
pub mod persistence;
pub mod qfunction;
pub mod reward;
pub mod training;

pub use agent::{DqnAgent, EpsilonGreedy, argmax};
pub use backend::{TrainingBackend, default_device};
pub use buffer::{ReplayBuffer, Transition};
pub use config::DqnConfig;
pub use network::{QNetwork, QNetworkConfig};
pub use persistence::{ModelMetadata, load_model, save_model};
pub use qfunction::{BurnQFunction, QFunction};
pub use reward::reward;
pub use training::{EpisodeSummary, Phase, StepOutcome, TrainingHandle, TrainingLoop};
