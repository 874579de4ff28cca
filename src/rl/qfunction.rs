//! Action-value function contract and its burn implementation
//!
//! The training loop only talks to a [`QFunction`]: it asks for action values,
//! hands over a batch of corrected targets, and copies parameters into a
//! frozen target instance. Any approximator meeting that contract can be
//! plugged in; [`BurnQFunction`] is the neural-network one used by the CLI.

use anyhow::{Result, anyhow, bail};
use burn::{
    module::{AutodiffModule, Module},
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{ElementConversion, backend::AutodiffBackend},
};

use super::network::{QNetwork, QNetworkConfig};
use super::observation::{batch_tensor, split_rows};

/// An approximator of action values over a fixed action space
///
/// Every call may fail (for example when the backend runs out of memory); the
/// training loop treats such an error as fatal for the current episode.
pub trait QFunction {
    /// Number of actions, equal to the state vector length for the shaping task
    fn action_space(&self) -> usize;

    /// Action values for one state
    fn predict(&self, state: &[f32]) -> Result<Vec<f32>>;

    /// Action values for a batch of states
    fn predict_batch(&self, states: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        states.iter().map(|s| self.predict(s)).collect()
    }

    /// One optimisation step pulling predictions for `states` toward `targets`
    ///
    /// Returns the training loss.
    fn update(&mut self, states: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<f32>;

    /// Copy this instance's parameters into `target`
    ///
    /// After the copy both instances can be updated independently.
    fn clone_parameters_into(&self, target: &mut Self)
    where
        Self: Sized;
}

/// Q-function backed by a burn MLP trained with Adam on a mean-squared error
pub struct BurnQFunction<B: AutodiffBackend> {
    network: QNetwork<B>,
    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,
    config: QNetworkConfig,
    learning_rate: f64,
    device: B::Device,
}

impl<B: AutodiffBackend> BurnQFunction<B> {
    /// Build a freshly initialised Q-function
    ///
    /// # Example
    ///
    /// ```rust
    /// use life_shaper::rl::{BurnQFunction, QFunction, QNetworkConfig, TrainingBackend, default_device};
    ///
    /// let q = BurnQFunction::<TrainingBackend>::new(QNetworkConfig::new(5), 1e-3, default_device());
    /// assert_eq!(q.predict(&[0.0; 25]).unwrap().len(), 25);
    /// ```
    pub fn new(config: QNetworkConfig, learning_rate: f64, device: B::Device) -> Self {
        let network = config.init::<B>(&device);
        Self::from_network(network, config, learning_rate, device)
    }

    /// Wrap an existing network, e.g. one restored from a checkpoint
    pub fn from_network(
        network: QNetwork<B>,
        config: QNetworkConfig,
        learning_rate: f64,
        device: B::Device,
    ) -> Self {
        Self {
            network,
            optim: AdamConfig::new().init(),
            config,
            learning_rate,
            device,
        }
    }

    pub fn network(&self) -> &QNetwork<B> {
        &self.network
    }

    pub fn config(&self) -> &QNetworkConfig {
        &self.config
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }
}

impl<B: AutodiffBackend> QFunction for BurnQFunction<B> {
    fn action_space(&self) -> usize {
        self.config.num_actions()
    }

    fn predict(&self, state: &[f32]) -> Result<Vec<f32>> {
        self.predict_batch(&[state.to_vec()])?
            .pop()
            .ok_or_else(|| anyhow!("network returned no action values"))
    }

    fn predict_batch(&self, states: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        if states.is_empty() {
            return Ok(Vec::new());
        }

        let width = self.action_space();
        let input = batch_tensor::<B::InnerBackend>(states, width, &self.device)?;

        // Inference without gradient tracking
        let network = self.network.clone().valid();
        let values: Vec<f32> = network
            .forward(input)
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("failed to read action values: {:?}", e))?;

        Ok(split_rows(values, width))
    }

    fn update(&mut self, states: &[Vec<f32>], targets: &[Vec<f32>]) -> Result<f32> {
        if states.len() != targets.len() {
            bail!(
                "batch has {} states but {} targets",
                states.len(),
                targets.len()
            );
        }
        if states.is_empty() {
            bail!("cannot train on an empty batch");
        }

        let width = self.action_space();
        let inputs = batch_tensor::<B>(states, width, &self.device)?;
        let targets = batch_tensor::<B>(targets, width, &self.device)?;

        let predictions = self.network.forward(inputs);
        let diff = predictions - targets;
        let loss = (diff.clone() * diff).mean();

        let value = loss.clone().into_scalar().elem::<f32>();
        if !value.is_finite() {
            bail!("training produced a non-finite loss ({})", value);
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optim
            .step(self.learning_rate, self.network.clone(), grads);

        Ok(value)
    }

    fn clone_parameters_into(&self, target: &mut Self) {
        // Tensors are immutable values, so the copied record never observes
        // later optimiser steps on either side.
        let record = self.network.clone().into_record();
        target.network = target.network.clone().load_record(record);
    }
}
