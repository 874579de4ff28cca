//! Q-value network for the grid-shaping agent
//!
//! A small fully connected network mapping the flattened grid to one value per
//! toggle action.
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, N*N]
//!   ↓ Linear(N*N → hidden) + ReLU
//!   ↓ Linear(hidden → hidden) + ReLU
//!   ↓ Linear(hidden → N*N)
//! Output: [batch, N*N] action values
//! ```
//!
//! # Example
//!
//! ```rust
//! use life_shaper::rl::QNetworkConfig;
//! use burn::backend::ndarray::{NdArray, NdArrayDevice};
//! use burn::tensor::Tensor;
//!
//! let device = NdArrayDevice::default();
//! let network = QNetworkConfig::new(10).init::<NdArray<f32>>(&device);
//!
//! let q_values = network.forward(Tensor::zeros([2, 100], &device));
//! assert_eq!(q_values.dims(), [2, 100]);
//! ```

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{Tensor, activation::relu, backend::Backend},
};
use serde::{Deserialize, Serialize};

/// Configuration for the Q-network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QNetworkConfig {
    /// Side length of the grid; input and output widths are `grid_size²`
    pub grid_size: usize,

    /// Width of both hidden layers (default: 128)
    pub hidden_dim: usize,
}

impl QNetworkConfig {
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            hidden_dim: 128,
        }
    }

    pub fn with_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    /// Length of the state vector and of the action-value vector
    pub fn num_actions(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Initialize the network with fresh random weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        let cells = self.num_actions();

        QNetwork {
            input: LinearConfig::new(cells, self.hidden_dim).init(device),
            hidden: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            output: LinearConfig::new(self.hidden_dim, cells).init(device),
        }
    }
}

/// Multi-layer perceptron producing one Q-value per cell
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    input: Linear<B>,
    hidden: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass
    ///
    /// * `states` - Tensor with shape `[batch, N*N]`
    ///
    /// Returns action values with shape `[batch, N*N]`.
    pub fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.input.forward(states));
        let x = relu(self.hidden.forward(x));
        self.output.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_pass_shapes() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new(10).init::<TestBackend>(&device);

        for batch_size in [1, 4, 32] {
            let states = Tensor::zeros([batch_size, 100], &device);
            assert_eq!(network.forward(states).dims(), [batch_size, 100]);
        }
    }

    #[test]
    fn test_different_grid_sizes() {
        let device = NdArrayDevice::default();

        for grid_size in [5, 6, 12] {
            let config = QNetworkConfig::new(grid_size).with_hidden_dim(16);
            let network = config.init::<TestBackend>(&device);
            let cells = grid_size * grid_size;

            let states = Tensor::zeros([1, cells], &device);
            assert_eq!(network.forward(states).dims(), [1, cells]);
        }
    }

    #[test]
    fn test_output_is_finite() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new(6).init::<TestBackend>(&device);

        let states = Tensor::<TestBackend, 2>::random([3, 36], Distribution::Uniform(0.0, 1.0), &device);
        let values: Vec<f32> = network.forward(states).into_data().to_vec().unwrap();

        assert_eq!(values.len(), 3 * 36);
        assert!(values.iter().all(|v| v.is_finite()));
    }
}
