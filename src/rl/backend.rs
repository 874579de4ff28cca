//! Backend type alias and device management
//!
//! The Q-network is tiny (a few dense layers over at most a few thousand
//! inputs), so the CPU NdArray backend wrapped in Autodiff is all training
//! needs.
//!
//! # Example
//!
//! ```rust
//! use life_shaper::rl::{BurnQFunction, QNetworkConfig, TrainingBackend, default_device};
//!
//! let device = default_device();
//! let q = BurnQFunction::<TrainingBackend>::new(QNetworkConfig::new(10), 1e-3, device);
//! ```

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend type for training (with autodiff)
///
/// Inference inside the Q-function runs on the inner NdArray backend via
/// `AutodiffModule::valid`.
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Get the default device for computation (CPU)
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}
