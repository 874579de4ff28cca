//! Game of Life environment
//!
//! Grid simulation, the target pattern catalog and the environment the agent
//! acts on. No tensors and no I/O live here, so the simulation can be driven
//! from tests, the headless trainer and the TUI alike.

pub mod config;
pub mod engine;
pub mod grid;
pub mod pattern;

pub use config::LifeConfig;
pub use engine::GridEnvironment;
pub use grid::{Boundary, Grid};
pub use pattern::{PATTERNS, Pattern};
