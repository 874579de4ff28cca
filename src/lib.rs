//! Life Shaper - A deep Q-learning agent that toggles Game of Life cells
//! until the grid matches a target pattern
//!
//! This library provides:
//! - Game of Life grid, pattern catalog and shaping environment (life module)
//! - DQN training infrastructure and model persistence (rl module)
//! - Training statistics and session metrics (metrics module)
//! - TUI rendering and key mapping (render, input modules)
//! - Headless and interactive execution modes (modes module)

pub mod input;
pub mod life;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod rl;
