use anyhow::{Result, anyhow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{config::LifeConfig, grid::Grid, pattern::Pattern};

/// The grid-shaping environment
///
/// Owns the live grid, the centred target pattern and the random source used
/// for resets. Actions are linear cell indices (`row * N + col`) that toggle a
/// single cell.
pub struct GridEnvironment {
    config: LifeConfig,
    pattern: &'static Pattern,
    grid: Grid,
    target: Grid,
    rng: StdRng,
}

impl GridEnvironment {
    /// Create an environment seeded from system entropy
    pub fn new(config: LifeConfig) -> Result<Self> {
        Self::build(config, StdRng::from_entropy())
    }

    /// Create an environment with a reproducible random source
    pub fn with_seed(config: LifeConfig, seed: u64) -> Result<Self> {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    fn build(config: LifeConfig, rng: StdRng) -> Result<Self> {
        config.validate().map_err(|e| anyhow!(e))?;
        let pattern = config
            .pattern()
            .ok_or_else(|| anyhow!("unknown pattern '{}'", config.target_pattern))?;

        let mut env = Self {
            grid: Grid::new(config.grid_size),
            target: pattern.centered(config.grid_size),
            config,
            pattern,
            rng,
        };
        env.reset();
        Ok(env)
    }

    /// Re-randomise the grid and reload the centred target
    pub fn reset(&mut self) {
        let density = self.config.initial_density;
        let size = self.config.grid_size;

        let mut grid = Grid::new(size);
        for row in 0..size {
            for col in 0..size {
                grid.set(row, col, self.rng.gen_bool(density));
            }
        }

        self.grid = grid;
        self.target = self.pattern.centered(size);
    }

    /// Toggle the cell at linear index `action`
    ///
    /// Out-of-range actions leave the grid untouched and return `false`.
    pub fn apply_action(&mut self, action: usize) -> bool {
        self.grid.toggle_index(action)
    }

    /// Advance the grid by one generation
    pub fn step(&mut self) {
        let next = self.grid.next_generation(self.config.boundary);
        self.grid = next;
    }

    /// Fraction of cells matching the target
    pub fn similarity(&self) -> f32 {
        self.grid.similarity(&self.target)
    }

    /// Flattened grid handed to the policy as its observation
    pub fn state_vector(&self) -> Vec<f32> {
        self.grid.to_state_vector()
    }

    /// Number of available toggle actions
    pub fn action_space(&self) -> usize {
        self.grid.area()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn target(&self) -> &Grid {
        &self.target
    }

    pub fn config(&self) -> &LifeConfig {
        &self.config
    }

    pub fn auto_evolve(&self) -> bool {
        self.config.auto_evolve
    }

    pub fn set_auto_evolve(&mut self, enabled: bool) {
        self.config.auto_evolve = enabled;
    }

    /// Replace the live grid, e.g. to start from a hand-built position
    ///
    /// Grids of a different size are rejected.
    pub fn set_grid(&mut self, grid: Grid) -> Result<()> {
        if grid.size() != self.config.grid_size {
            return Err(anyhow!(
                "grid size {} does not match environment size {}",
                grid.size(),
                self.config.grid_size
            ));
        }
        self.grid = grid;
        Ok(())
    }
}
