use serde::{Deserialize, Serialize};

use super::grid::Boundary;
use super::pattern::Pattern;

/// Configuration for the Game of Life environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    /// Side length of the square grid
    pub grid_size: usize,
    /// Probability that a cell starts alive on reset
    pub initial_density: f64,
    /// Neighbour lookup policy at the grid edge
    pub boundary: Boundary,
    /// Name of the target pattern in the catalog
    pub target_pattern: String,
    /// Advance one generation after every action
    pub auto_evolve: bool,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            initial_density: 0.3,
            boundary: Boundary::Bounded,
            target_pattern: "glider".to_string(),
            auto_evolve: false,
        }
    }
}

impl LifeConfig {
    /// Create a new configuration with a custom grid size
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Same configuration targeting a different pattern
    pub fn with_pattern(mut self, name: &str) -> Self {
        self.target_pattern = name.to_string();
        self
    }

    /// Resolve the configured target pattern
    pub fn pattern(&self) -> Option<&'static Pattern> {
        Pattern::by_name(&self.target_pattern)
    }

    /// Number of cells, which is also the size of the action space
    pub fn area(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn validate(&self) -> Result<(), String> {
        let pattern = self.pattern().ok_or_else(|| {
            format!(
                "unknown target pattern '{}', expected one of: {}",
                self.target_pattern,
                Pattern::names().collect::<Vec<_>>().join(", ")
            )
        })?;

        if self.grid_size < pattern.size() {
            return Err(format!(
                "grid_size ({}) must be at least the pattern size ({})",
                self.grid_size,
                pattern.size()
            ));
        }

        if !(0.0..=1.0).contains(&self.initial_density) {
            return Err(format!(
                "initial_density must be in [0, 1], got {}",
                self.initial_density
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LifeConfig::default();
        assert_eq!(config.grid_size, 10);
        assert_eq!(config.initial_density, 0.3);
        assert_eq!(config.boundary, Boundary::Bounded);
        assert!(!config.auto_evolve);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grid_smaller_than_pattern() {
        let config = LifeConfig::new(5).with_pattern("toad");
        assert!(config.validate().is_err());

        let config = LifeConfig::new(5).with_pattern("block");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_pattern() {
        let config = LifeConfig::default().with_pattern("lwss");
        let err = config.validate().unwrap_err();
        assert!(err.contains("lwss"));
        assert!(err.contains("glider"));
    }

    #[test]
    fn test_density_out_of_range() {
        let mut config = LifeConfig::default();
        config.initial_density = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LifeConfig =
            serde_json::from_str(r#"{"grid_size": 20, "boundary": "toroidal"}"#).unwrap();
        assert_eq!(config.grid_size, 20);
        assert_eq!(config.boundary, Boundary::Toroidal);
        assert_eq!(config.target_pattern, "glider");
    }
}
