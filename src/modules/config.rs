use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::modules::error::ConfigError;

pub const DEFAULT_GRID_SIZE: i64 = 2;
pub const DEFAULT_AGENT_COUNT: i64 = 5;
pub const DEFAULT_ITERATIONS: i64 = 10;

/// Simulation options as supplied by a caller or a JSON config file.
///
/// Values are kept signed so that out-of-range input reaches
/// [`validate`](Self::validate) and is reported there rather than failing
/// to parse. Keys are accepted in snake_case or camelCase; anything else is
/// an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub seed: Option<u64>,
    #[serde(alias = "gridSize")]
    pub grid_size: i64,
    #[serde(alias = "characters", alias = "agentCount")]
    pub agent_count: i64,
    pub iterations: i64,
    #[serde(alias = "showLabels")]
    pub show_labels: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            grid_size: DEFAULT_GRID_SIZE,
            agent_count: DEFAULT_AGENT_COUNT,
            iterations: DEFAULT_ITERATIONS,
            show_labels: false,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check every parameter and fix the seed, drawing one from the clock
    /// when none was given.
    pub fn validate(&self) -> Result<WorldParams, ConfigError> {
        let seed = self.seed.unwrap_or_else(seed_from_clock);
        WorldParams::new(seed, self.grid_size, self.agent_count, self.iterations)
    }
}

/// Microseconds since the Unix epoch.
pub fn seed_from_clock() -> u64 {
    Utc::now().timestamp_micros().unsigned_abs()
}

/// Checked parameters of one run. The simulation is a pure function of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldParams {
    seed: u64,
    grid_size: usize,
    agent_count: usize,
    iterations: u64,
}

impl WorldParams {
    pub fn new(
        seed: u64,
        grid_size: i64,
        agent_count: i64,
        iterations: i64,
    ) -> Result<Self, ConfigError> {
        let grid_size = usize::try_from(grid_size)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(ConfigError::GridSize(grid_size))?;
        let agent_count = usize::try_from(agent_count)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::AgentCount(agent_count))?;
        let iterations =
            u64::try_from(iterations).map_err(|_| ConfigError::Iterations(iterations))?;

        Ok(Self {
            seed,
            grid_size,
            agent_count,
            iterations,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        let config = SimulationConfig {
            seed: Some(11),
            ..SimulationConfig::default()
        };
        let params = config.validate().unwrap();
        assert_eq!(params.seed(), 11);
        assert_eq!(params.grid_size(), 2);
        assert_eq!(params.agent_count(), 5);
        assert_eq!(params.iterations(), 10);
    }

    #[test]
    fn rejects_non_positive_grid() {
        assert!(matches!(
            WorldParams::new(0, 0, 3, 3),
            Err(ConfigError::GridSize(0))
        ));
        assert!(matches!(
            WorldParams::new(0, -4, 3, 3),
            Err(ConfigError::GridSize(-4))
        ));
    }

    #[test]
    fn rejects_bad_counts() {
        assert!(matches!(
            WorldParams::new(0, 3, -1, 3),
            Err(ConfigError::AgentCount(-1))
        ));
        assert!(matches!(
            WorldParams::new(0, 3, 0, 3),
            Err(ConfigError::AgentCount(0))
        ));
        assert!(matches!(
            WorldParams::new(0, 3, 2, -2),
            Err(ConfigError::Iterations(-2))
        ));
    }

    #[test]
    fn zero_iterations_is_valid() {
        let params = WorldParams::new(5, 1, 1, 0).unwrap();
        assert_eq!(params.iterations(), 0);
    }

    #[test]
    fn missing_seed_comes_from_clock() {
        let params = SimulationConfig::default().validate().unwrap();
        assert!(params.seed() > 0);
    }

    #[test]
    fn loads_partial_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "seed": 42, "grid_size": 6, "characters": 3 }}"#).unwrap();

        let config = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.grid_size, 6);
        assert_eq!(config.agent_count, 3);
        assert_eq!(config.iterations, DEFAULT_ITERATIONS);
        assert!(!config.show_labels);
    }

    #[test]
    fn accepts_camel_case_keys() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{"seed":1,"gridSize":10,"agentCount":3,"iterations":4,"showLabels":true}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            SimulationConfig {
                seed: Some(1),
                grid_size: 10,
                agent_count: 3,
                iterations: 4,
                show_labels: true,
            }
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "seed": 1, "grid_sise": 10 }}"#).unwrap();
        let err = SimulationConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("grid_sise"), "{}", err);
    }

    #[test]
    fn reports_unparsable_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "grid_size = 3").unwrap();
        assert!(matches!(
            SimulationConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
