//! Configuration file support for Gluco.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/gluco/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub model: SimulationParams,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Parameters of the glucose ODE model and its integration grid.
///
/// The defaults reproduce the reference behavior exactly; every value can
/// be overridden from the config file for parameterized runs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimulationParams {
    /// Resting glucose level (mg/dL) the restoring term pulls toward.
    #[serde(default = "default_baseline")]
    pub baseline_mg_dl: f64,

    /// Hard lower clamp on simulated glucose (mg/dL).
    #[serde(default = "default_floor")]
    pub floor_mg_dl: f64,

    /// Strength of the restoring force toward baseline.
    #[serde(default = "default_k_insulin")]
    pub k_insulin: f64,

    /// Spacing of the simulation grid, in minutes.
    #[serde(default = "default_grid_step")]
    pub grid_step_minutes: f64,

    /// Divisor applied to the Euler step (`dG * dt / reference_step`).
    ///
    /// Invariant: must equal `grid_step_minutes`. The update is an
    /// identity only when the two agree; a mismatch is rejected by
    /// [`SimulationParams::validate`] instead of silently mis-scaling.
    #[serde(default = "default_grid_step")]
    pub reference_step_minutes: f64,

    /// Per-event cap on counted carbohydrates (grams).
    #[serde(default = "default_carb_cap")]
    pub carb_cap_grams: f64,

    /// Time constant of carbohydrate absorption decay (minutes).
    #[serde(default = "default_carb_decay")]
    pub carb_decay_minutes: f64,

    /// Per-event cap on counted exercise duration (minutes).
    #[serde(default = "default_activity_cap")]
    pub activity_cap_minutes: f64,

    /// Time constant of the exercise effect decay (minutes).
    #[serde(default = "default_activity_decay")]
    pub activity_decay_minutes: f64,

    /// Length of the simulated window, in hours.
    #[serde(default = "default_total_hours")]
    pub total_hours: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            baseline_mg_dl: default_baseline(),
            floor_mg_dl: default_floor(),
            k_insulin: default_k_insulin(),
            grid_step_minutes: default_grid_step(),
            reference_step_minutes: default_grid_step(),
            carb_cap_grams: default_carb_cap(),
            carb_decay_minutes: default_carb_decay(),
            activity_cap_minutes: default_activity_cap(),
            activity_decay_minutes: default_activity_decay(),
            total_hours: default_total_hours(),
        }
    }
}

impl SimulationParams {
    /// Validate parameter consistency before a simulation run.
    pub fn validate(&self) -> Result<()> {
        if self.total_hours == 0 {
            return Err(Error::Config("total_hours must be at least 1".into()));
        }
        if self.grid_step_minutes <= 0.0 {
            return Err(Error::Config("grid_step_minutes must be positive".into()));
        }
        if (self.reference_step_minutes - self.grid_step_minutes).abs() > 1e-9 {
            return Err(Error::Config(format!(
                "reference_step_minutes ({}) must equal grid_step_minutes ({})",
                self.reference_step_minutes, self.grid_step_minutes
            )));
        }
        if self.carb_decay_minutes <= 0.0 || self.activity_decay_minutes <= 0.0 {
            return Err(Error::Config("decay constants must be positive".into()));
        }
        if self.carb_cap_grams < 0.0 || self.activity_cap_minutes < 0.0 {
            return Err(Error::Config("event caps must be non-negative".into()));
        }
        if self.floor_mg_dl > self.baseline_mg_dl {
            return Err(Error::Config(
                "floor_mg_dl must not exceed baseline_mg_dl".into(),
            ));
        }
        Ok(())
    }

    /// End of the simulated window, in minutes.
    pub fn total_minutes(&self) -> f64 {
        f64::from(self.total_hours) * 60.0
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("gluco")
}

fn default_baseline() -> f64 {
    100.0
}

fn default_floor() -> f64 {
    40.0
}

fn default_k_insulin() -> f64 {
    0.06
}

fn default_grid_step() -> f64 {
    5.0
}

fn default_carb_cap() -> f64 {
    80.0
}

fn default_carb_decay() -> f64 {
    30.0
}

fn default_activity_cap() -> f64 {
    60.0
}

fn default_activity_decay() -> f64 {
    40.0
}

fn default_total_hours() -> u32 {
    6
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("gluco").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = SimulationParams::default();
        params.validate().unwrap();
        assert_eq!(params.baseline_mg_dl, 100.0);
        assert_eq!(params.k_insulin, 0.06);
        assert_eq!(params.total_minutes(), 360.0);
    }

    #[test]
    fn test_reference_step_mismatch_rejected() {
        let params = SimulationParams {
            reference_step_minutes: 1.0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let params = SimulationParams {
            total_hours: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.model, parsed.model);
        assert_eq!(config.data.data_dir, parsed.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[model]
total_hours = 8
k_insulin = 0.08
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.total_hours, 8);
        assert_eq!(config.model.k_insulin, 0.08);
        assert_eq!(config.model.baseline_mg_dl, 100.0); // default
    }
}
