//! Robot configuration – a TOML file with the loop rate and every profiled
//! actuator.
//!
//! ```toml
//! loop_hz = 100.0
//!
//! [actuators.lift]
//! device = "lift_motor"
//! retraction_multiplier = 1.5
//!
//! [actuators.lift.wheel]
//! wheel_radius = 0.75
//! gear_ratio = 1.0
//! ticks_per_rev = 384.5
//!
//! [actuators.lift.constraints]
//! max_velocity = 30.0
//! max_acceleration = 60.0
//!
//! [actuators.lift.pid]
//! kp = 0.2
//! ki = 0.0
//! kd = 0.01
//! kf = 0.05
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fission_types::{ActuatorConfig, FissionError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOOP_HZ: f64 = 50.0;

fn default_loop_hz() -> f64 {
    DEFAULT_LOOP_HZ
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Control loop frequency in Hz.
    #[serde(default = "default_loop_hz")]
    pub loop_hz: f64,

    /// Profiled actuators keyed by mechanism name.
    #[serde(default)]
    pub actuators: BTreeMap<String, ActuatorConfig>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            loop_hz: default_loop_hz(),
            actuators: BTreeMap::new(),
        }
    }
}

impl RobotConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, FissionError> {
        let cfg: RobotConfig = toml::from_str(raw)
            .map_err(|e| FissionError::Config(format!("Failed to parse config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String, FissionError> {
        toml::to_string_pretty(self)
            .map_err(|e| FissionError::Config(format!("Failed to serialize config: {e}")))
    }

    fn validate(&self) -> Result<(), FissionError> {
        if !(self.loop_hz.is_finite() && self.loop_hz > 0.0) {
            return Err(FissionError::Config(format!(
                "loop_hz must be positive, got {}",
                self.loop_hz
            )));
        }
        Ok(())
    }
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
///
/// Environment overrides are applied after parsing.
pub fn load_from(path: &Path) -> Result<Option<RobotConfig>, FissionError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        FissionError::Config(format!("Failed to read config at {}: {e}", path.display()))
    })?;
    let mut cfg = RobotConfig::from_toml_str(&raw)?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Write the config to `path`, creating parent directories as needed.
pub fn save_to(cfg: &RobotConfig, path: &Path) -> Result<(), FissionError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            FissionError::Config(format!("Failed to create config directory: {e}"))
        })?;
    }
    let raw = cfg.to_toml_string()?;
    fs::write(path, raw).map_err(|e| {
        FissionError::Config(format!("Failed to write config at {}: {e}", path.display()))
    })
}

/// Apply `FISSION_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `FISSION_LOOP_HZ` | `loop_hz` (ignored unless a positive number) |
pub fn apply_env_overrides(cfg: &mut RobotConfig) {
    if let Ok(v) = std::env::var("FISSION_LOOP_HZ")
        && let Ok(hz) = v.parse::<f64>()
        && hz.is_finite()
        && hz > 0.0
    {
        cfg.loop_hz = hz;
    }
}
