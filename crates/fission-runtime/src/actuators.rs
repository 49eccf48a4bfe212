//! Construct [`ProfiledActuator`]s from a [`RobotConfig`].

use std::collections::BTreeMap;
use std::sync::Arc;

use fission_hal::{Clock, DiagnosticSink, HardwareMap, SystemClock, TracingSink};
use fission_motion::ProfiledActuator;
use fission_types::FissionError;
use tracing::info;

use crate::config::RobotConfig;

/// Build one actuator per configured entry, keyed by entry name.
///
/// Each entry acquires the motor named by its `device` field, or by the
/// entry name when `device` is absent.
///
/// # Errors
///
/// Returns [`FissionError::HardwareFault`] for the first entry whose motor
/// is not in `hardware`.
pub fn build_actuators(
    config: &RobotConfig,
    hardware: &mut HardwareMap,
) -> Result<BTreeMap<String, ProfiledActuator>, FissionError> {
    build_actuators_with(config, hardware, SystemClock::shared(), Arc::new(TracingSink))
}

/// [`build_actuators`] with an explicit clock and diagnostic sink shared by
/// every actuator.
pub fn build_actuators_with(
    config: &RobotConfig,
    hardware: &mut HardwareMap,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticSink>,
) -> Result<BTreeMap<String, ProfiledActuator>, FissionError> {
    let mut built = BTreeMap::new();
    for (name, entry) in &config.actuators {
        let device = entry.device.as_deref().unwrap_or(name);
        let mut actuator = ProfiledActuator::from_hardware_map(hardware, device)?
            .with_clock(Arc::clone(&clock))
            .with_diagnostics(Arc::clone(&diagnostics));
        actuator.apply_config(entry);
        info!(actuator = %name, device = %device, "profiled actuator ready");
        built.insert(name.clone(), actuator);
    }
    Ok(built)
}
