//! [`ProfiledActuator`] – a motor that follows trapezoidal motion profiles.
//!
//! The actuator drives a linear mechanism (spool, lead screw, arm) through a
//! rotary [`Actuator`].  A call to [`set_target`][ProfiledActuator::set_target]
//! plans a profile from the measured state to the target; every control tick
//! [`update`][ProfiledActuator::update] samples that profile at the elapsed
//! time and feeds it through a [`PidfController`] to produce motor power.
//!
//! # Units
//!
//! Everything public is in inches and inches per second.  Encoder readings
//! are converted with
//!
//! ```text
//! inches = wheel_radius · 2π · gear_ratio · ticks / ticks_per_rev
//! ```
//!
//! # Missing configuration
//!
//! Nothing panics when configuration is missing.  Conversions without wheel
//! constants read as 0, a target without motion constraints plans a
//! stationary profile, and an update without PID coefficients writes zero
//! power.  Each case reports one diagnostic through the injected
//! [`DiagnosticSink`] and stays quiet until the missing item is set.
//!
//! Bounds that cannot produce motion (zero, negative or NaN, including a
//! retraction multiplier that scales them there) are treated the same way:
//! the plan is stationary and one
//! [`ConfigurationInvalid`][FissionError::ConfigurationInvalid] diagnostic
//! is reported until the constraints or the multiplier are set again.
//!
//! # Example
//!
//! ```rust
//! use fission_hal::sim::SimHardware;
//! use fission_motion::ProfiledActuator;
//!
//! let (mut hardware, _handles) = SimHardware::new().with_motor("lift").build();
//! let mut lift = ProfiledActuator::from_hardware_map(&mut hardware, "lift").unwrap();
//! lift.set_wheel_constants(0.75, 1.0, 537.7);
//! lift.set_motion_constraints(30.0, 60.0);
//! lift.set_pid_coefficients(0.2, 0.0, 0.01, 0.05);
//!
//! lift.set_target(12.0);
//! let power = lift.update().unwrap();
//! assert!((-1.0..=1.0).contains(&power));
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use fission_hal::{
    Actuator, Clock, DeviceInfo, DiagnosticSink, Direction, ElapsedTimer, HardwareMap,
    PidfController, RunMode, SystemClock, TracingSink, ZeroPowerBehavior,
};
use fission_types::{
    ActuatorConfig, ConfigItem, FissionError, MotionConstraints, MotionState, PidfCoefficients,
    WheelConstants,
};
use tracing::debug;

use crate::profile::{MotionProfile, ProfileGenerator, TrapezoidalGenerator};

/// A motion-profiled, PIDF-controlled motor.
pub struct ProfiledActuator {
    name: String,
    motor: Box<dyn Actuator>,
    wheel: Option<WheelConstants>,
    constraints: Option<MotionConstraints>,
    retraction_multiplier: f64,
    pid: Option<PidfController>,
    profile: Option<MotionProfile>,
    profile_timer: ElapsedTimer,
    last_update: Option<Duration>,
    generator: Box<dyn ProfileGenerator>,
    diagnostics: Arc<dyn DiagnosticSink>,
    reported: Mutex<HashSet<ConfigItem>>,
}

impl ProfiledActuator {
    /// Take ownership of `motor` and prepare it for profiled control: reset
    /// the encoder, switch to raw power, brake at zero power.
    ///
    /// Uses the system clock, `tracing` diagnostics and the trapezoidal
    /// generator; see the `with_*` methods to replace them.
    ///
    /// # Errors
    ///
    /// Returns [`FissionError::HardwareFault`] if the motor rejects any of the
    /// setup commands.
    pub fn new(motor: Box<dyn Actuator>) -> Result<Self, FissionError> {
        let mut actuator = Self {
            name: motor.id().to_string(),
            motor,
            wheel: None,
            constraints: None,
            retraction_multiplier: 1.0,
            pid: None,
            profile: None,
            profile_timer: ElapsedTimer::new(SystemClock::shared()),
            last_update: None,
            generator: Box::new(TrapezoidalGenerator),
            diagnostics: Arc::new(TracingSink),
            reported: Mutex::new(HashSet::new()),
        };
        actuator.prepare_motor()?;
        Ok(actuator)
    }

    /// Acquire the motor registered as `name` and wrap it.
    pub fn from_hardware_map(hardware: &mut HardwareMap, name: &str) -> Result<Self, FissionError> {
        Self::new(hardware.take_motor(name)?)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.profile_timer = ElapsedTimer::new(clock);
        self.last_update = None;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn with_generator(mut self, generator: Box<dyn ProfileGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// (Re)acquire the motor `name` and reset it for profiled control.
    ///
    /// Switching to a different motor hands the previous one back to
    /// `hardware`.  Calling this again with the name of the motor already held only
    /// repeats the reset sequence, so it is safe to call from every
    /// mechanism init.
    pub fn initialize(&mut self, hardware: &mut HardwareMap, name: &str) -> Result<(), FissionError> {
        if name != self.name {
            let motor = hardware.take_motor(name)?;
            let previous = std::mem::replace(&mut self.motor, motor);
            hardware.register_motor(previous);
            self.name = name.to_string();
            self.profile = None;
            self.last_update = None;
        }
        self.prepare_motor()
    }

    fn prepare_motor(&mut self) -> Result<(), FissionError> {
        self.motor.set_mode(RunMode::StopAndResetEncoder)?;
        self.motor.set_mode(RunMode::RunWithoutEncoder)?;
        self.motor.set_zero_power_behavior(ZeroPowerBehavior::Brake)?;
        debug!(actuator = %self.name, "motor reset for profiled control");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── configuration ──────────────────────────────────────────────────────

    /// Geometry used to convert encoder ticks into inches.
    pub fn set_wheel_constants(&mut self, wheel_radius: f64, gear_ratio: f64, ticks_per_rev: f64) {
        self.wheel = Some(WheelConstants::new(wheel_radius, gear_ratio, ticks_per_rev));
        self.clear_reported(ConfigItem::WheelConstants);
    }

    /// Profile bounds in in/s and in/s².
    pub fn set_motion_constraints(&mut self, max_velocity: f64, max_acceleration: f64) {
        self.constraints = Some(MotionConstraints::new(max_velocity, max_acceleration));
        self.clear_reported(ConfigItem::MotionConstraints);
    }

    /// Replace the PIDF controller.  `kf` is a constant added to every
    /// output.  Output is limited to the motor's `[-1, 1]` power range.
    pub fn set_pid_coefficients(&mut self, kp: f64, ki: f64, kd: f64, kf: f64) {
        let mut pid = PidfController::new(kp, ki, kd, kf);
        pid.set_output_limits(-1.0, 1.0);
        self.pid = Some(pid);
        self.clear_reported(ConfigItem::PidCoefficients);
    }

    /// Scale applied to both motion constraints when retracting.
    pub fn set_retraction_multiplier(&mut self, multiplier: f64) {
        self.retraction_multiplier = multiplier;
        self.clear_reported(ConfigItem::MotionConstraints);
    }

    /// Apply every section present in `config`.
    pub fn apply_config(&mut self, config: &ActuatorConfig) {
        if let Some(w) = config.wheel {
            self.set_wheel_constants(w.wheel_radius, w.gear_ratio, w.ticks_per_rev);
        }
        if let Some(c) = config.constraints {
            self.set_motion_constraints(c.max_velocity, c.max_acceleration);
        }
        if let Some(PidfCoefficients { kp, ki, kd, kf }) = config.pid {
            self.set_pid_coefficients(kp, ki, kd, kf);
        }
        self.set_retraction_multiplier(config.retraction_multiplier);
    }

    pub fn wheel_constants(&self) -> Option<WheelConstants> {
        self.wheel
    }

    pub fn motion_constraints(&self) -> Option<MotionConstraints> {
        self.constraints
    }

    pub fn retraction_multiplier(&self) -> f64 {
        self.retraction_multiplier
    }

    // ── measurement ────────────────────────────────────────────────────────

    /// Convert encoder ticks (or ticks/s) to inches (or in/s).  Reads 0 when
    /// wheel constants are missing.
    pub fn encoder_ticks_to_inches(&self, ticks: f64) -> f64 {
        match self.wheel {
            Some(wheel) => wheel.ticks_to_inches(ticks),
            None => {
                self.report_missing(ConfigItem::WheelConstants);
                0.0
            }
        }
    }

    /// Inches from the position the encoder was last reset at.
    pub fn position(&self) -> f64 {
        self.encoder_ticks_to_inches(self.motor.current_position() as f64)
    }

    /// Inches per second.
    pub fn velocity(&self) -> f64 {
        self.encoder_ticks_to_inches(self.motor.velocity())
    }

    // ── profiling ──────────────────────────────────────────────────────────

    /// Plan (but do not install) a profile from the measured state to rest at
    /// `target`.  Without usable constraints the plan is stationary at the
    /// current position.
    pub fn generate_profile(
        &self,
        target: f64,
        constraints: Option<MotionConstraints>,
    ) -> MotionProfile {
        let start = MotionState::new(self.position(), self.velocity(), 0.0, 0.0);
        let goal = MotionState::at_rest(target);
        match constraints {
            Some(c) if c.is_usable() => {
                self.generator
                    .generate(start, goal, c.max_velocity, c.max_acceleration)
            }
            Some(c) => {
                self.report_once(ConfigItem::MotionConstraints, || {
                    FissionError::ConfigurationInvalid {
                        component: self.name.clone(),
                        item: ConfigItem::MotionConstraints,
                        details: format!(
                            "max_velocity = {}, max_acceleration = {}; both must be positive and finite",
                            c.max_velocity, c.max_acceleration
                        ),
                    }
                });
                self.generator.generate(start, goal, 0.0, 0.0)
            }
            None => {
                self.report_missing(ConfigItem::MotionConstraints);
                self.generator.generate(start, goal, 0.0, 0.0)
            }
        }
    }

    /// Start a new move to `target` inches.  Retractions (targets below the
    /// current position) scale both constraints by the retraction
    /// multiplier.
    pub fn set_target(&mut self, target: f64) {
        let retracting = target < self.position();
        let multiplier = self.retraction_multiplier;
        let constraints = self
            .constraints
            .map(|c| if retracting { c.scaled(multiplier) } else { c });
        let profile = self.generate_profile(target, constraints);
        self.install(profile);
    }

    /// Like [`set_target`][Self::set_target], but a retraction scales
    /// velocity by `velocity_multiplier` instead.  Acceleration still uses
    /// the instance retraction multiplier.
    pub fn set_target_with_multiplier(&mut self, target: f64, velocity_multiplier: f64) {
        let retracting = target < self.position();
        let accel_multiplier = self.retraction_multiplier;
        let constraints = self.constraints.map(|c| {
            if retracting {
                MotionConstraints::new(
                    c.max_velocity * velocity_multiplier,
                    c.max_acceleration * accel_multiplier,
                )
            } else {
                c
            }
        });
        let profile = self.generate_profile(target, constraints);
        self.install(profile);
    }

    fn install(&mut self, profile: MotionProfile) {
        debug!(
            actuator = %self.name,
            from = profile.start().x,
            to = profile.end().x,
            duration = profile.duration(),
            "new motion profile"
        );
        self.profile = Some(profile);
        self.profile_timer.reset();
        self.last_update = None;
    }

    pub fn profile(&self) -> Option<&MotionProfile> {
        self.profile.as_ref()
    }

    /// Target of the active profile.
    pub fn target(&self) -> Option<f64> {
        self.profile.as_ref().map(|p| p.end().x)
    }

    /// Seconds since the active profile started.
    pub fn profile_elapsed(&self) -> f64 {
        self.profile_timer.seconds()
    }

    /// `true` once the elapsed time exceeds the profile's duration.  With no
    /// profile there is nothing left to do, so this is also `true`.
    pub fn is_profile_done(&self) -> bool {
        match &self.profile {
            Some(profile) => self.profile_timer.seconds() > profile.duration(),
            None => true,
        }
    }

    /// One control tick: sample the profile, step the PIDF, write power.
    ///
    /// Returns the power written.
    ///
    /// # Errors
    ///
    /// - [`FissionError::SetupMissing`] if no target has been set; no power
    ///   is written.
    /// - [`FissionError::HardwareFault`] if the motor rejects the power
    ///   command.
    pub fn update(&mut self) -> Result<f64, FissionError> {
        let setpoint = match &self.profile {
            Some(profile) => profile.sample(self.profile_timer.seconds()),
            None => {
                return Err(FissionError::SetupMissing {
                    component: self.name.clone(),
                    details: "update() called before set_target()".to_string(),
                });
            }
        };

        let now = self.profile_timer.clock().now();
        let dt = self
            .last_update
            .map(|prev| now.saturating_sub(prev).as_secs_f64())
            .unwrap_or(0.0);
        self.last_update = Some(now);

        let position = self.position();
        let velocity = self.velocity();

        let power = match self.pid.as_mut() {
            Some(pid) => {
                pid.set_targets(setpoint.x, setpoint.v, setpoint.a);
                pid.update(position, velocity, dt)
            }
            None => {
                self.report_missing(ConfigItem::PidCoefficients);
                0.0
            }
        };
        self.motor.set_power(power)?;
        Ok(power)
    }

    // ── pass-through ───────────────────────────────────────────────────────

    /// Write raw power, bypassing the profile.  The next
    /// [`update`][Self::update] overwrites it.
    pub fn set_power(&mut self, power: f64) -> Result<(), FissionError> {
        self.motor.set_power(power)
    }

    pub fn power(&self) -> f64 {
        self.motor.power()
    }

    pub fn set_direction(&mut self, direction: Direction) -> Result<(), FissionError> {
        self.motor.set_direction(direction)
    }

    pub fn direction(&self) -> Direction {
        self.motor.direction()
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.motor.device_info()
    }

    pub fn reset_device_configuration(&mut self) -> Result<(), FissionError> {
        self.motor.reset_device_configuration()
    }

    pub fn close(&mut self) {
        self.motor.close();
    }

    // ── diagnostics ────────────────────────────────────────────────────────

    fn report_missing(&self, item: ConfigItem) {
        self.report_once(item, || FissionError::ConfigurationMissing {
            component: self.name.clone(),
            item,
        });
    }

    /// Report the diagnostic built by `diagnostic` unless `item` has already
    /// been reported since it was last set.
    fn report_once(&self, item: ConfigItem, diagnostic: impl FnOnce() -> FissionError) {
        let mut reported = self.reported.lock().unwrap_or_else(PoisonError::into_inner);
        if reported.insert(item) {
            self.diagnostics.report(&diagnostic());
        }
    }

    fn clear_reported(&self, item: ConfigItem) {
        self.reported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&item);
    }
}

impl std::fmt::Debug for ProfiledActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfiledActuator")
            .field("name", &self.name)
            .field("wheel", &self.wheel)
            .field("constraints", &self.constraints)
            .field("retraction_multiplier", &self.retraction_multiplier)
            .field("pid", &self.pid)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}
