//! PIDF controller driven by motion-profile setpoints.
//!
//! Each tick the caller installs the profile's target position, velocity
//! and acceleration, then feeds the measured position and velocity.  The
//! output is
//!
//! ```text
//! kP·e + kI·∫e dt + kD·(v* − v) + kV·v* + kA·a* + kF(x, v)
//! ```
//!
//! where `e = x* − x`.  Because the measured velocity is always supplied, the
//! derivative term is the velocity error and needs no finite difference.
//!
//! # Example
//!
//! ```rust
//! use fission_hal::pid::PidfController;
//!
//! let mut pid = PidfController::new(1.0, 0.0, 0.0, 0.1);
//! pid.set_targets(2.0, 0.0, 0.0);
//!
//! let output = pid.update(0.0, 0.0, 0.01);
//! assert!((output - 2.1).abs() < 1e-9); // kP·2 + kF
//! ```

use std::fmt;

use fission_types::PidfCoefficients;

/// Feedforward as a function of measured position and velocity.
pub type Feedforward = Box<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// A tunable PIDF controller.
pub struct PidfController {
    kp: f64,
    ki: f64,
    kd: f64,
    kv: f64,
    ka: f64,
    kf: Feedforward,
    target_position: f64,
    target_velocity: f64,
    target_acceleration: f64,
    integral: f64,
    last_error: Option<f64>,
    output_min: f64,
    output_max: f64,
}

impl PidfController {
    /// PID gains plus a constant feedforward `kf`.
    ///
    /// Output is unclamped by default.
    pub fn new(kp: f64, ki: f64, kd: f64, kf: f64) -> Self {
        Self::with_feedforward(kp, ki, kd, Box::new(move |_, _| kf))
    }

    pub fn from_coefficients(c: PidfCoefficients) -> Self {
        Self::new(c.kp, c.ki, c.kd, c.kf)
    }

    /// PID gains plus an arbitrary feedforward closure (gravity compensation
    /// that depends on position, back-EMF that depends on velocity, …).
    pub fn with_feedforward(kp: f64, ki: f64, kd: f64, kf: Feedforward) -> Self {
        Self {
            kp,
            ki,
            kd,
            kv: 0.0,
            ka: 0.0,
            kf,
            target_position: 0.0,
            target_velocity: 0.0,
            target_acceleration: 0.0,
            integral: 0.0,
            last_error: None,
            output_min: f64::NEG_INFINITY,
            output_max: f64::INFINITY,
        }
    }

    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// Velocity and acceleration feedforward gains, zero by default.
    pub fn set_kinematic_feedforward(&mut self, kv: f64, ka: f64) {
        self.kv = kv;
        self.ka = ka;
    }

    /// Clamp the controller output to `[min, max]`.
    ///
    /// Integral wind-up is also clamped to this range.
    pub fn set_output_limits(&mut self, min: f64, max: f64) {
        self.output_min = min;
        self.output_max = max;
    }

    pub fn set_target_position(&mut self, x: f64) {
        self.target_position = x;
    }

    pub fn set_target_velocity(&mut self, v: f64) {
        self.target_velocity = v;
    }

    pub fn set_target_acceleration(&mut self, a: f64) {
        self.target_acceleration = a;
    }

    /// Install all three profile setpoints at once.
    pub fn set_targets(&mut self, x: f64, v: f64, a: f64) {
        self.target_position = x;
        self.target_velocity = v;
        self.target_acceleration = a;
    }

    pub fn target_position(&self) -> f64 {
        self.target_position
    }

    /// Position error from the last update, if any.
    pub fn last_error(&self) -> Option<f64> {
        self.last_error
    }

    /// Compute the next controller output.
    ///
    /// - `position`, `velocity` – the measured state of the mechanism.
    /// - `dt` – seconds since the previous update.  A non-positive `dt`
    ///   (first tick, or a stalled clock) skips integral accumulation but
    ///   still produces proportional, derivative and feedforward output.
    pub fn update(&mut self, position: f64, velocity: f64, dt: f64) -> f64 {
        let error = self.target_position - position;

        if dt > 0.0 {
            // Trapezoidal integration against the previous error.
            let prev = self.last_error.unwrap_or(error);
            self.integral += 0.5 * (error + prev) * dt;
        }
        let i_raw = self.ki * self.integral;
        let i = i_raw.clamp(self.output_min, self.output_max);
        // Back-calculate integral to prevent wind-up beyond limits.
        if self.ki.abs() > f64::EPSILON {
            self.integral = i / self.ki;
        }
        self.last_error = Some(error);

        let p = self.kp * error;
        let d = self.kd * (self.target_velocity - velocity);
        let ff = self.kv * self.target_velocity
            + self.ka * self.target_acceleration
            + (self.kf)(position, velocity);

        (p + i + d + ff).clamp(self.output_min, self.output_max)
    }

    /// Reset internal state (integral accumulator and error memory).
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
    }
}

impl fmt::Debug for PidfController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PidfController")
            .field("kp", &self.kp)
            .field("ki", &self.ki)
            .field("kd", &self.kd)
            .field("kv", &self.kv)
            .field("ka", &self.ka)
            .field("target_position", &self.target_position)
            .field("target_velocity", &self.target_velocity)
            .field("target_acceleration", &self.target_acceleration)
            .field("integral", &self.integral)
            .finish_non_exhaustive()
    }
}
