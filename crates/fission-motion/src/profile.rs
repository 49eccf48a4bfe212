//! Single-axis motion profiles.
//!
//! A [`MotionProfile`] is a piecewise constant-acceleration plan: a list of
//! [`MotionSegment`]s played back to back.  Sampling it at a time offset
//! yields the [`MotionState`] the mechanism should be in at that instant.
//!
//! Profiles come from a [`ProfileGenerator`].  The stock
//! [`TrapezoidalGenerator`] produces the time-optimal velocity-bounded plan:
//!
//! ```text
//!  v ▲      ______________
//!    │     /              \            trapezoid: cruise reached
//!    │    /                \
//!    │   /                  \          triangle: the move is too short
//!    └──┴────────────────────┴──▶ t    to reach max velocity
//! ```
//!
//! # Example
//!
//! ```rust
//! use fission_motion::profile::{ProfileGenerator, TrapezoidalGenerator};
//! use fission_types::MotionState;
//!
//! let profile = TrapezoidalGenerator.generate(
//!     MotionState::at_rest(0.0),
//!     MotionState::at_rest(20.0),
//!     10.0,
//!     20.0,
//! );
//! assert!((profile.duration() - 2.5).abs() < 1e-9);
//! assert!((profile.sample(2.5).x - 20.0).abs() < 1e-9);
//! ```

use fission_types::MotionState;

/// Below this a duration or distance is treated as zero.
const EPSILON: f64 = 1e-12;

// ─────────────────────────────────────────────────────────────────────────────
// MotionSegment
// ─────────────────────────────────────────────────────────────────────────────

/// A stretch of constant acceleration starting from `start` and lasting `dt`
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSegment {
    pub start: MotionState,
    pub dt: f64,
}

impl MotionSegment {
    /// State `t` seconds into the segment.
    pub fn get(&self, t: f64) -> MotionState {
        let s = self.start;
        MotionState::new(
            s.x + s.v * t + 0.5 * s.a * t * t,
            s.v + s.a * t,
            s.a,
            0.0,
        )
    }

    pub fn end(&self) -> MotionState {
        self.get(self.dt)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MotionProfile
// ─────────────────────────────────────────────────────────────────────────────

/// A time-parameterised motion plan over `[0, duration]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionProfile {
    segments: Vec<MotionSegment>,
    start: MotionState,
    end: MotionState,
}

impl MotionProfile {
    /// A zero-duration profile that holds `x`.
    pub fn stationary(x: f64) -> Self {
        Self {
            segments: Vec::new(),
            start: MotionState::at_rest(x),
            end: MotionState::at_rest(x),
        }
    }

    pub fn duration(&self) -> f64 {
        self.segments.iter().map(|s| s.dt).sum()
    }

    /// The planned state at `t` seconds.  `t` below zero is clamped to zero;
    /// at or past [`duration`][Self::duration] the terminal state at rest is
    /// returned.
    pub fn sample(&self, t: f64) -> MotionState {
        let t = t.max(0.0);
        if t >= self.duration() {
            return self.end;
        }
        let mut remaining = t;
        for segment in &self.segments {
            if remaining <= segment.dt {
                return segment.get(remaining);
            }
            remaining -= segment.dt;
        }
        self.end
    }

    pub fn start(&self) -> MotionState {
        self.start
    }

    pub fn end(&self) -> MotionState {
        self.end
    }

    pub fn segments(&self) -> &[MotionSegment] {
        &self.segments
    }

    /// Largest speed reached anywhere in the profile.
    pub fn peak_velocity(&self) -> f64 {
        self.segments
            .iter()
            .flat_map(|s| [s.start.v.abs(), s.end().v.abs()])
            .fold(0.0, f64::max)
    }

    /// Largest acceleration magnitude used by any segment.
    pub fn peak_acceleration(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.start.a.abs())
            .fold(0.0, f64::max)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generators
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a profile from a start state to a goal state under velocity and
/// acceleration bounds.
pub trait ProfileGenerator: Send + Sync {
    /// Plan from `start` to `goal`.  Only the goal position is honoured; the
    /// plan always ends at rest.
    fn generate(
        &self,
        start: MotionState,
        goal: MotionState,
        max_velocity: f64,
        max_acceleration: f64,
    ) -> MotionProfile;
}

/// Time-optimal trapezoidal (or triangular) profiles.
///
/// Handles a non-zero start velocity: a start moving away from the goal, or
/// too fast to stop before it, brakes to rest first and then plans a fresh
/// move back; a start faster than `max_velocity` decelerates to cruise.
/// Non-positive or non-finite bounds give a stationary profile at the start
/// position.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrapezoidalGenerator;

impl ProfileGenerator for TrapezoidalGenerator {
    fn generate(
        &self,
        start: MotionState,
        goal: MotionState,
        max_velocity: f64,
        max_acceleration: f64,
    ) -> MotionProfile {
        let bounded = max_velocity.is_finite()
            && max_acceleration.is_finite()
            && max_velocity > 0.0
            && max_acceleration > 0.0;
        if !bounded {
            return MotionProfile::stationary(start.x);
        }
        let vmax = max_velocity;
        let amax = max_acceleration;
        let mut builder = ProfileBuilder::new(start.x, start.v);

        // Brake to rest if moving the wrong way or unable to stop in time.
        if builder.v != 0.0 {
            let d = goal.x - builder.x;
            let wrong_way = d * builder.v <= 0.0;
            let stopping = builder.v * builder.v / (2.0 * amax);
            if wrong_way || stopping > d.abs() + EPSILON {
                let v = builder.v;
                builder.push(-v.signum() * amax, v.abs() / amax);
                builder.v = 0.0;
            }
        }

        let d = goal.x - builder.x;
        if d.abs() < EPSILON && builder.v == 0.0 {
            return builder.finish(start, goal.x);
        }
        let s = d.signum();
        let mut u = s * builder.v;

        if u > vmax {
            builder.push(-s * amax, (u - vmax) / amax);
            builder.v = s * vmax;
            u = vmax;
        }

        let dist = (goal.x - builder.x).abs();
        let vp = vmax.min((amax * dist + 0.5 * u * u).sqrt()).max(u);
        let accel_time = (vp - u) / amax;
        let decel_time = vp / amax;
        let cruise = dist - (vp * vp - u * u) / (2.0 * amax) - vp * vp / (2.0 * amax);
        let cruise_time = if vp > 0.0 { cruise.max(0.0) / vp } else { 0.0 };

        builder.push(s * amax, accel_time);
        builder.push(0.0, cruise_time);
        builder.push(-s * amax, decel_time);
        builder.finish(start, goal.x)
    }
}

struct ProfileBuilder {
    segments: Vec<MotionSegment>,
    x: f64,
    v: f64,
}

impl ProfileBuilder {
    fn new(x: f64, v: f64) -> Self {
        Self {
            segments: Vec::new(),
            x,
            v,
        }
    }

    fn push(&mut self, a: f64, dt: f64) {
        if dt <= EPSILON {
            return;
        }
        let segment = MotionSegment {
            start: MotionState::new(self.x, self.v, a, 0.0),
            dt,
        };
        let end = segment.end();
        self.x = end.x;
        self.v = end.v;
        self.segments.push(segment);
    }

    fn finish(self, start: MotionState, goal_x: f64) -> MotionProfile {
        MotionProfile {
            segments: self.segments,
            start: MotionState::new(start.x, start.v, 0.0, 0.0),
            end: MotionState::at_rest(goal_x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plan(x0: f64, v0: f64, goal: f64, vmax: f64, amax: f64) -> MotionProfile {
        TrapezoidalGenerator.generate(
            MotionState::new(x0, v0, 0.0, 0.0),
            MotionState::at_rest(goal),
            vmax,
            amax,
        )
    }

    #[test]
    fn trapezoid_reaches_cruise() {
        let profile = plan(0.0, 0.0, 20.0, 10.0, 20.0);
        assert!((profile.duration() - 2.5).abs() < 1e-9);
        assert!(profile.sample(0.0).x.abs() < 1e-12);
        assert!((profile.sample(2.5).x - 20.0).abs() < 1e-9);
        assert!(profile.sample(2.5).v.abs() < 1e-12);
        // Mid-cruise.
        let mid = profile.sample(1.25);
        assert!((mid.v - 10.0).abs() < 1e-9);
        assert!((mid.x - 10.0).abs() < 1e-9);
        assert!((profile.peak_velocity() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn short_move_is_triangular() {
        let profile = plan(0.0, 0.0, 1.0, 10.0, 20.0);
        let expected = 2.0 * (1.0f64 / 20.0).sqrt();
        assert!((profile.duration() - expected).abs() < 1e-9);
        assert!(profile.peak_velocity() < 10.0);
        assert_eq!(profile.segments().len(), 2);
        assert!((profile.segments()[1].end().x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn negative_move_mirrors_positive() {
        let fwd = plan(0.0, 0.0, 20.0, 10.0, 20.0);
        let back = plan(20.0, 0.0, 0.0, 10.0, 20.0);
        assert!((fwd.duration() - back.duration()).abs() < 1e-9);
        let t = 0.7;
        assert!((fwd.sample(t).x - (20.0 - back.sample(t).x)).abs() < 1e-9);
        assert!((fwd.sample(t).v + back.sample(t).v).abs() < 1e-9);
    }

    #[test]
    fn sampling_clamps_outside_duration() {
        let profile = plan(3.0, 0.0, 8.0, 10.0, 20.0);
        assert_eq!(profile.sample(-1.0).x, 3.0);
        let after = profile.sample(profile.duration() + 10.0);
        assert_eq!(after, MotionState::at_rest(8.0));
    }

    #[test]
    fn start_velocity_toward_goal_shortens_move() {
        let from_rest = plan(0.0, 0.0, 20.0, 10.0, 20.0);
        let moving = plan(0.0, 5.0, 20.0, 10.0, 20.0);
        assert!(moving.duration() < from_rest.duration());
        assert!((moving.sample(0.0).v - 5.0).abs() < 1e-12);
    }

    #[test]
    fn start_velocity_away_from_goal_brakes_first() {
        let profile = plan(0.0, -4.0, 10.0, 10.0, 20.0);
        let first = profile.segments()[0];
        assert!(first.start.a > 0.0);
        assert!(first.end().v.abs() < 1e-9);
        assert!(first.end().x < 0.0);
        let last = profile.segments().last().unwrap().end();
        assert!((last.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn overshoot_turns_around() {
        // Stopping from 10 in/s at 20 in/s² takes 2.5 in; the goal is 1 in away.
        let profile = plan(0.0, 10.0, 1.0, 10.0, 20.0);
        let brake_end = profile.segments()[0].end();
        assert!((brake_end.x - 2.5).abs() < 1e-9);
        let last = profile.segments().last().unwrap().end();
        assert!((last.x - 1.0).abs() < 1e-9);
        assert!(last.v.abs() < 1e-9);
    }

    #[test]
    fn start_faster_than_cruise_slows_down() {
        let profile = plan(0.0, 15.0, 100.0, 10.0, 20.0);
        assert!((profile.peak_velocity() - 15.0).abs() < 1e-9);
        assert!((profile.segments()[0].end().v - 10.0).abs() < 1e-9);
        let last = profile.segments().last().unwrap().end();
        assert!((last.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_distance_at_rest_is_empty() {
        let profile = plan(4.0, 0.0, 4.0, 10.0, 20.0);
        assert_eq!(profile.duration(), 0.0);
        assert_eq!(profile.sample(0.3), MotionState::at_rest(4.0));
    }

    #[test]
    fn unbounded_constraints_give_stationary_profile() {
        for (vmax, amax) in [(0.0, 20.0), (10.0, 0.0), (f64::NAN, 1.0), (-1.0, -1.0)] {
            let profile = plan(2.0, 1.0, 10.0, vmax, amax);
            assert_eq!(profile, MotionProfile::stationary(2.0));
            assert_eq!(profile.sample(1.0).x, 2.0);
        }
    }

    proptest! {
        #[test]
        fn endpoints_match_start_and_goal(
            x0 in -100.0f64..100.0,
            v0 in -20.0f64..20.0,
            goal in -100.0f64..100.0,
            vmax in 0.5f64..50.0,
            amax in 0.5f64..100.0,
        ) {
            let profile = plan(x0, v0, goal, vmax, amax);
            let s0 = profile.sample(0.0);
            prop_assert!((s0.x - x0).abs() < 1e-9);
            prop_assert!((s0.v - v0).abs() < 1e-9);

            let end = profile.sample(profile.duration());
            prop_assert!((end.x - goal).abs() < 1e-9);
            prop_assert!(end.v.abs() < 1e-12);

            if let Some(last) = profile.segments().last() {
                let reached = last.end();
                prop_assert!((reached.x - goal).abs() < 1e-6 * goal.abs().max(1.0));
                prop_assert!(reached.v.abs() < 1e-6);
            }
        }

        #[test]
        fn bounds_hold_from_rest(
            x0 in -100.0f64..100.0,
            goal in -100.0f64..100.0,
            vmax in 0.5f64..50.0,
            amax in 0.5f64..100.0,
        ) {
            let profile = plan(x0, 0.0, goal, vmax, amax);
            prop_assert!(profile.peak_velocity() <= vmax + 1e-9);
            prop_assert!(profile.peak_acceleration() <= amax + 1e-9);
        }

        #[test]
        fn profile_is_continuous(
            goal in -100.0f64..100.0,
            v0 in -20.0f64..20.0,
        ) {
            let profile = plan(0.0, v0, goal, 10.0, 20.0);
            let mut prev = profile.sample(0.0);
            let steps = 400;
            let dt = profile.duration() / steps as f64;
            for i in 1..=steps {
                let s = profile.sample(i as f64 * dt);
                prop_assert!((s.x - prev.x).abs() <= 20.0 * dt + 1e-6);
                prev = s;
            }
        }
    }
}
