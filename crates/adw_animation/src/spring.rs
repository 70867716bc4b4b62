//! Spring physics animation
//!
//! Damped harmonic oscillator evaluated in closed form for the critically,
//! under- and over-damped cases. The value depends only on elapsed time, never
//! on the frame rate.
//!
//! A spring has no fixed duration: it finishes once both its distance to the
//! target and its velocity drop under `epsilon`. A clamped spring finishes the
//! first time it reaches the target and never shows a value outside
//! `[value_from, value_to]`.

use std::f64::consts::PI;
use std::ops::Deref;
use std::rc::Rc;

use adw_core::{Host, SpringSettings};

use crate::animation::{Animation, AnimationDuration, AnimationKind, Step};
use crate::target::AnimationTarget;

/// Step used for the numeric derivative in Newton's method, in seconds
const NEWTON_DELTA: f64 = 0.001;
const NEWTON_MAX_ITERATIONS: u32 = 1000;
/// Upper bound, in ms, when searching for a clamped spring's first arrival
const FIRST_ZERO_MAX_MS: u32 = 20_000;

/// Physical parameters of a spring
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringParams {
    damping: f64,
    mass: f64,
    stiffness: f64,
}

impl SpringParams {
    /// Create spring parameters from a damping ratio
    ///
    /// A ratio of 1 is critically damped, below 1 oscillates, above 1 settles
    /// slowly without overshooting.
    pub fn new(damping_ratio: f64, mass: f64, stiffness: f64) -> Self {
        assert!(damping_ratio >= 0.0, "damping ratio must be non-negative");
        assert!(mass > 0.0, "mass must be positive");
        assert!(stiffness > 0.0, "stiffness must be positive");

        let critical = 2.0 * (mass * stiffness).sqrt();
        Self::new_full(damping_ratio * critical, mass, stiffness)
    }

    /// Create spring parameters from a raw damping coefficient
    pub fn new_full(damping: f64, mass: f64, stiffness: f64) -> Self {
        assert!(damping >= 0.0, "damping must be non-negative");
        assert!(mass > 0.0, "mass must be positive");
        assert!(stiffness > 0.0, "stiffness must be positive");

        Self {
            damping,
            mass,
            stiffness,
        }
    }

    /// Create spring parameters from a damping ratio and a perceptual
    /// response time in seconds
    pub fn from_response(damping_ratio: f64, response: f64, mass: f64) -> Self {
        assert!(response > 0.0, "response must be positive");
        assert!(damping_ratio >= 0.0, "damping ratio must be non-negative");

        let stiffness = (2.0 * PI / response).powi(2) * mass;
        let damping = 4.0 * PI * damping_ratio * mass / response;
        Self::new_full(damping, mass, stiffness)
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn damping_ratio(&self) -> f64 {
        self.damping / self.critical_damping()
    }

    /// Damping at which the spring stops oscillating
    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    pub fn is_underdamped(&self) -> bool {
        self.damping < self.critical_damping()
    }

    pub fn is_critically_damped(&self) -> bool {
        (self.damping - self.critical_damping()).abs() < 0.01
    }

    pub fn is_overdamped(&self) -> bool {
        self.damping > self.critical_damping()
    }
}

/// The critically damped spring of the default settings
impl Default for SpringParams {
    fn default() -> Self {
        Self::from(&SpringSettings::default())
    }
}

impl From<&SpringSettings> for SpringParams {
    fn from(settings: &SpringSettings) -> Self {
        Self::new(settings.damping_ratio, settings.mass, settings.stiffness)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct SpringState {
    pub(crate) params: SpringParams,
    pub(crate) value_from: f64,
    pub(crate) value_to: f64,
    pub(crate) initial_velocity: f64,
    pub(crate) velocity: f64,
    pub(crate) epsilon: f64,
    pub(crate) clamp: bool,
    estimated: Option<AnimationDuration>,
}

impl SpringState {
    fn new(value_from: f64, value_to: f64, params: SpringParams) -> Self {
        Self {
            params,
            value_from,
            value_to,
            initial_velocity: 0.0,
            velocity: 0.0,
            epsilon: 0.001,
            clamp: false,
            estimated: None,
        }
    }

    fn invalidate(&mut self) {
        self.estimated = None;
    }

    /// Value and velocity (units per second) after `time` ms
    fn oscillate(&self, time: f64) -> (f64, f64) {
        let SpringParams {
            damping: b,
            mass: m,
            stiffness: k,
        } = self.params;
        let v0 = self.initial_velocity;
        let t = time / 1000.0;

        let beta = b / (2.0 * m);
        let omega0 = (k / m).sqrt();
        let x0 = self.value_from - self.value_to;

        if (beta - omega0).abs() < f64::from(f32::EPSILON) {
            let envelope = (-beta * t).exp();
            let velocity = envelope * (-beta * t * v0 - beta * beta * t * x0 + v0);
            let value = self.value_to + envelope * (x0 + (beta * x0 + v0) * t);
            return (value, velocity);
        }

        if beta < omega0 {
            let envelope = (-beta * t).exp();
            let omega1 = (omega0 * omega0 - beta * beta).sqrt();
            let (sin, cos) = (omega1 * t).sin_cos();
            let velocity =
                envelope * (v0 * cos - (x0 * omega1 + (beta * beta * x0 + beta * v0) / omega1) * sin);
            let value = self.value_to + envelope * (x0 * cos + ((beta * x0 + v0) / omega1) * sin);
            return (value, velocity);
        }

        // e^(-beta t) folded into cosh/sinh so large t decays instead of
        // overflowing
        let omega2 = (beta * beta - omega0 * omega0).sqrt();
        let slow = ((omega2 - beta) * t).exp();
        let fast = (-(omega2 + beta) * t).exp();
        let cosh = 0.5 * (slow + fast);
        let sinh = 0.5 * (slow - fast);
        let velocity = v0 * cosh + (omega2 * x0 - (beta * beta * x0 + beta * v0) / omega2) * sinh;
        let value = self.value_to + x0 * cosh + ((beta * x0 + v0) / omega2) * sinh;
        (value, velocity)
    }

    /// First time, in ms, the spring reaches its target
    fn first_zero(&self) -> AnimationDuration {
        let rising = self.value_to > self.value_from;

        // Skip t = 0 so a spring starting on its target is not trivially done
        let mut i = 1;
        loop {
            let (y, _) = self.oscillate(f64::from(i));
            let remaining = if rising {
                self.value_to - y
            } else {
                y - self.value_to
            };
            if remaining <= self.epsilon {
                return AnimationDuration::Millis(i);
            }
            if i >= FIRST_ZERO_MAX_MS {
                return AnimationDuration::Infinite;
            }
            i += 1;
        }
    }

    fn calculate_duration(&self) -> AnimationDuration {
        let beta = self.params.damping / (2.0 * self.params.mass);

        if beta <= f64::EPSILON {
            return AnimationDuration::Infinite;
        }

        if self.clamp {
            if (self.value_to - self.value_from).abs() <= f64::EPSILON {
                return AnimationDuration::Millis(0);
            }
            return self.first_zero();
        }

        let omega0 = (self.params.stiffness / self.params.mass).sqrt();

        // Time at which the envelope drops under epsilon
        let mut x0 = -self.epsilon.ln() / beta;

        if (beta - omega0).abs() < f64::from(f32::EPSILON) || beta < omega0 {
            return millis(x0);
        }

        // Overdamped: no oscillation to bound, find where the value gets
        // within epsilon with Newton's method
        let value_at = |secs: f64| self.oscillate(secs * 1000.0).0;
        let mut y0 = value_at(x0);
        let slope = (value_at(x0 + NEWTON_DELTA) - y0) / NEWTON_DELTA;
        let mut x1 = (self.value_to - y0 + slope * x0) / slope;
        let mut y1 = value_at(x1);

        let mut i = 0;
        while (self.value_to - y1).abs() > self.epsilon {
            if i > NEWTON_MAX_ITERATIONS || !x1.is_finite() {
                tracing::warn!("SpringAnimation: duration estimate did not converge");
                return AnimationDuration::Infinite;
            }
            x0 = x1;
            y0 = y1;
            let slope = (value_at(x0 + NEWTON_DELTA) - y0) / NEWTON_DELTA;
            x1 = (self.value_to - y0 + slope * x0) / slope;
            y1 = value_at(x1);
            i += 1;
        }

        if !x1.is_finite() {
            return AnimationDuration::Infinite;
        }
        millis(x1)
    }

    pub(crate) fn estimate_duration(&mut self) -> AnimationDuration {
        match self.estimated {
            Some(duration) => duration,
            None => {
                let duration = self.calculate_duration();
                self.estimated = Some(duration);
                duration
            }
        }
    }

    pub(crate) fn step(&mut self, elapsed_ms: u64) -> Step {
        let (value, velocity) = self.oscillate(elapsed_ms as f64);
        self.velocity = velocity;

        if self.clamp && self.value_to != self.value_from {
            let direction = (self.value_to - self.value_from).signum();
            if (self.value_to - value) * direction <= self.epsilon {
                return Step::Done;
            }
            let (low, high) = if self.value_from < self.value_to {
                (self.value_from, self.value_to)
            } else {
                (self.value_to, self.value_from)
            };
            return Step::Running(value.clamp(low, high));
        }

        if (value - self.value_to).abs() < self.epsilon && velocity.abs() < self.epsilon {
            return Step::Done;
        }
        Step::Running(value)
    }

    pub(crate) fn reset(&mut self) -> f64 {
        self.velocity = self.initial_velocity;
        self.value_from
    }

    pub(crate) fn finish(&mut self) -> f64 {
        self.velocity = 0.0;
        self.value_to
    }
}

fn millis(secs: f64) -> AnimationDuration {
    AnimationDuration::Millis((secs * 1000.0).max(0.0) as u32)
}

/// An animation driven by a damped spring
///
/// Derefs to [`Animation`] for playback control.
#[derive(Clone, Debug)]
pub struct SpringAnimation {
    animation: Animation,
}

impl SpringAnimation {
    pub fn new<H>(host: &Rc<H>, value_from: f64, value_to: f64, params: SpringParams, target: AnimationTarget) -> Self
    where
        H: Host + 'static,
    {
        assert!(value_from.is_finite(), "value_from must be finite");
        assert!(value_to.is_finite(), "value_to must be finite");

        let state = SpringState::new(value_from, value_to, params);
        Self {
            animation: Animation::new(host, target, AnimationKind::Spring(state)),
        }
    }

    /// The underlying animation handle
    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    fn read<R>(&self, f: impl FnOnce(&SpringState) -> R) -> R {
        self.animation.with_kind(|kind| match kind {
            AnimationKind::Spring(state) => f(state),
            AnimationKind::Timed(_) => unreachable!("spring animation with timed parameters"),
        })
    }

    fn update(&self, f: impl FnOnce(&mut SpringState)) {
        self.animation.with_kind(|kind| match kind {
            AnimationKind::Spring(state) => {
                f(state);
                state.invalidate();
            }
            AnimationKind::Timed(_) => unreachable!("spring animation with timed parameters"),
        });
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn value_from(&self) -> f64 {
        self.read(|s| s.value_from)
    }

    pub fn set_value_from(&self, value: f64) {
        assert!(value.is_finite(), "value_from must be finite");
        self.update(|s| s.value_from = value);
    }

    pub fn value_to(&self) -> f64 {
        self.read(|s| s.value_to)
    }

    pub fn set_value_to(&self, value: f64) {
        assert!(value.is_finite(), "value_to must be finite");
        self.update(|s| s.value_to = value);
    }

    pub fn spring_params(&self) -> SpringParams {
        self.read(|s| s.params)
    }

    pub fn set_spring_params(&self, params: SpringParams) {
        self.update(|s| s.params = params);
    }

    /// Velocity at the start of a run, in units per second
    pub fn initial_velocity(&self) -> f64 {
        self.read(|s| s.initial_velocity)
    }

    pub fn set_initial_velocity(&self, velocity: f64) {
        assert!(velocity.is_finite(), "initial velocity must be finite");
        self.update(|s| s.initial_velocity = velocity);
    }

    /// Current velocity, in units per second
    pub fn velocity(&self) -> f64 {
        self.read(|s| s.velocity)
    }

    /// Settle threshold for both distance and velocity
    pub fn epsilon(&self) -> f64 {
        self.read(|s| s.epsilon)
    }

    pub fn set_epsilon(&self, epsilon: f64) {
        assert!(epsilon > 0.0, "epsilon must be positive");
        self.update(|s| s.epsilon = epsilon);
    }

    pub fn clamp(&self) -> bool {
        self.read(|s| s.clamp)
    }

    /// Keep the shown value within `[value_from, value_to]` and finish on the
    /// first arrival
    pub fn set_clamp(&self, clamp: bool) {
        self.update(|s| s.clamp = clamp);
    }

    /// Estimated time to settle
    pub fn estimated_duration(&self) -> AnimationDuration {
        self.animation.estimate_duration()
    }
}

impl Deref for SpringAnimation {
    type Target = Animation;

    fn deref(&self) -> &Animation {
        &self.animation
    }
}
