//! Adwaita Animation Engine
//!
//! Frame-clock driven animations that write a single `f64` into a target.
//!
//! # Features
//!
//! - **Easing**: Penner curves, CSS keyword curves and custom cubic Béziers
//! - **Timed Animations**: fixed duration with repeat, reverse and alternate
//! - **Spring Animations**: closed-form damped oscillator, frame-rate independent
//! - **Shared Lifecycle**: play, pause, resume, skip, stop and reset, with a
//!   single `done` notification per run
//! - **Host Aware**: jumps straight to the end when the host is unmapped or
//!   animations are disabled, and cancels when the host gets unmapped

pub mod animation;
pub mod easing;
pub mod spring;
pub mod target;
pub mod timed;
pub mod values;

pub use animation::{Animation, AnimationDuration, AnimationState};
pub use easing::{cubic_bezier, ease, Easing};
pub use spring::{SpringAnimation, SpringParams};
pub use target::AnimationTarget;
pub use timed::TimedAnimation;
pub use values::lerp;
