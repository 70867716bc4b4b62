//! Timed animations
//!
//! Interpolates between two values over a fixed duration using an easing
//! curve. A run can repeat (forever when `repeat_count` is 0), alternate its
//! direction on every other iteration and play reversed.

use std::ops::Deref;
use std::rc::Rc;

use adw_core::Host;

use crate::animation::{Animation, AnimationDuration, AnimationKind, Step};
use crate::easing::Easing;
use crate::target::AnimationTarget;
use crate::values::lerp;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TimedParams {
    pub(crate) value_from: f64,
    pub(crate) value_to: f64,
    pub(crate) duration: AnimationDuration,
    pub(crate) easing: Easing,
    /// 0 repeats forever
    pub(crate) repeat_count: u32,
    pub(crate) reverse: bool,
    pub(crate) alternate: bool,
}

impl TimedParams {
    fn new(value_from: f64, value_to: f64, duration: AnimationDuration) -> Self {
        Self {
            value_from,
            value_to,
            duration,
            easing: Easing::default(),
            repeat_count: 1,
            reverse: false,
            alternate: false,
        }
    }

    pub(crate) fn estimate_duration(&self) -> AnimationDuration {
        match self.duration {
            AnimationDuration::Infinite => AnimationDuration::Infinite,
            AnimationDuration::Millis(0) => AnimationDuration::Millis(0),
            AnimationDuration::Millis(_) if self.repeat_count == 0 => AnimationDuration::Infinite,
            AnimationDuration::Millis(ms) => {
                let total = u64::from(ms) * u64::from(self.repeat_count);
                AnimationDuration::Millis(total.min(u64::from(u32::MAX)) as u32)
            }
        }
    }

    /// Whether iteration `iteration` runs from `value_to` back to `value_from`
    fn is_reversed(&self, iteration: u64) -> bool {
        let alternated = self.alternate && iteration % 2 == 1;
        alternated != self.reverse
    }

    fn value_at(&self, elapsed_ms: u64) -> f64 {
        let ms = match self.duration {
            AnimationDuration::Millis(0) => return self.end_value(),
            AnimationDuration::Millis(ms) => u64::from(ms),
            AnimationDuration::Infinite => return self.start_value(),
        };

        let iteration = elapsed_ms / ms;
        let progress = (elapsed_ms % ms) as f64 / ms as f64;
        let progress = if self.is_reversed(iteration) {
            1.0 - progress
        } else {
            progress
        };

        lerp(self.value_from, self.value_to, self.easing.apply(progress))
    }

    pub(crate) fn step(&self, elapsed_ms: u64) -> Step {
        if let AnimationDuration::Millis(total) = self.estimate_duration() {
            if elapsed_ms >= u64::from(total) {
                return Step::Done;
            }
        }
        Step::Running(self.value_at(elapsed_ms))
    }

    pub(crate) fn start_value(&self) -> f64 {
        if self.is_reversed(0) {
            self.value_to
        } else {
            self.value_from
        }
    }

    /// Exact value at the end of the last iteration
    pub(crate) fn end_value(&self) -> f64 {
        let last = u64::from(self.repeat_count.max(1) - 1);
        if self.is_reversed(last) {
            self.value_from
        } else {
            self.value_to
        }
    }
}

/// An animation interpolating between two values over a fixed duration
///
/// Derefs to [`Animation`] for playback control.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use adw_animation::{AnimationTarget, Easing, TimedAnimation};
/// use adw_core::{ManualFrameClock, Widget};
///
/// let clock = Rc::new(ManualFrameClock::new());
/// let widget = Widget::new(clock.clone());
/// widget.map();
///
/// let value = Rc::new(Cell::new(0.0));
/// let animation = TimedAnimation::new(&widget, 0.0, 10.0, 1000, AnimationTarget::cell(value.clone()));
/// animation.set_easing(Easing::Linear);
/// animation.play();
///
/// clock.advance(500);
/// assert!((value.get() - 5.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct TimedAnimation {
    animation: Animation,
}

impl TimedAnimation {
    /// Create an animation from `value_from` to `value_to` lasting
    /// `duration_ms` milliseconds
    pub fn new<H>(host: &Rc<H>, value_from: f64, value_to: f64, duration_ms: u32, target: AnimationTarget) -> Self
    where
        H: Host + 'static,
    {
        Self::with_duration(host, value_from, value_to, AnimationDuration::Millis(duration_ms), target)
    }

    /// Like [`TimedAnimation::new`], accepting an infinite duration
    pub fn with_duration<H>(
        host: &Rc<H>,
        value_from: f64,
        value_to: f64,
        duration: AnimationDuration,
        target: AnimationTarget,
    ) -> Self
    where
        H: Host + 'static,
    {
        assert!(value_from.is_finite(), "value_from must be finite");
        assert!(value_to.is_finite(), "value_to must be finite");

        let params = TimedParams::new(value_from, value_to, duration);
        Self {
            animation: Animation::new(host, target, AnimationKind::Timed(params)),
        }
    }

    /// The underlying animation handle
    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    fn params(&self) -> TimedParams {
        self.animation.with_kind(|kind| match kind {
            AnimationKind::Timed(params) => *params,
            AnimationKind::Spring(_) => unreachable!("timed animation with spring parameters"),
        })
    }

    fn update(&self, f: impl FnOnce(&mut TimedParams)) {
        self.animation.with_kind(|kind| match kind {
            AnimationKind::Timed(params) => f(params),
            AnimationKind::Spring(_) => unreachable!("timed animation with spring parameters"),
        });
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub fn value_from(&self) -> f64 {
        self.params().value_from
    }

    pub fn set_value_from(&self, value: f64) {
        assert!(value.is_finite(), "value_from must be finite");
        self.update(|p| p.value_from = value);
    }

    pub fn value_to(&self) -> f64 {
        self.params().value_to
    }

    pub fn set_value_to(&self, value: f64) {
        assert!(value.is_finite(), "value_to must be finite");
        self.update(|p| p.value_to = value);
    }

    pub fn duration(&self) -> AnimationDuration {
        self.params().duration
    }

    pub fn set_duration(&self, duration: impl Into<AnimationDuration>) {
        let duration = duration.into();
        self.update(|p| p.duration = duration);
    }

    pub fn easing(&self) -> Easing {
        self.params().easing
    }

    pub fn set_easing(&self, easing: Easing) {
        self.update(|p| p.easing = easing);
    }

    /// Number of iterations, 0 for infinite
    pub fn repeat_count(&self) -> u32 {
        self.params().repeat_count
    }

    pub fn set_repeat_count(&self, count: u32) {
        self.update(|p| p.repeat_count = count);
    }

    pub fn reverse(&self) -> bool {
        self.params().reverse
    }

    /// Play from `value_to` to `value_from`
    pub fn set_reverse(&self, reverse: bool) {
        self.update(|p| p.reverse = reverse);
    }

    pub fn alternate(&self) -> bool {
        self.params().alternate
    }

    /// Flip direction on every other iteration
    pub fn set_alternate(&self, alternate: bool) {
        self.update(|p| p.alternate = alternate);
    }
}

impl Deref for TimedAnimation {
    type Target = Animation;

    fn deref(&self) -> &Animation {
        &self.animation
    }
}
