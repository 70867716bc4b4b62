//! Animation base
//!
//! The lifecycle shared by every animation:
//!
//! ```text
//!            play()               natural end / skip()
//!   Idle ─────────────▶ Playing ─────────────────────▶ Finished
//!    │                  │    ▲
//!    │         pause()  │    │ resume()
//!    │                  ▼    │
//!    │                  Paused
//!    │                     │
//!    └──── stop() ─────────┴──────────────────────────▶ Canceled
//! ```
//!
//! `Finished` and `Canceled` are terminal until `reset()` (or `play()`,
//! which resets implicitly). Whatever the path, exactly one `done`
//! notification is emitted per run.
//!
//! While playing, an animation holds a tick callback on its host's frame
//! clock and an unmap observer on the host. Both are released as soon as the
//! animation leaves `Playing`, so a frame already queued by the clock becomes
//! a no-op.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use adw_core::{FrameClock, HandlerId, Host, Signal, TickCallbackId, TickControl};

use crate::spring::SpringState;
use crate::target::AnimationTarget;
use crate::timed::TimedParams;

/// Lifecycle state of an animation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Not started, or reset
    #[default]
    Idle,
    /// Advancing on every frame
    Playing,
    /// Frozen mid-flight, resumable
    Paused,
    /// Reached its end value
    Finished,
    /// Stopped before reaching the end
    Canceled,
}

impl AnimationState {
    /// Whether the state is `Finished` or `Canceled`
    pub fn is_terminal(self) -> bool {
        matches!(self, AnimationState::Finished | AnimationState::Canceled)
    }
}

/// Length of an animation
///
/// `Infinite` is its own variant, never a large number, so it can be tested
/// for exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationDuration {
    Millis(u32),
    Infinite,
}

impl AnimationDuration {
    pub fn is_infinite(self) -> bool {
        matches!(self, AnimationDuration::Infinite)
    }

    /// Finite length in milliseconds
    pub fn as_millis(self) -> Option<u32> {
        match self {
            AnimationDuration::Millis(ms) => Some(ms),
            AnimationDuration::Infinite => None,
        }
    }
}

impl From<u32> for AnimationDuration {
    fn from(ms: u32) -> Self {
        AnimationDuration::Millis(ms)
    }
}

/// Outcome of evaluating an animation at an elapsed time
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Step {
    /// Still running, showing this value
    Running(f64),
    /// Reached the end; the end value is applied through `skip()`
    Done,
}

/// Per-kind parameters and value function
pub(crate) enum AnimationKind {
    Timed(TimedParams),
    Spring(SpringState),
}

impl AnimationKind {
    fn name(&self) -> &'static str {
        match self {
            AnimationKind::Timed(_) => "timed",
            AnimationKind::Spring(_) => "spring",
        }
    }

    fn estimate_duration(&mut self) -> AnimationDuration {
        match self {
            AnimationKind::Timed(params) => params.estimate_duration(),
            AnimationKind::Spring(state) => state.estimate_duration(),
        }
    }

    fn step(&mut self, elapsed_ms: u64) -> Step {
        match self {
            AnimationKind::Timed(params) => params.step(elapsed_ms),
            AnimationKind::Spring(state) => state.step(elapsed_ms),
        }
    }

    fn start_value(&mut self) -> f64 {
        match self {
            AnimationKind::Timed(params) => params.start_value(),
            AnimationKind::Spring(state) => state.reset(),
        }
    }

    fn end_value(&mut self) -> f64 {
        match self {
            AnimationKind::Timed(params) => params.end_value(),
            AnimationKind::Spring(state) => state.finish(),
        }
    }
}

struct TickRegistration {
    clock: Rc<dyn FrameClock>,
    id: TickCallbackId,
}

pub(crate) struct AnimationInner {
    host: Weak<dyn Host>,
    target: AnimationTarget,
    value: f64,
    state: AnimationState,
    /// Frame time the current run started at, in ms
    start_time: i64,
    /// Progress kept across a pause, in ms
    paused_elapsed: Option<i64>,
    tick: Option<TickRegistration>,
    unmap_handler: Option<HandlerId>,
    follow_enable_animations_setting: bool,
    pub(crate) kind: AnimationKind,
}

impl AnimationInner {
    /// Release the tick callback and the unmap observer
    fn detach(&mut self) {
        if let Some(tick) = self.tick.take() {
            tick.clock.remove_tick_callback(tick.id);
        }
        if let Some(handler) = self.unmap_handler.take() {
            if let Some(host) = self.host.upgrade() {
                host.disconnect_unmap(handler);
            }
        }
    }

    /// The clock to run on, or `None` when the animation must jump to its end
    fn runnable_clock(&mut self) -> Option<Rc<dyn FrameClock>> {
        let host = self.host.upgrade()?;

        if !host.is_mapped() {
            tracing::debug!("Animation: host not mapped, skipping to end");
            return None;
        }
        if self.follow_enable_animations_setting && !host.enable_animations() {
            tracing::debug!("Animation: animations disabled, skipping to end");
            return None;
        }
        if self.kind.estimate_duration() == AnimationDuration::Millis(0) {
            return None;
        }

        host.frame_clock()
    }
}

impl Drop for AnimationInner {
    fn drop(&mut self) {
        self.detach();
    }
}

struct AnimationSignals {
    done: Signal<AnimationState>,
    value_changed: Signal<f64>,
}

/// A running or runnable animation
///
/// This is a cheap handle: clones refer to the same animation. Construct one
/// through [`TimedAnimation`](crate::TimedAnimation) or
/// [`SpringAnimation`](crate::SpringAnimation).
#[derive(Clone)]
pub struct Animation {
    inner: Rc<RefCell<AnimationInner>>,
    signals: Rc<AnimationSignals>,
}

impl Animation {
    pub(crate) fn new<H>(host: &Rc<H>, target: AnimationTarget, kind: AnimationKind) -> Self
    where
        H: Host + 'static,
    {
        let host: Rc<dyn Host> = host.clone();
        let mut kind = kind;
        let value = kind.start_value();

        Self {
            inner: Rc::new(RefCell::new(AnimationInner {
                host: Rc::downgrade(&host),
                target,
                value,
                state: AnimationState::Idle,
                start_time: 0,
                paused_elapsed: None,
                tick: None,
                unmap_handler: None,
                follow_enable_animations_setting: true,
                kind,
            })),
            signals: Rc::new(AnimationSignals {
                done: Signal::new(),
                value_changed: Signal::new(),
            }),
        }
    }

    pub(crate) fn with_kind<R>(&self, f: impl FnOnce(&mut AnimationKind) -> R) -> R {
        f(&mut self.inner.borrow_mut().kind)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current value
    pub fn value(&self) -> f64 {
        self.inner.borrow().value
    }

    pub fn state(&self) -> AnimationState {
        self.inner.borrow().state
    }

    /// The host widget, if it is still alive
    pub fn host(&self) -> Option<Rc<dyn Host>> {
        self.inner.borrow().host.upgrade()
    }

    pub fn target(&self) -> AnimationTarget {
        self.inner.borrow().target.clone()
    }

    /// Replace the target. The new target is not written to until the next
    /// value change.
    pub fn set_target(&self, target: AnimationTarget) {
        self.inner.borrow_mut().target = target;
    }

    pub fn follow_enable_animations_setting(&self) -> bool {
        self.inner.borrow().follow_enable_animations_setting
    }

    /// When false, the host's "animations enabled" setting is ignored
    pub fn set_follow_enable_animations_setting(&self, follow: bool) {
        self.inner.borrow_mut().follow_enable_animations_setting = follow;
    }

    /// How long a full run takes
    pub fn estimate_duration(&self) -> AnimationDuration {
        self.inner.borrow_mut().kind.estimate_duration()
    }

    /// Whether a tick callback is currently registered
    pub fn has_tick_callback(&self) -> bool {
        self.inner.borrow().tick.is_some()
    }

    /// Call `handler` with the terminal state when a run ends
    pub fn connect_done<F>(&self, mut handler: F) -> HandlerId
    where
        F: FnMut(AnimationState) + 'static,
    {
        self.signals.done.connect(move |state| handler(*state))
    }

    pub fn disconnect_done(&self, id: HandlerId) {
        self.signals.done.disconnect(id);
    }

    /// Call `handler` after every value change, once the target was updated
    pub fn connect_value_changed<F>(&self, mut handler: F) -> HandlerId
    where
        F: FnMut(f64) + 'static,
    {
        self.signals.value_changed.connect(move |value| handler(*value))
    }

    pub fn disconnect_value_changed(&self, id: HandlerId) {
        self.signals.value_changed.disconnect(id);
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Start the animation from the beginning
    ///
    /// Restarts the animation if it already ran or is running. When the host
    /// is unmapped, animations are disabled or the duration is zero, the
    /// animation jumps straight to its end value and finishes without
    /// registering a tick callback.
    pub fn play(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state == AnimationState::Playing {
                tracing::warn!("Animation: play() on a playing {} animation, restarting", inner.kind.name());
            }
            if inner.state != AnimationState::Idle {
                inner.state = AnimationState::Idle;
                inner.start_time = 0;
                inner.paused_elapsed = None;
            }
        }

        self.start();
    }

    /// Freeze a playing animation at its current value
    pub fn pause(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.state != AnimationState::Playing {
            tracing::debug!("Animation: pause() ignored in state {:?}", inner.state);
            return;
        }

        let now = inner
            .tick
            .as_ref()
            .map(|tick| tick.clock.frame_time() / 1000)
            .unwrap_or(inner.start_time);
        inner.paused_elapsed = Some(now - inner.start_time);
        inner.state = AnimationState::Paused;
        inner.detach();

        tracing::debug!("Animation: paused after {}ms", now - inner.start_time);
    }

    /// Continue a paused animation where it left off
    pub fn resume(&self) {
        let state = self.inner.borrow().state;
        if state != AnimationState::Paused {
            tracing::error!("Animation: resume() on an animation that is not paused ({:?})", state);
            return;
        }

        self.start();
    }

    /// Jump to the end value and finish
    ///
    /// No-op when the animation is already finished or canceled.
    pub fn skip(&self) {
        let value = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                return;
            }

            inner.state = AnimationState::Finished;
            inner.detach();
            inner.start_time = 0;
            inner.paused_elapsed = None;

            let value = inner.kind.end_value();
            inner.value = value;
            tracing::debug!("Animation: {} animation finished at {}", inner.kind.name(), value);
            value
        };

        self.notify_value(value);
        self.signals.done.emit(&AnimationState::Finished);
    }

    /// Cancel the animation, keeping the last value
    ///
    /// No-op when the animation is already finished or canceled.
    pub fn stop(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                return;
            }

            inner.state = AnimationState::Canceled;
            inner.detach();
            inner.paused_elapsed = None;
            tracing::debug!("Animation: {} animation canceled at {}", inner.kind.name(), inner.value);
        }

        self.signals.done.emit(&AnimationState::Canceled);
    }

    /// Return to `Idle` and restore the start value
    pub fn reset(&self) {
        let value = {
            let mut inner = self.inner.borrow_mut();
            inner.detach();
            inner.state = AnimationState::Idle;
            inner.start_time = 0;
            inner.paused_elapsed = None;

            let value = inner.kind.start_value();
            inner.value = value;
            value
        };

        self.notify_value(value);
    }

    // =========================================================================
    // Frame handling
    // =========================================================================

    fn start(&self) {
        let clock = {
            let mut inner = self.inner.borrow_mut();
            inner.state = AnimationState::Playing;
            inner.runnable_clock()
        };

        let Some(clock) = clock else {
            self.skip();
            return;
        };

        let needs_callback = {
            let mut inner = self.inner.borrow_mut();
            let now = clock.frame_time() / 1000;
            inner.start_time = match inner.paused_elapsed.take() {
                Some(elapsed) => now - elapsed,
                None => now,
            };
            tracing::debug!("Animation: playing {} animation from {}ms", inner.kind.name(), inner.start_time);
            inner.tick.is_none()
        };

        if needs_callback {
            self.attach(clock);
        }
    }

    fn attach(&self, clock: Rc<dyn FrameClock>) {
        let inner = Rc::downgrade(&self.inner);
        let signals = Rc::downgrade(&self.signals);
        let id = clock.add_tick_callback(Box::new(move |frame_time| {
            match (inner.upgrade(), signals.upgrade()) {
                (Some(inner), Some(signals)) => Animation { inner, signals }.tick(frame_time),
                _ => TickControl::Remove,
            }
        }));

        let host = self.host();
        let handler = host.as_ref().map(|host| {
            let inner = Rc::downgrade(&self.inner);
            let signals = Rc::downgrade(&self.signals);
            host.connect_unmap(Box::new(move |_: &()| {
                if let (Some(inner), Some(signals)) = (inner.upgrade(), signals.upgrade()) {
                    Animation { inner, signals }.stop();
                }
            }))
        });

        let mut inner = self.inner.borrow_mut();
        inner.tick = Some(TickRegistration { clock, id });
        inner.unmap_handler = handler;
    }

    fn tick(&self, frame_time: i64) -> TickControl {
        let step = {
            let mut inner = self.inner.borrow_mut();
            // Stopped after this frame was queued
            if inner.state != AnimationState::Playing || inner.tick.is_none() {
                return TickControl::Remove;
            }

            let elapsed = (frame_time / 1000 - inner.start_time).max(0) as u64;
            let step = inner.kind.step(elapsed);
            if let Step::Running(value) = step {
                inner.value = value;
            }
            tracing::trace!("Animation: tick at {}ms -> {:?}", elapsed, step);
            step
        };

        match step {
            Step::Running(value) => {
                self.notify_value(value);
                TickControl::Continue
            }
            Step::Done => {
                self.skip();
                TickControl::Remove
            }
        }
    }

    fn notify_value(&self, value: f64) {
        let target = self.inner.borrow().target.clone();
        target.set_value(value);
        self.signals.value_changed.emit(&value);
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Animation")
            .field("kind", &inner.kind.name())
            .field("state", &inner.state)
            .field("value", &inner.value)
            .finish()
    }
}
