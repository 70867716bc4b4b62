//! Frame clock
//!
//! The per-vsync timing source animations are driven by. Everything runs on
//! the UI thread: a tick callback is a synchronous, bounded computation that
//! is handed the frame time in microseconds and decides whether it wants the
//! next frame as well.
//!
//! [`ManualFrameClock`] is a deterministic implementation whose time only
//! moves when told to. Headless hosts and tests drive it with
//! [`ManualFrameClock::advance`].

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;

/// Whether a tick callback wants to keep receiving frames
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickControl {
    /// Call again on the next frame
    Continue,
    /// Unregister the callback
    Remove,
}

/// Handle to a registered tick callback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickCallbackId(u64);

impl TickCallbackId {
    /// Raw numeric value of the handle
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

/// Callback invoked once per frame with the frame time in microseconds
pub type TickCallback = Box<dyn FnMut(i64) -> TickControl>;

/// A vsync-aligned source of frames
pub trait FrameClock {
    /// Monotonic time of the current frame, in microseconds
    fn frame_time(&self) -> i64;

    /// Register a callback to run on every frame until it returns
    /// [`TickControl::Remove`] or is removed
    fn add_tick_callback(&self, callback: TickCallback) -> TickCallbackId;

    /// Unregister a tick callback
    ///
    /// Removing a callback that is queued for the frame being dispatched
    /// turns that invocation into a no-op. Unknown ids are ignored.
    fn remove_tick_callback(&self, id: TickCallbackId);
}

/// A frame clock advanced explicitly by its owner
///
/// Callbacks run in registration order. A callback registered while a frame
/// is being dispatched first runs on the following frame.
pub struct ManualFrameClock {
    frame_time: Cell<i64>,
    next_id: Cell<u64>,
    /// `None` while the callback is executing
    callbacks: RefCell<IndexMap<TickCallbackId, Option<TickCallback>>>,
}

impl ManualFrameClock {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a clock whose first frame time is `frame_time` microseconds
    pub fn starting_at(frame_time: i64) -> Self {
        Self {
            frame_time: Cell::new(frame_time),
            next_id: Cell::new(1),
            callbacks: RefCell::new(IndexMap::new()),
        }
    }

    /// Move the clock to `frame_time` microseconds and dispatch one frame
    ///
    /// # Panics
    ///
    /// Panics if time would go backwards.
    pub fn set_frame_time(&self, frame_time: i64) {
        assert!(
            frame_time >= self.frame_time.get(),
            "ManualFrameClock::set_frame_time: frame time must be monotonic ({} < {})",
            frame_time,
            self.frame_time.get()
        );
        self.frame_time.set(frame_time);
        self.dispatch();
    }

    /// Advance the clock by `ms` milliseconds and dispatch one frame
    pub fn advance(&self, ms: u64) {
        self.set_frame_time(self.frame_time.get() + ms as i64 * 1000);
    }

    /// Dispatch `count` frames spaced `interval_ms` apart
    pub fn run_frames(&self, count: u32, interval_ms: u64) {
        for _ in 0..count {
            self.advance(interval_ms);
        }
    }

    /// Keep dispatching frames spaced `interval_ms` apart until no callback
    /// is left or `max_frames` frames have run. Returns the frames dispatched.
    pub fn run_until_idle(&self, interval_ms: u64, max_frames: u32) -> u32 {
        let mut frames = 0;
        while self.has_tick_callbacks() && frames < max_frames {
            self.advance(interval_ms);
            frames += 1;
        }
        frames
    }

    /// Number of registered tick callbacks
    pub fn n_tick_callbacks(&self) -> usize {
        self.callbacks.borrow().len()
    }

    pub fn has_tick_callbacks(&self) -> bool {
        !self.callbacks.borrow().is_empty()
    }

    fn dispatch(&self) {
        let frame_time = self.frame_time.get();
        let ids: Vec<TickCallbackId> = self.callbacks.borrow().keys().copied().collect();

        tracing::trace!("ManualFrameClock: frame at {}us, {} callbacks", frame_time, ids.len());

        for id in ids {
            let callback = match self.callbacks.borrow_mut().get_mut(&id) {
                Some(slot) => slot.take(),
                None => continue,
            };
            let Some(mut callback) = callback else {
                continue;
            };

            let control = callback(frame_time);

            let mut callbacks = self.callbacks.borrow_mut();
            match control {
                TickControl::Continue => {
                    // Removed from inside the callback: drop it
                    if let Some(slot) = callbacks.get_mut(&id) {
                        *slot = Some(callback);
                    }
                }
                TickControl::Remove => {
                    callbacks.shift_remove(&id);
                }
            }
        }
    }
}

impl Default for ManualFrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for ManualFrameClock {
    fn frame_time(&self) -> i64 {
        self.frame_time.get()
    }

    fn add_tick_callback(&self, callback: TickCallback) -> TickCallbackId {
        let id = TickCallbackId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.callbacks.borrow_mut().insert(id, Some(callback));
        id
    }

    fn remove_tick_callback(&self, id: TickCallbackId) {
        self.callbacks.borrow_mut().shift_remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let clock = ManualFrameClock::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for n in 0..3 {
            let log = log.clone();
            clock.add_tick_callback(Box::new(move |_| {
                log.borrow_mut().push(n);
                TickControl::Continue
            }));
        }

        clock.advance(16);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_returns_unregister() {
        let clock = ManualFrameClock::new();
        let calls = Rc::new(Cell::new(0));

        let c = calls.clone();
        clock.add_tick_callback(Box::new(move |_| {
            c.set(c.get() + 1);
            TickControl::Remove
        }));

        clock.advance(16);
        clock.advance(16);
        assert_eq!(calls.get(), 1);
        assert!(!clock.has_tick_callbacks());
    }

    #[test]
    fn test_removing_a_queued_callback_makes_it_a_noop() {
        let clock = Rc::new(ManualFrameClock::new());
        let second_calls = Rc::new(Cell::new(0));
        let second_id = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&clock);
        let id_slot = second_id.clone();
        clock.add_tick_callback(Box::new(move |_| {
            if let (Some(clock), Some(id)) = (weak.upgrade(), id_slot.get()) {
                clock.remove_tick_callback(id);
            }
            TickControl::Continue
        }));

        let c = second_calls.clone();
        second_id.set(Some(clock.add_tick_callback(Box::new(move |_| {
            c.set(c.get() + 1);
            TickControl::Continue
        }))));

        clock.advance(16);
        assert_eq!(second_calls.get(), 0);
        assert_eq!(clock.n_tick_callbacks(), 1);
    }

    #[test]
    fn test_callback_receives_frame_time() {
        let clock = ManualFrameClock::starting_at(1_000);
        let seen = Rc::new(Cell::new(0));

        let s = seen.clone();
        clock.add_tick_callback(Box::new(move |frame_time| {
            s.set(frame_time);
            TickControl::Continue
        }));

        clock.advance(5);
        assert_eq!(seen.get(), 6_000);
    }

    #[test]
    #[should_panic(expected = "monotonic")]
    fn test_time_cannot_go_backwards() {
        let clock = ManualFrameClock::starting_at(10_000);
        clock.set_frame_time(0);
    }
}
