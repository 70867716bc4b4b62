//! Animation targets
//!
//! The sink an animation writes its value into on every tick. Targets are
//! reference counted so a caller can keep one around and hand it to a new
//! animation later; only one animation should be writing to a target at a
//! time.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Receives the animated value, synchronously, from inside the frame tick
#[derive(Clone)]
pub struct AnimationTarget {
    callback: Rc<dyn Fn(f64)>,
}

impl AnimationTarget {
    /// A target that invokes `callback` with every new value
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(f64) + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// A target that stores the value into a shared cell
    pub fn cell(cell: Rc<Cell<f64>>) -> Self {
        Self::callback(move |value| cell.set(value))
    }

    /// A target that discards values
    pub fn none() -> Self {
        Self::callback(|_| {})
    }

    /// Push a value into the target
    pub fn set_value(&self, value: f64) {
        (self.callback)(value);
    }

    /// Whether both handles refer to the same target
    pub fn ptr_eq(&self, other: &AnimationTarget) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for AnimationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationTarget")
            .field("refs", &Rc::strong_count(&self.callback))
            .finish()
    }
}
