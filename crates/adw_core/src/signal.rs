//! Synchronous signals
//!
//! An observer list with same-thread, in-order delivery. Handlers may
//! connect or disconnect (themselves included) while the signal is being
//! emitted; a handler disconnected mid-emission is not invoked afterwards.

use std::cell::{Cell, RefCell};
use std::fmt;

use indexmap::IndexMap;

/// Handle to a connected signal handler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type Handler<A> = Box<dyn FnMut(&A)>;

/// A list of handlers invoked with `&A` on every emission
pub struct Signal<A: 'static> {
    next_id: Cell<u64>,
    handlers: RefCell<IndexMap<HandlerId, Option<Handler<A>>>>,
}

impl<A: 'static> Signal<A> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            handlers: RefCell::new(IndexMap::new()),
        }
    }

    /// Connect a handler, returning an id for [`Signal::disconnect`]
    pub fn connect<F>(&self, handler: F) -> HandlerId
    where
        F: FnMut(&A) + 'static,
    {
        self.connect_boxed(Box::new(handler))
    }

    pub fn connect_boxed(&self, handler: Box<dyn FnMut(&A)>) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().insert(id, Some(handler));
        id
    }

    /// Disconnect a handler. Returns whether it was connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        self.handlers.borrow_mut().shift_remove(&id).is_some()
    }

    /// Invoke every connected handler in connection order
    pub fn emit(&self, args: &A) {
        let ids: Vec<HandlerId> = self.handlers.borrow().keys().copied().collect();

        for id in ids {
            let handler = match self.handlers.borrow_mut().get_mut(&id) {
                Some(slot) => slot.take(),
                None => continue,
            };
            // Already running further up the stack
            let Some(mut handler) = handler else {
                continue;
            };

            handler(args);

            if let Some(slot) = self.handlers.borrow_mut().get_mut(&id) {
                *slot = Some(handler);
            }
        }
    }

    pub fn n_handlers(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("n_handlers", &self.n_handlers())
            .finish()
    }
}
