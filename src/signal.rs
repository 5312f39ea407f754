//! Lightweight observer lists for property notifications and progress updates
//!
//! Everything runs on the compositor thread, so handlers are plain boxed
//! `FnMut` closures without `Send` bounds.

use std::fmt;

/// Handle returned by `connect`, used to disconnect a handler again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn next(counter: &mut u64) -> Self {
        *counter += 1;
        HandlerId(*counter)
    }
}

/// A list of handlers invoked with a borrowed value on every emission
pub struct Signal<T> {
    handlers: Vec<(HandlerId, Box<dyn FnMut(&T)>)>,
    last_id: u64,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            last_id: 0,
        }
    }

    pub fn connect<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&T) + 'static,
    {
        let id = HandlerId::next(&mut self.last_id);
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns `false` if the handler was already gone
    pub fn disconnect(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, value: &T) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(value);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
