//! One-shot timers for gesture timeouts
//!
//! Two backends implement [`Timers`]:
//! - [`LoopTimers`] registers calloop timer sources on the compositor event loop
//! - [`TimerQueue`] is a virtual clock, advanced by hand (replay, tests)
//!
//! Neither invokes gesture code directly. Fired timers are collected and the
//! owner hands them to [`GestureDriver::timeout`](crate::input::GestureDriver::timeout),
//! so a timer can never run in the middle of a point callback.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};
use tracing::{error, trace};

use crate::error::{Error, Result};

/// Handle of a scheduled timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Schedule-once / cancel-by-handle timer service
pub trait Timers {
    /// Schedule a one-shot timeout `delay` from now
    fn add_timeout(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timeout. Unknown or already fired ids are ignored.
    fn remove_timeout(&mut self, id: TimerId);
}

/// Virtual clock timer queue
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    last_id: u64,
    pending: Vec<(Duration, TimerId)>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|(_, pending)| *pending == id)
    }

    /// Advance the clock, returning the timers that expired in deadline order
    pub fn advance(&mut self, by: Duration) -> Vec<TimerId> {
        self.now += by;
        let now = self.now;

        let mut expired: Vec<(Duration, TimerId)> = self
            .pending
            .iter()
            .copied()
            .filter(|(deadline, _)| *deadline <= now)
            .collect();
        self.pending.retain(|(deadline, _)| *deadline > now);

        expired.sort();
        expired.into_iter().map(|(_, id)| id).collect()
    }
}

impl Timers for TimerQueue {
    fn add_timeout(&mut self, delay: Duration) -> TimerId {
        self.last_id += 1;
        let id = TimerId(self.last_id);
        self.pending.push((self.now + delay, id));
        trace!(timer = id.0, ?delay, "virtual timeout scheduled");
        id
    }

    fn remove_timeout(&mut self, id: TimerId) {
        self.pending.retain(|(_, pending)| *pending != id);
    }
}

/// Timers backed by calloop timer sources
pub struct LoopTimers<'l, D> {
    handle: LoopHandle<'l, D>,
    last_id: u64,
    tokens: HashMap<TimerId, RegistrationToken>,
    fired: Rc<RefCell<Vec<TimerId>>>,
}

impl<'l, D> LoopTimers<'l, D> {
    pub fn new(handle: LoopHandle<'l, D>) -> Self {
        Self {
            handle,
            last_id: 0,
            tokens: HashMap::new(),
            fired: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Register a timer source, reporting registration failures
    pub fn try_add_timeout(&mut self, delay: Duration) -> Result<TimerId> {
        self.last_id += 1;
        let id = TimerId(self.last_id);

        let fired = self.fired.clone();
        let token = self
            .handle
            .insert_source(Timer::from_duration(delay), move |_, _, _| {
                fired.borrow_mut().push(id);
                TimeoutAction::Drop
            })
            .map_err(|e| Error::TimerSource(e.error.to_string()))?;

        self.tokens.insert(id, token);
        Ok(id)
    }

    /// Timers that fired since the last call, in firing order
    ///
    /// Call after each `EventLoop::dispatch` and forward every id to the
    /// gesture drivers.
    pub fn take_expired(&mut self) -> Vec<TimerId> {
        let expired: Vec<TimerId> = self.fired.borrow_mut().drain(..).collect();
        for id in &expired {
            // The source dropped itself with TimeoutAction::Drop
            self.tokens.remove(id);
        }
        expired
    }

    pub fn pending(&self) -> usize {
        self.tokens.len().saturating_sub(self.fired.borrow().len())
    }
}

impl<'l, D> Timers for LoopTimers<'l, D> {
    fn add_timeout(&mut self, delay: Duration) -> TimerId {
        match self.try_add_timeout(delay) {
            Ok(id) => id,
            Err(e) => {
                // The id is never delivered, so the timeout silently never fires
                error!("Failed to schedule gesture timeout: {}", e);
                self.last_id += 1;
                TimerId(self.last_id)
            }
        }
    }

    fn remove_timeout(&mut self, id: TimerId) {
        if let Some(token) = self.tokens.remove(&id) {
            self.handle.remove(token);
        }
        // Fired but not yet collected: drop it so it is never delivered
        self.fired.borrow_mut().retain(|fired| *fired != id);
    }
}

impl<'l, D> fmt::Debug for LoopTimers<'l, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopTimers")
            .field("last_id", &self.last_id)
            .field("tokens", &self.tokens.len())
            .field("fired", &self.fired.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calloop::EventLoop;

    #[test]
    fn test_queue_expires_in_deadline_order() {
        let mut timers = TimerQueue::new();
        let late = timers.add_timeout(Duration::from_millis(300));
        let early = timers.add_timeout(Duration::from_millis(100));

        assert!(timers.advance(Duration::from_millis(50)).is_empty());
        assert_eq!(timers.advance(Duration::from_millis(300)), vec![early, late]);
        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.now(), Duration::from_millis(350));
    }

    #[test]
    fn test_queue_remove() {
        let mut timers = TimerQueue::new();
        let id = timers.add_timeout(Duration::from_millis(200));
        assert!(timers.is_pending(id));

        timers.remove_timeout(id);
        assert!(!timers.is_pending(id));
        assert!(timers.advance(Duration::from_secs(1)).is_empty());

        // Removing twice is harmless
        timers.remove_timeout(id);
    }

    #[test]
    fn test_queue_deadline_is_inclusive() {
        let mut timers = TimerQueue::new();
        let id = timers.add_timeout(Duration::from_millis(200));
        assert!(timers.advance(Duration::from_millis(199)).is_empty());
        assert_eq!(timers.advance(Duration::from_millis(1)), vec![id]);
    }

    #[test]
    fn test_loop_timers_fire() -> anyhow::Result<()> {
        let mut event_loop: EventLoop<'static, ()> = EventLoop::try_new()?;
        let mut timers = LoopTimers::new(event_loop.handle());

        let id = timers.add_timeout(Duration::from_millis(1));
        assert_eq!(timers.pending(), 1);

        let mut expired = Vec::new();
        for _ in 0..50 {
            event_loop.dispatch(Some(Duration::from_millis(20)), &mut ())?;
            expired.extend(timers.take_expired());
            if !expired.is_empty() {
                break;
            }
        }

        assert_eq!(expired, vec![id]);
        assert_eq!(timers.pending(), 0);
        Ok(())
    }

    #[test]
    fn test_loop_timers_remove() -> anyhow::Result<()> {
        let mut event_loop: EventLoop<'static, ()> = EventLoop::try_new()?;
        let mut timers = LoopTimers::new(event_loop.handle());

        let id = timers.add_timeout(Duration::from_millis(1));
        timers.remove_timeout(id);

        event_loop.dispatch(Some(Duration::from_millis(20)), &mut ())?;
        assert!(timers.take_expired().is_empty());
        assert_eq!(timers.pending(), 0);
        Ok(())
    }
}
