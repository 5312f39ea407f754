//! Routes input events to a recognizer and runs its state machine
//!
//! The driver owns the point table. Backends call [`GestureDriver::handle_event`]
//! for every touch / pointer event and [`GestureDriver::timeout`] for every
//! expired timer, always from the compositor thread.

use std::fmt;

use tracing::{debug, trace};

use super::event::{EventKind, InputEvent};
use super::gesture::{Gesture, GestureContext, GestureCore, GesturePoint, GestureState, PointIndex};
use crate::host::{Host, TimerId};
use crate::signal::HandlerId;

type StateHandler<G> = Box<dyn FnMut(&G, GestureState, GestureState)>;

pub struct GestureDriver<G> {
    gesture: G,
    core: GestureCore,
    state_handlers: Vec<(HandlerId, StateHandler<G>)>,
    last_handler_id: u64,
}

impl<G: Gesture> GestureDriver<G> {
    pub fn new(gesture: G) -> Self {
        Self {
            gesture,
            core: GestureCore::default(),
            state_handlers: Vec::new(),
            last_handler_id: 0,
        }
    }

    pub fn gesture(&self) -> &G {
        &self.gesture
    }

    pub fn gesture_mut(&mut self) -> &mut G {
        &mut self.gesture
    }

    pub fn state(&self) -> GestureState {
        self.core.state
    }

    pub fn n_points(&self) -> usize {
        self.core.n_points()
    }

    pub fn point(&self, index: PointIndex) -> Option<&GesturePoint> {
        self.core.point(index)
    }

    /// Observe state transitions
    ///
    /// Handlers run before the recognizer's own `state_changed`, so on
    /// completion they can still read whatever the recognizer releases there.
    pub fn connect_state_changed<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&G, GestureState, GestureState) + 'static,
    {
        let id = HandlerId::next(&mut self.last_handler_id);
        self.state_handlers.push((id, Box::new(handler)));
        id
    }

    pub fn disconnect_state_changed(&mut self, id: HandlerId) -> bool {
        let before = self.state_handlers.len();
        self.state_handlers.retain(|(handler_id, _)| *handler_id != id);
        self.state_handlers.len() != before
    }

    /// Feed one input event. Returns `true` if it belongs to a tracked point.
    pub fn handle_event(&mut self, event: &InputEvent, host: &mut dyn Host) -> bool {
        if event.kind.is_begin() {
            self.begin_point(event, host)
        } else if event.kind.is_end() {
            self.end_point(event, host)
        } else {
            self.move_point(event, host)
        }
    }

    /// Deliver an expired timer to the recognizer
    pub fn timeout(&mut self, timer: TimerId, host: &mut dyn Host) {
        trace!(timer = timer.raw(), "gesture timeout");
        self.dispatch(host, |gesture, ctx| gesture.timeout(ctx, timer));
    }

    /// Run an external entry point of the recognizer (e.g. an explicit start)
    /// and apply the transitions it requests
    pub fn with_gesture<R>(
        &mut self,
        host: &mut dyn Host,
        f: impl FnOnce(&mut G, &mut GestureContext<'_>) -> R,
    ) -> R {
        self.dispatch(host, f)
    }

    /// Forget all points and return to Possible
    pub fn reset(&mut self, host: &mut dyn Host) {
        if self.core.state.is_terminal() || self.core.n_points() == 0 {
            self.core.reset();
        } else {
            // Let the recognizer clean up through the normal cancel path first
            self.core.set_state(GestureState::Cancelled);
            self.flush_transitions(host);
            self.core.reset();
        }
        self.flush_transitions(host);
    }

    fn begin_point(&mut self, event: &InputEvent, host: &mut dyn Host) -> bool {
        if self.core.state.is_terminal() {
            // Wait for the current sequence to finish before tracking new points
            return false;
        }
        if self.core.find(event.sequence).is_some() {
            return true;
        }
        if !self.gesture.should_handle_sequence(event) {
            return false;
        }

        let index = self.core.add_point(event);
        debug!(point = index, sequence = ?event.sequence, n_points = self.core.n_points(), "gesture point began");
        self.dispatch(host, |gesture, ctx| gesture.point_began(ctx, index));
        true
    }

    fn move_point(&mut self, event: &InputEvent, host: &mut dyn Host) -> bool {
        let Some(index) = self.core.find(event.sequence) else {
            return false;
        };

        self.core.update_point(index, event);
        if !self.core.state.is_terminal() {
            self.dispatch(host, |gesture, ctx| gesture.point_moved(ctx, index));
        }
        true
    }

    fn end_point(&mut self, event: &InputEvent, host: &mut dyn Host) -> bool {
        let Some(index) = self.core.find(event.sequence) else {
            return false;
        };

        // Only releasing the button that began the point ends it
        if event.kind == EventKind::ButtonRelease {
            let began_with = self.core.point(index).and_then(|point| point.begin_event.button);
            if began_with.is_some() && event.button != began_with {
                trace!(point = index, button = ?event.button, "ignoring release of another button");
                return true;
            }
        }

        self.core.update_point(index, event);
        if !self.core.state.is_terminal() {
            if event.kind == EventKind::TouchCancel {
                self.core.set_state(GestureState::Cancelled);
                self.flush_transitions(host);
            } else {
                self.dispatch(host, |gesture, ctx| gesture.point_ended(ctx, index));
            }
        }

        self.core.remove_point(index);
        debug!(point = index, n_points = self.core.n_points(), "gesture point ended");

        if self.core.n_points() == 0 {
            if !self.core.state.is_terminal() {
                // Nobody decided before the last point went away
                self.core.set_state(GestureState::Cancelled);
                self.flush_transitions(host);
            }
            self.core.reset();
            self.flush_transitions(host);
        }
        true
    }

    fn dispatch<R>(
        &mut self,
        host: &mut dyn Host,
        f: impl FnOnce(&mut G, &mut GestureContext<'_>) -> R,
    ) -> R {
        let result = {
            let mut ctx = GestureContext::new(&mut self.core, &mut *host);
            f(&mut self.gesture, &mut ctx)
        };
        self.flush_transitions(host);
        result
    }

    /// Deliver pending transitions to observers and the recognizer, in order
    fn flush_transitions(&mut self, host: &mut dyn Host) {
        loop {
            let pending = std::mem::take(&mut self.core.transitions);
            if pending.is_empty() {
                break;
            }

            for (old, new) in pending {
                debug!(?old, ?new, "gesture state changed");
                for (_, handler) in self.state_handlers.iter_mut() {
                    handler(&self.gesture, old, new);
                }
                let mut ctx = GestureContext::new(&mut self.core, &mut *host);
                self.gesture.state_changed(&mut ctx, old, new);
            }
        }
    }
}

impl<G: fmt::Debug> fmt::Debug for GestureDriver<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureDriver")
            .field("gesture", &self.gesture)
            .field("core", &self.core)
            .field("state_handlers", &self.state_handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::Sequence;
    use crate::test_util::{shell_host, touch};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every callback and completes on demand
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
        complete_on_move: bool,
    }

    impl Gesture for Recorder {
        fn should_handle_sequence(&self, event: &InputEvent) -> bool {
            event.kind == EventKind::TouchBegin
        }

        fn point_began(&mut self, ctx: &mut GestureContext<'_>, point: PointIndex) {
            self.calls.push(format!("began {} n={}", point, ctx.n_points()));
        }

        fn point_moved(&mut self, ctx: &mut GestureContext<'_>, point: PointIndex) {
            self.calls.push(format!("moved {}", point));
            if self.complete_on_move {
                ctx.set_state(GestureState::Completed);
                // The new state is visible immediately
                self.calls.push(format!("now {:?}", ctx.state()));
            }
        }

        fn point_ended(&mut self, ctx: &mut GestureContext<'_>, point: PointIndex) {
            self.calls.push(format!("ended {} n={}", point, ctx.n_points()));
        }

        fn state_changed(&mut self, _ctx: &mut GestureContext<'_>, old: GestureState, new: GestureState) {
            self.calls.push(format!("state {:?}->{:?}", old, new));
        }
    }

    #[test]
    fn test_point_lifecycle() {
        let mut host = shell_host();
        let mut driver = GestureDriver::new(Recorder::default());

        assert!(driver.handle_event(&touch(EventKind::TouchBegin, 3, 0, 10.0, 10.0), &mut host));
        assert!(driver.handle_event(&touch(EventKind::TouchUpdate, 3, 5, 12.0, 10.0), &mut host));
        assert_eq!(driver.point(0).map(|p| p.sequence), Some(Sequence::Touch(3)));
        assert!(driver.handle_event(&touch(EventKind::TouchEnd, 3, 9, 12.0, 10.0), &mut host));

        assert_eq!(
            driver.gesture().calls,
            vec![
                "began 0 n=1",
                "moved 0",
                "ended 0 n=1",
                "state Possible->Cancelled",
                "state Cancelled->Possible",
            ]
        );
        assert_eq!(driver.state(), GestureState::Possible);
        assert_eq!(driver.n_points(), 0);
    }

    #[test]
    fn test_unhandled_sequences_are_ignored() {
        let mut host = shell_host();
        let mut driver = GestureDriver::new(Recorder::default());

        let press = crate::test_util::mouse(EventKind::ButtonPress, 0, 5.0, 5.0);
        assert!(!driver.handle_event(&press, &mut host));
        // Motion of an untracked sequence
        assert!(!driver.handle_event(&touch(EventKind::TouchUpdate, 1, 0, 5.0, 5.0), &mut host));

        assert!(driver.gesture().calls.is_empty());
        assert_eq!(driver.n_points(), 0);
    }

    #[test]
    fn test_transitions_delivered_after_callback() {
        let mut host = shell_host();
        let mut driver = GestureDriver::new(Recorder {
            complete_on_move: true,
            ..Recorder::default()
        });

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_handler = seen.clone();
        driver.connect_state_changed(move |gesture: &Recorder, old, new| {
            seen_in_handler
                .borrow_mut()
                .push((old, new, gesture.calls.len()));
        });

        driver.handle_event(&touch(EventKind::TouchBegin, 0, 0, 0.0, 0.0), &mut host);
        driver.handle_event(&touch(EventKind::TouchUpdate, 0, 1, 1.0, 0.0), &mut host);
        assert_eq!(driver.state(), GestureState::Completed);
        assert_eq!(
            driver.gesture().calls,
            vec!["began 0 n=1", "moved 0", "now Completed", "state Possible->Completed"]
        );
        // Observer ran before the recognizer's state_changed
        assert_eq!(
            *seen.borrow(),
            vec![(GestureState::Possible, GestureState::Completed, 3)]
        );

        // Terminal: further moves are not dispatched, new points not tracked
        driver.handle_event(&touch(EventKind::TouchUpdate, 0, 2, 2.0, 0.0), &mut host);
        assert!(!driver.handle_event(&touch(EventKind::TouchBegin, 1, 2, 50.0, 0.0), &mut host));
        assert_eq!(driver.gesture().calls.len(), 4);

        // Last point ending resets without calling point_ended
        driver.handle_event(&touch(EventKind::TouchEnd, 0, 3, 2.0, 0.0), &mut host);
        assert_eq!(driver.state(), GestureState::Possible);
        assert_eq!(
            driver.gesture().calls.last().map(String::as_str),
            Some("state Completed->Possible")
        );
    }

    #[test]
    fn test_touch_cancel() {
        let mut host = shell_host();
        let mut driver = GestureDriver::new(Recorder::default());

        driver.handle_event(&touch(EventKind::TouchBegin, 0, 0, 0.0, 0.0), &mut host);
        driver.handle_event(&touch(EventKind::TouchCancel, 0, 1, 0.0, 0.0), &mut host);

        assert_eq!(
            driver.gesture().calls,
            vec!["began 0 n=1", "state Possible->Cancelled", "state Cancelled->Possible"]
        );
    }

    #[test]
    fn test_reset_cancels_active_gesture() {
        let mut host = shell_host();
        let mut driver = GestureDriver::new(Recorder::default());

        driver.handle_event(&touch(EventKind::TouchBegin, 0, 0, 0.0, 0.0), &mut host);
        driver.reset(&mut host);

        assert_eq!(driver.state(), GestureState::Possible);
        assert_eq!(driver.n_points(), 0);
        assert_eq!(
            &driver.gesture().calls[1..],
            &["state Possible->Cancelled", "state Cancelled->Possible"]
        );
    }

    #[test]
    fn test_disconnect_state_handler() {
        let mut host = shell_host();
        let mut driver = GestureDriver::new(Recorder::default());
        let count = Rc::new(RefCell::new(0));

        let counter = count.clone();
        let id = driver.connect_state_changed(move |_: &Recorder, _, _| *counter.borrow_mut() += 1);
        assert!(driver.disconnect_state_changed(id));

        driver.handle_event(&touch(EventKind::TouchBegin, 0, 0, 0.0, 0.0), &mut host);
        driver.handle_event(&touch(EventKind::TouchEnd, 0, 1, 0.0, 0.0), &mut host);
        assert_eq!(*count.borrow(), 0);
    }
}
