//! Multi-point gesture framework
//!
//! A recognizer implements [`Gesture`] and gets called back as points (touch
//! contacts or pressed pointer buttons) begin, move and end. It reads the
//! points through a [`GestureContext`] and asks for state transitions with
//! [`GestureContext::set_state`]; the framework validates and applies them.
//!
//! State flow:
//!
//! ```text
//! Possible ──> Recognizing ──> Completed
//!     │             │
//!     └─────────────┴────────> Cancelled
//! ```
//!
//! Possible can also jump straight to Completed. Once terminal, the gesture
//! stays there until every point of the sequence has ended, then the driver
//! resets it to Possible.

use smithay::utils::{Logical, Point};
use tracing::{trace, warn};

use super::event::{InputEvent, Sequence};
use crate::host::{Host, TimerId};

/// Index of an active point, stable for the point's lifetime
pub type PointIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    /// Tracking points, nothing decided yet
    #[default]
    Possible,
    /// Intent confirmed, still in progress
    Recognizing,
    Cancelled,
    Completed,
}

impl GestureState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GestureState::Cancelled | GestureState::Completed)
    }

    /// Transitions a recognizer may request from this state
    pub fn can_transition_to(self, next: GestureState) -> bool {
        use GestureState::*;
        matches!(
            (self, next),
            (Possible, Recognizing | Completed | Cancelled) | (Recognizing, Completed | Cancelled)
        )
    }
}

/// An active contact tracked by the framework
#[derive(Debug, Clone)]
pub struct GesturePoint {
    pub index: PointIndex,
    pub sequence: Sequence,
    /// Event that started the point
    pub begin_event: InputEvent,
    /// Most recent event for the point
    pub latest_event: InputEvent,
}

impl GesturePoint {
    pub fn begin_coords(&self) -> Point<f64, Logical> {
        self.begin_event.position
    }

    pub fn coords(&self) -> Point<f64, Logical> {
        self.latest_event.position
    }

    /// Displacement since the point began
    pub fn delta(&self) -> Point<f64, Logical> {
        let begin = self.begin_coords();
        let current = self.coords();
        Point::from((current.x - begin.x, current.y - begin.y))
    }
}

/// Point table and state shared between the driver and its recognizer
#[derive(Debug, Default)]
pub(crate) struct GestureCore {
    pub(crate) points: Vec<Option<GesturePoint>>,
    pub(crate) state: GestureState,
    /// Applied transitions whose `state_changed` has not been delivered yet
    pub(crate) transitions: Vec<(GestureState, GestureState)>,
}

impl GestureCore {
    pub(crate) fn n_points(&self) -> usize {
        self.points.iter().flatten().count()
    }

    pub(crate) fn point(&self, index: PointIndex) -> Option<&GesturePoint> {
        self.points.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn find(&self, sequence: Sequence) -> Option<PointIndex> {
        self.points
            .iter()
            .flatten()
            .find(|point| point.sequence == sequence)
            .map(|point| point.index)
    }

    /// Add a point in the first free slot
    pub(crate) fn add_point(&mut self, event: &InputEvent) -> PointIndex {
        let index = self
            .points
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.points.len());

        let point = GesturePoint {
            index,
            sequence: event.sequence,
            begin_event: event.clone(),
            latest_event: event.clone(),
        };

        if index == self.points.len() {
            self.points.push(Some(point));
        } else {
            self.points[index] = Some(point);
        }
        index
    }

    pub(crate) fn update_point(&mut self, index: PointIndex, event: &InputEvent) {
        if let Some(Some(point)) = self.points.get_mut(index) {
            point.latest_event = event.clone();
        }
    }

    pub(crate) fn remove_point(&mut self, index: PointIndex) -> Option<GesturePoint> {
        let point = self.points.get_mut(index)?.take();
        while matches!(self.points.last(), Some(None)) {
            self.points.pop();
        }
        point
    }

    /// Validate and apply a transition requested by a recognizer
    pub(crate) fn set_state(&mut self, new: GestureState) {
        let old = self.state;
        if old == new {
            return;
        }
        if !old.can_transition_to(new) {
            warn!(?old, ?new, "Rejected invalid gesture state transition");
            return;
        }
        trace!(?old, ?new, "gesture state transition");
        self.state = new;
        self.transitions.push((old, new));
    }

    /// Framework-side reset, bypasses validation
    pub(crate) fn reset(&mut self) {
        self.points.clear();
        let old = self.state;
        if old != GestureState::Possible {
            self.state = GestureState::Possible;
            self.transitions.push((old, GestureState::Possible));
        }
    }
}

/// What a recognizer sees during a callback
pub struct GestureContext<'a> {
    core: &'a mut GestureCore,
    host: &'a mut dyn Host,
}

impl<'a> GestureContext<'a> {
    pub(crate) fn new(core: &'a mut GestureCore, host: &'a mut dyn Host) -> Self {
        Self { core, host }
    }

    /// Number of active points, including one that is currently ending
    pub fn n_points(&self) -> usize {
        self.core.n_points()
    }

    pub fn point(&self, index: PointIndex) -> Option<&GesturePoint> {
        self.core.point(index)
    }

    /// Latest event of a point
    pub fn point_event(&self, index: PointIndex) -> Option<&InputEvent> {
        self.point(index).map(|point| &point.latest_event)
    }

    pub fn point_begin_coords(&self, index: PointIndex) -> Option<Point<f64, Logical>> {
        self.point(index).map(GesturePoint::begin_coords)
    }

    pub fn point_coords(&self, index: PointIndex) -> Option<Point<f64, Logical>> {
        self.point(index).map(GesturePoint::coords)
    }

    pub fn state(&self) -> GestureState {
        self.core.state
    }

    /// Request a state transition; invalid requests are logged and ignored
    pub fn set_state(&mut self, state: GestureState) {
        self.core.set_state(state);
    }

    pub fn host(&self) -> &dyn Host {
        &*self.host
    }

    pub fn host_mut(&mut self) -> &mut dyn Host {
        &mut *self.host
    }
}

/// A gesture recognizer driven by [`GestureDriver`](super::GestureDriver)
pub trait Gesture {
    /// Whether a new contact starting with `event` should be tracked at all
    fn should_handle_sequence(&self, event: &InputEvent) -> bool;

    fn point_began(&mut self, _ctx: &mut GestureContext<'_>, _point: PointIndex) {}

    fn point_moved(&mut self, _ctx: &mut GestureContext<'_>, _point: PointIndex) {}

    /// Called while the ending point still counts towards `n_points`
    fn point_ended(&mut self, _ctx: &mut GestureContext<'_>, _point: PointIndex) {}

    fn state_changed(
        &mut self,
        _ctx: &mut GestureContext<'_>,
        _old_state: GestureState,
        _new_state: GestureState,
    ) {
    }

    /// A timeout scheduled through the host fired
    fn timeout(&mut self, _ctx: &mut GestureContext<'_>, _timer: TimerId) {}
}
