//! Drag-and-drop start detection
//!
//! Decides when a press or touch has turned into the start of a drag:
//! - Mice and touchpads start dragging once they move past the drag threshold
//! - Touchscreens additionally have to be held for `timeout_threshold_ms`
//!   before moving, otherwise the movement is left to scrolling
//! - In manual mode nothing happens automatically; the owner calls
//!   [`DragStartRecognizer::start_drag`] (e.g. from a long press)
//!
//! Only single-point interactions qualify. A second contact cancels.

use smithay::utils::{Logical, Point};
use tracing::{debug, trace};

use super::driver::GestureDriver;
use super::event::{EventKind, InputEvent};
use super::gesture::{Gesture, GestureContext, GestureState, PointIndex};
use crate::config::DragStartConfig;
use crate::host::Host;
use crate::signal::{HandlerId, Signal};

/// Properties of [`DragStartRecognizer`] that emit change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragStartProperty {
    ManualMode,
    TimeoutThreshold,
}

#[derive(Debug, Default)]
pub struct DragStartRecognizer {
    /// Threshold crossed too early on a touchscreen; no automatic start for this sequence
    drag_threshold_ignored: bool,
    point_begin_event: Option<InputEvent>,
    drag_triggering_event: Option<InputEvent>,

    manual_mode: bool,
    timeout_threshold_ms: u32,

    notify: Signal<DragStartProperty>,
}

impl DragStartRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DragStartConfig) -> Self {
        Self {
            manual_mode: config.manual_mode,
            timeout_threshold_ms: config.timeout_threshold_ms,
            ..Self::default()
        }
    }

    /// Complete the gesture now, recording `start_event` as the trigger
    ///
    /// Does nothing unless exactly one point is active and the gesture is
    /// still undecided.
    pub fn start_drag(&mut self, ctx: &mut GestureContext<'_>, start_event: Option<&InputEvent>) {
        if ctx.n_points() != 1 {
            return;
        }
        if ctx.state() != GestureState::Possible {
            return;
        }

        if let Some(event) = start_event {
            self.drag_triggering_event = Some(event.clone());
        }
        debug!(manual = self.manual_mode, "drag start recognized");
        ctx.set_state(GestureState::Completed);
    }

    /// Event that began the tracked point; `None` once the gesture ended
    pub fn point_begin_event(&self) -> Option<&InputEvent> {
        self.point_begin_event.as_ref()
    }

    /// Event that triggered the drag; `None` once the gesture ended
    pub fn drag_triggering_event(&self) -> Option<&InputEvent> {
        self.drag_triggering_event.as_ref()
    }

    /// Where the drag started: the triggering event, else the begin event
    pub fn drag_coords(&self) -> Option<Point<f64, Logical>> {
        self.drag_triggering_event
            .as_ref()
            .or(self.point_begin_event.as_ref())
            .map(|event| event.position)
    }

    pub fn manual_mode(&self) -> bool {
        self.manual_mode
    }

    pub fn set_manual_mode(&mut self, manual_mode: bool) {
        if self.manual_mode == manual_mode {
            return;
        }
        self.manual_mode = manual_mode;
        self.notify.emit(&DragStartProperty::ManualMode);
    }

    pub fn timeout_threshold(&self) -> u32 {
        self.timeout_threshold_ms
    }

    pub fn set_timeout_threshold(&mut self, timeout_threshold_ms: u32) {
        if self.timeout_threshold_ms == timeout_threshold_ms {
            return;
        }
        self.timeout_threshold_ms = timeout_threshold_ms;
        self.notify.emit(&DragStartProperty::TimeoutThreshold);
    }

    /// Notified when `manual_mode` or `timeout_threshold` actually change
    pub fn connect_notify<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&DragStartProperty) + 'static,
    {
        self.notify.connect(handler)
    }

    pub fn disconnect_notify(&mut self, id: HandlerId) -> bool {
        self.notify.disconnect(id)
    }

    fn maybe_start_drag(&mut self, ctx: &mut GestureContext<'_>, point: PointIndex) {
        if self.drag_threshold_ignored {
            return;
        }
        let Some(point) = ctx.point(point) else {
            return;
        };
        let event = point.latest_event.clone();
        let delta = point.delta();

        let host = ctx.host();
        let drag_threshold = f64::from(host.drag_threshold()) * host.scale_factor();

        if delta.x.abs() <= drag_threshold && delta.y.abs() <= drag_threshold {
            return;
        }

        let elapsed_ms = self
            .point_begin_event
            .as_ref()
            .map_or(0, |begin| event.elapsed_since(begin));

        // Pointer devices (e.g. mouse) start the drag immediately
        if event.device.is_pointer_or_touchpad() || elapsed_ms > self.timeout_threshold_ms {
            self.start_drag(ctx, Some(&event));
        } else {
            trace!(
                elapsed_ms,
                timeout_ms = self.timeout_threshold_ms,
                "drag threshold crossed before timeout, ignoring"
            );
            self.drag_threshold_ignored = true;
        }
    }
}

impl Gesture for DragStartRecognizer {
    fn should_handle_sequence(&self, event: &InputEvent) -> bool {
        event.is_primary_button_press() || event.kind == EventKind::TouchBegin
    }

    fn point_began(&mut self, ctx: &mut GestureContext<'_>, point: PointIndex) {
        if ctx.n_points() > 1 {
            debug!(n_points = ctx.n_points(), "drag start cancelled: more than one point");
            ctx.set_state(GestureState::Cancelled);
            return;
        }

        self.point_begin_event = ctx.point_event(point).cloned();
        self.drag_threshold_ignored = false;

        if !self.manual_mode && ctx.state() == GestureState::Possible {
            self.maybe_start_drag(ctx, point);
        }
    }

    fn point_moved(&mut self, ctx: &mut GestureContext<'_>, point: PointIndex) {
        if !self.manual_mode && ctx.state() == GestureState::Possible {
            self.maybe_start_drag(ctx, point);
        }
    }

    fn point_ended(&mut self, ctx: &mut GestureContext<'_>, _point: PointIndex) {
        // Last point gone while still undecided: manual mode and nobody started the drag
        if ctx.state() == GestureState::Possible && ctx.n_points() == 1 {
            ctx.set_state(GestureState::Cancelled);
        }
    }

    fn state_changed(
        &mut self,
        _ctx: &mut GestureContext<'_>,
        _old_state: GestureState,
        new_state: GestureState,
    ) {
        if new_state.is_terminal() {
            self.drag_triggering_event = None;
            self.point_begin_event = None;
        }
    }
}

impl GestureDriver<DragStartRecognizer> {
    /// Explicitly start the drag, see [`DragStartRecognizer::start_drag`]
    pub fn start_drag(&mut self, start_event: Option<&InputEvent>, host: &mut dyn Host) {
        self.with_gesture(host, |gesture, ctx| gesture.start_drag(ctx, start_event));
    }
}
