//! Screen edge drag detection
//!
//! A touch has to begin inside a narrow band along one monitor edge and be
//! dragged inward past `drag_distance`. On the way it reports progress in
//! pixels so panels can follow the finger.
//!
//! The gesture is cancelled when:
//! - more than one finger is down, or the touch began outside the band
//! - the finger moves further than `cancel_threshold` along the drag axis
//! - the finger still sits in the band when the cancel timeout fires
//! - the finger is lifted before completion

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Rectangle};
use tracing::debug;

use super::event::{EventKind, InputEvent};
use super::gesture::{Gesture, GestureContext, GestureState, PointIndex};
use crate::config::EdgeDragConfig;
use crate::error::{Error, Result};
use crate::host::{Host, TimerId};
use crate::signal::{HandlerId, Signal};

/// Monitor edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Top,
    Right,
    Bottom,
    Left,
}

impl TryFrom<u32> for Side {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Side::Top),
            1 => Ok(Side::Right),
            2 => Ok(Side::Bottom),
            3 => Ok(Side::Left),
            other => Err(Error::InvalidSide(other)),
        }
    }
}

impl From<Side> for u32 {
    fn from(side: Side) -> Self {
        match side {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }
}

/// Properties of [`EdgeDragRecognizer`] that emit change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDragProperty {
    Side,
}

#[derive(Debug, Default)]
pub struct EdgeDragRecognizer {
    config: EdgeDragConfig,

    cancel_timeout_point: PointIndex,
    cancel_timeout_id: Option<TimerId>,

    progress: Signal<f64>,
    notify: Signal<EdgeDragProperty>,
}

impl EdgeDragRecognizer {
    pub fn new(side: Side) -> Self {
        Self::with_config(EdgeDragConfig {
            side,
            ..EdgeDragConfig::default()
        })
    }

    pub fn with_config(config: EdgeDragConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EdgeDragConfig {
        &self.config
    }

    pub fn side(&self) -> Side {
        self.config.side
    }

    /// Always notifies, even if the side did not change
    pub fn set_side(&mut self, side: Side) {
        self.config.side = side;
        self.notify.emit(&EdgeDragProperty::Side);
    }

    /// Set the side from its numeric value (Top=0, Right=1, Bottom=2, Left=3)
    pub fn set_side_raw(&mut self, value: u32) -> Result<()> {
        let side = Side::try_from(value)?;
        self.set_side(side);
        Ok(())
    }

    /// Pending cancel timeout, if armed
    pub fn cancel_timeout(&self) -> Option<TimerId> {
        self.cancel_timeout_id
    }

    /// Progress in pixels along the drag axis, emitted on every move while recognizing
    pub fn connect_progress<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&f64) + 'static,
    {
        self.progress.connect(handler)
    }

    pub fn disconnect_progress(&mut self, id: HandlerId) -> bool {
        self.progress.disconnect(id)
    }

    pub fn connect_notify<F>(&mut self, handler: F) -> HandlerId
    where
        F: FnMut(&EdgeDragProperty) + 'static,
    {
        self.notify.connect(handler)
    }

    pub fn disconnect_notify(&mut self, id: HandlerId) -> bool {
        self.notify.disconnect(id)
    }

    /// Whether `coords` lies in the edge band of `monitor`
    pub fn is_near_edge(&self, coords: Point<f64, Logical>, monitor: Rectangle<i32, Logical>) -> bool {
        let band = self.config.edge_threshold;
        let (x, y, w, h) = monitor_bounds(monitor);

        match self.config.side {
            Side::Left => coords.x < x + band,
            Side::Right => coords.x > x + w - band,
            Side::Top => coords.y < y + band,
            Side::Bottom => coords.y > y + h - band,
        }
    }

    /// Distance travelled along the drag axis, regardless of direction
    pub fn axis_distance(&self, begin: Point<f64, Logical>, current: Point<f64, Logical>) -> f64 {
        match self.config.side {
            Side::Left | Side::Right => (current.x - begin.x).abs(),
            Side::Top | Side::Bottom => (current.y - begin.y).abs(),
        }
    }

    pub fn exceeds_cancel_threshold(&self, begin: Point<f64, Logical>, current: Point<f64, Logical>) -> bool {
        self.axis_distance(begin, current) > self.config.cancel_threshold
    }

    /// Whether `current` is past the drag distance, measured from the edge of
    /// the monitor the touch began on
    pub fn passes_distance_needed(
        &self,
        current: Point<f64, Logical>,
        begin_monitor: Rectangle<i32, Logical>,
    ) -> bool {
        let distance = self.config.drag_distance;
        let (x, y, w, h) = monitor_bounds(begin_monitor);

        match self.config.side {
            Side::Left => current.x > x + distance,
            Side::Right => current.x < x + w - distance,
            Side::Top => current.y > y + distance,
            Side::Bottom => current.y < y + h - distance,
        }
    }

    fn is_near_monitor_edge(&self, host: &dyn Host, coords: Point<f64, Logical>) -> bool {
        self.is_near_edge(coords, monitor_for_coords(host, coords))
    }

    fn cancel(&self, ctx: &mut GestureContext<'_>, reason: &str) {
        debug!(side = ?self.config.side, reason, "edge drag cancelled");
        ctx.set_state(GestureState::Cancelled);
    }
}

fn monitor_bounds(monitor: Rectangle<i32, Logical>) -> (f64, f64, f64, f64) {
    (
        f64::from(monitor.loc.x),
        f64::from(monitor.loc.y),
        f64::from(monitor.size.w),
        f64::from(monitor.size.h),
    )
}

/// Monitor containing `coords`
///
/// # Panics
///
/// Tracked touches always lie on some monitor; if none contains `coords` the
/// output layout and the input coordinates disagree.
fn monitor_for_coords(host: &dyn Host, coords: Point<f64, Logical>) -> Rectangle<i32, Logical> {
    let x = coords.x.floor() as i32;
    let y = coords.y.floor() as i32;

    // The pixel containing the point, then its neighbours up and left so a
    // point on a monitor's right or bottom boundary still resolves
    [(x, y), (x - 1, y), (x, y - 1), (x - 1, y - 1)]
        .into_iter()
        .find_map(|(px, py)| host.monitor_for_rect(Rectangle::new((px, py).into(), (1, 1).into())))
        .unwrap_or_else(|| panic!("no monitor at {:?} for edge drag point", coords))
}

impl Gesture for EdgeDragRecognizer {
    fn should_handle_sequence(&self, event: &InputEvent) -> bool {
        event.kind == EventKind::TouchBegin
    }

    fn point_began(&mut self, ctx: &mut GestureContext<'_>, point: PointIndex) {
        if ctx.n_points() > 1 {
            self.cancel(ctx, "more than one point");
            return;
        }
        let Some(coords) = ctx.point_coords(point) else {
            return;
        };
        if !self.is_near_monitor_edge(ctx.host(), coords) {
            self.cancel(ctx, "began outside the edge band");
            return;
        }

        self.cancel_timeout_point = point;

        debug_assert!(
            self.cancel_timeout_id.is_none(),
            "edge drag cancel timeout armed twice"
        );
        if let Some(stale) = self.cancel_timeout_id.take() {
            ctx.host_mut().remove_timeout(stale);
        }
        let delay = Duration::from_millis(self.config.cancel_timeout_ms);
        let id = ctx.host_mut().add_timeout(delay);
        debug!(side = ?self.config.side, point, timer = id.raw(), "edge drag armed");
        self.cancel_timeout_id = Some(id);
    }

    fn point_moved(&mut self, ctx: &mut GestureContext<'_>, point: PointIndex) {
        let Some(tracked) = ctx.point(point) else {
            return;
        };
        let begin = tracked.begin_coords();
        let current = tracked.coords();

        if self.exceeds_cancel_threshold(begin, current) {
            self.cancel(ctx, "moved past the cancel threshold");
            return;
        }

        if ctx.state() == GestureState::Possible && !self.is_near_monitor_edge(ctx.host(), current) {
            ctx.set_state(GestureState::Recognizing);
        }

        if ctx.state() == GestureState::Recognizing {
            let progress = self.axis_distance(begin, current);
            self.progress.emit(&progress);

            let begin_monitor = monitor_for_coords(ctx.host(), begin);
            if self.passes_distance_needed(current, begin_monitor) {
                debug!(side = ?self.config.side, progress, "edge drag completed");
                ctx.set_state(GestureState::Completed);
            }
        }
    }

    fn point_ended(&mut self, ctx: &mut GestureContext<'_>, _point: PointIndex) {
        self.cancel(ctx, "point ended");
    }

    fn state_changed(
        &mut self,
        ctx: &mut GestureContext<'_>,
        _old_state: GestureState,
        new_state: GestureState,
    ) {
        if new_state.is_terminal() {
            if let Some(id) = self.cancel_timeout_id.take() {
                ctx.host_mut().remove_timeout(id);
            }
        }
    }

    fn timeout(&mut self, ctx: &mut GestureContext<'_>, timer: TimerId) {
        if self.cancel_timeout_id != Some(timer) {
            return;
        }
        self.cancel_timeout_id = None;

        let Some(coords) = ctx.point_coords(self.cancel_timeout_point) else {
            return;
        };
        // Still at the edge: the finger did not make any inward progress
        if self.is_near_monitor_edge(ctx.host(), coords) {
            self.cancel(ctx, "cancel timeout");
        }
    }
}
