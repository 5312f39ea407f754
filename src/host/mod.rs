//! Services the shell provides to gesture recognizers
//!
//! Recognizers never talk to the compositor directly. Everything they need
//! (settings, output geometry, scale, timers) goes through [`Host`].

mod timer;

use std::time::Duration;

use smithay::utils::{Logical, Rectangle};

use crate::config::GestureSettings;

pub use timer::*;

pub trait Host {
    /// Drag threshold from the settings, in unscaled pixels
    fn drag_threshold(&self) -> i32;

    /// Scale factor of the display the gestures happen on
    fn scale_factor(&self) -> f64;

    /// Geometry of the monitor that best covers `rect`, if any
    fn monitor_for_rect(&self, rect: Rectangle<i32, Logical>) -> Option<Rectangle<i32, Logical>>;

    fn add_timeout(&mut self, delay: Duration) -> TimerId;

    fn remove_timeout(&mut self, id: TimerId);
}

/// Output layout in global logical coordinates
#[derive(Debug, Clone, Default)]
pub struct Monitors {
    outputs: Vec<Rectangle<i32, Logical>>,
}

impl Monitors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(geometry: Rectangle<i32, Logical>) -> Self {
        Self {
            outputs: vec![geometry],
        }
    }

    pub fn add(&mut self, geometry: Rectangle<i32, Logical>) {
        self.outputs.push(geometry);
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Monitor with the largest overlap with `rect`; ties go to the first one
    pub fn monitor_for_rect(&self, rect: Rectangle<i32, Logical>) -> Option<Rectangle<i32, Logical>> {
        let mut best: Option<(i64, Rectangle<i32, Logical>)> = None;

        for output in &self.outputs {
            let area = overlap_area(*output, rect);
            if area == 0 {
                continue;
            }
            if best.map_or(true, |(best_area, _)| area > best_area) {
                best = Some((area, *output));
            }
        }

        best.map(|(_, output)| output)
    }
}

fn overlap_area(a: Rectangle<i32, Logical>, b: Rectangle<i32, Logical>) -> i64 {
    let x1 = a.loc.x.max(b.loc.x);
    let y1 = a.loc.y.max(b.loc.y);
    let x2 = (a.loc.x + a.size.w).min(b.loc.x + b.size.w);
    let y2 = (a.loc.y + a.size.h).min(b.loc.y + b.size.h);

    if x2 <= x1 || y2 <= y1 {
        return 0;
    }
    i64::from(x2 - x1) * i64::from(y2 - y1)
}

/// Standard [`Host`]: settings plus monitor layout plus a timer backend
#[derive(Debug)]
pub struct ShellHost<T> {
    pub settings: GestureSettings,
    pub monitors: Monitors,
    pub scale: f64,
    pub timers: T,
}

impl<T: Timers> ShellHost<T> {
    pub fn new(settings: GestureSettings, monitors: Monitors, timers: T) -> Self {
        Self {
            settings,
            monitors,
            scale: 1.0,
            timers,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

impl<T: Timers> Host for ShellHost<T> {
    fn drag_threshold(&self) -> i32 {
        self.settings.drag_threshold
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn monitor_for_rect(&self, rect: Rectangle<i32, Logical>) -> Option<Rectangle<i32, Logical>> {
        self.monitors.monitor_for_rect(rect)
    }

    fn add_timeout(&mut self, delay: Duration) -> TimerId {
        self.timers.add_timeout(delay)
    }

    fn remove_timeout(&mut self, id: TimerId) {
        self.timers.remove_timeout(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new((x, y).into(), (w, h).into())
    }

    #[test]
    fn test_monitor_lookup() {
        let mut monitors = Monitors::single(rect(0, 0, 1920, 1080));
        monitors.add(rect(1920, 0, 1280, 1024));

        assert_eq!(monitors.monitor_for_rect(rect(10, 10, 1, 1)), Some(rect(0, 0, 1920, 1080)));
        assert_eq!(monitors.monitor_for_rect(rect(1920, 5, 1, 1)), Some(rect(1920, 0, 1280, 1024)));
        assert_eq!(monitors.monitor_for_rect(rect(-5, 10, 1, 1)), None);
        assert_eq!(monitors.monitor_for_rect(rect(10, 1080, 1, 1)), None);
    }

    #[test]
    fn test_monitor_lookup_prefers_largest_overlap() {
        let mut monitors = Monitors::single(rect(0, 0, 100, 100));
        monitors.add(rect(100, 0, 100, 100));

        // 10px on the left monitor, 30px on the right one
        assert_eq!(monitors.monitor_for_rect(rect(90, 0, 40, 1)), Some(rect(100, 0, 100, 100)));
    }

    #[test]
    fn test_shell_host_forwards() {
        let settings = GestureSettings {
            drag_threshold: 12,
            ..GestureSettings::default()
        };
        let mut host = ShellHost::new(settings, Monitors::single(rect(0, 0, 720, 1440)), TimerQueue::new())
            .with_scale(2.0);

        assert_eq!(host.drag_threshold(), 12);
        assert_eq!(host.scale_factor(), 2.0);

        let id = host.add_timeout(Duration::from_millis(5));
        assert!(host.timers.is_pending(id));
        host.remove_timeout(id);
        assert_eq!(host.timers.pending(), 0);
    }
}
