//! Shared helpers for unit tests

use smithay::utils::{Logical, Point, Rectangle};

use crate::config::GestureSettings;
use crate::host::{Monitors, ShellHost, TimerQueue};
use crate::input::{DeviceType, EventKind, InputEvent, BTN_LEFT};

/// Install a test subscriber once; honours `RUST_LOG`
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A 1080x2340 portrait phone screen at the origin
pub(crate) fn screen() -> Rectangle<i32, Logical> {
    Rectangle::new((0, 0).into(), (1080, 2340).into())
}

pub(crate) fn shell_host() -> ShellHost<TimerQueue> {
    init_tracing();
    ShellHost::new(GestureSettings::default(), Monitors::single(screen()), TimerQueue::new())
}

pub(crate) fn touch(kind: EventKind, slot: i32, time_ms: u32, x: f64, y: f64) -> InputEvent {
    InputEvent::touch(kind, slot, time_ms, Point::from((x, y)))
}

pub(crate) fn mouse(kind: EventKind, time_ms: u32, x: f64, y: f64) -> InputEvent {
    let event = InputEvent::pointer(kind, DeviceType::Pointer, time_ms, Point::from((x, y)));
    match kind {
        EventKind::ButtonPress | EventKind::ButtonRelease => event.with_button(BTN_LEFT),
        _ => event,
    }
}
