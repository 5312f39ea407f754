//! Input events as seen by gesture recognizers
//!
//! Backends translate their libinput / winit events into [`InputEvent`]s and
//! feed them to a [`GestureDriver`](super::GestureDriver).

use smithay::utils::{Logical, Point};

/// Primary (left) mouse button, evdev `BTN_LEFT`
pub const BTN_LEFT: u32 = 0x110;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ButtonPress,
    ButtonRelease,
    Motion,
    TouchBegin,
    TouchUpdate,
    TouchEnd,
    TouchCancel,
}

impl EventKind {
    /// Events that start a new point sequence
    pub fn is_begin(self) -> bool {
        matches!(self, EventKind::ButtonPress | EventKind::TouchBegin)
    }

    /// Events that finish a point sequence
    pub fn is_end(self) -> bool {
        matches!(
            self,
            EventKind::ButtonRelease | EventKind::TouchEnd | EventKind::TouchCancel
        )
    }
}

/// Kind of device that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Pointer,
    Touchpad,
    Touchscreen,
    Tablet,
    Keyboard,
}

impl DeviceType {
    /// Mice and touchpads start drags as soon as the threshold is crossed
    pub fn is_pointer_or_touchpad(self) -> bool {
        matches!(self, DeviceType::Pointer | DeviceType::Touchpad)
    }
}

/// Identifies the contact an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sequence {
    /// The (single) pointer of the seat
    Pointer,
    /// A touch slot
    Touch(i32),
}

/// A single input event with absolute position and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub kind: EventKind,
    pub sequence: Sequence,
    pub device: DeviceType,
    /// Event time in milliseconds, wraps like libinput's 32-bit timestamps
    pub time_ms: u32,
    /// Absolute position in logical (global) coordinates
    pub position: Point<f64, Logical>,
    /// Button code for button events
    pub button: Option<u32>,
}

impl InputEvent {
    pub fn touch(kind: EventKind, slot: i32, time_ms: u32, position: Point<f64, Logical>) -> Self {
        Self {
            kind,
            sequence: Sequence::Touch(slot),
            device: DeviceType::Touchscreen,
            time_ms,
            position,
            button: None,
        }
    }

    pub fn pointer(
        kind: EventKind,
        device: DeviceType,
        time_ms: u32,
        position: Point<f64, Logical>,
    ) -> Self {
        Self {
            kind,
            sequence: Sequence::Pointer,
            device,
            time_ms,
            position,
            button: None,
        }
    }

    pub fn with_button(mut self, button: u32) -> Self {
        self.button = Some(button);
        self
    }

    /// Press of the primary mouse button
    pub fn is_primary_button_press(&self) -> bool {
        self.kind == EventKind::ButtonPress && self.button == Some(BTN_LEFT)
    }

    /// Milliseconds between `earlier` and this event, tolerant of timestamp wrap
    pub fn elapsed_since(&self, earlier: &InputEvent) -> u32 {
        self.time_ms.wrapping_sub(earlier.time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_end_kinds() {
        assert!(EventKind::TouchBegin.is_begin());
        assert!(EventKind::ButtonPress.is_begin());
        assert!(!EventKind::Motion.is_begin());
        assert!(EventKind::TouchCancel.is_end());
        assert!(!EventKind::TouchUpdate.is_end());
    }

    #[test]
    fn test_primary_button() {
        let press = InputEvent::pointer(
            EventKind::ButtonPress,
            DeviceType::Pointer,
            0,
            Point::from((0.0, 0.0)),
        );
        assert!(press.clone().with_button(BTN_LEFT).is_primary_button_press());
        // No button code at all
        assert!(!press.is_primary_button_press());
        // BTN_RIGHT
        assert!(!press.with_button(0x111).is_primary_button_press());
    }

    #[test]
    fn test_elapsed_wraps() {
        let early = InputEvent::touch(EventKind::TouchBegin, 0, u32::MAX - 9, Point::from((0.0, 0.0)));
        let late = InputEvent::touch(EventKind::TouchUpdate, 0, 10, Point::from((0.0, 0.0)));
        assert_eq!(late.elapsed_since(&early), 20);
    }
}
