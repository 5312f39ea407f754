//! Gesture recognition - framework plus the shell's recognizers
//!
//! This module provides:
//! - Input event types fed in by the backends
//! - A multi-point gesture framework (points, states, driver)
//! - Drag start detection for drag-and-drop
//! - Screen edge drag detection for panels and overlays

mod dnd_start;
mod driver;
mod edge_drag;
mod event;
mod gesture;

pub use dnd_start::*;
pub use driver::*;
pub use edge_drag::*;
pub use event::*;
pub use gesture::*;
