//! Flick gestures
//!
//! Touch and pointer gesture recognition for the Flick shell:
//! - [`input::DragStartRecognizer`] decides when a press turns into a drag
//! - [`input::EdgeDragRecognizer`] detects swipes in from a monitor edge
//!
//! Both run on the [`input::GestureDriver`] framework and reach the shell only
//! through [`host::Host`] (settings, monitor layout, timers).

pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod signal;

#[cfg(test)]
mod test_util;

pub use config::GestureSettings;
pub use error::{Error, Result};
