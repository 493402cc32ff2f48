//! Core value types shared across the tool engine: points, keys, hotkeys,
//! and local future helpers.

/// Async future aliases and single-step polling.
pub mod future;
/// Two-dimensional positions in view coordinates.
pub mod geometry;
/// Key, modifier, mouse button, and hotkey types.
pub mod key;

pub use future::{BoxFutureLocal, poll_once};
pub use geometry::Point;
pub use key::{Hotkey, HotkeyParseError, Key, Modifiers, MouseButtons};
