//! The capture screen
//!
//! One screen, one preview, one capture control. `CaptureScreen` owns the
//! camera session and the recording controller and runs on the main loop.

mod event;
mod input;
mod screen;

pub use event::ScreenEvent;
pub use input::{forward_commands, parse_command, spawn_ctrl_c, spawn_terminal_input};
pub use screen::{CaptureScreen, ScreenDeps, ScreenSettings};
