//! Camera backends
//!
//! Platform-specific implementations of `CameraBinder` and `Recorder`:
//! - Virtual: synthetic cameras and a recorder writing placeholder clips, for
//!   development machines without camera hardware and for tests

pub mod virtual_camera;

pub use virtual_camera::{VirtualCameraBinder, VirtualRecorder};
