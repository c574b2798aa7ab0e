//! Runtime permission checks
//!
//! The screen needs camera and microphone access. Both are checked before the
//! preview starts; the microphone is checked again every time a recording is
//! requested to decide whether the clip gets an audio track.

mod gate;

pub use gate::{
    ConsentPolicy, Permission, PermissionGate, PermissionResult, StaticPermissionGate,
    REQUEST_CODE_PERMISSIONS, REQUIRED_PERMISSIONS,
};
