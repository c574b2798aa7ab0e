//! Camera binding
//!
//! This module provides:
//! - Lifecycle owners that bound sessions follow
//! - Camera selection and recorder quality
//! - The preview and video-capture use cases
//! - The `CameraBinder` abstraction implemented by backends
//! - A single background worker that runs bind jobs

mod binder;
mod lifecycle;
mod use_cases;
mod worker;

pub use binder::{BoundCamera, CameraBinder, CameraSession};
pub use lifecycle::{Lifecycle, LifecycleState};
pub use use_cases::{CameraSelector, Preview, PreviewSurface, Quality, VideoCapture};
pub use worker::CameraWorker;
