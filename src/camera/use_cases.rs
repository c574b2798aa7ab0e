use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::recording::{OutputTarget, PendingRecording, Recorder};

/// Which lens to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSelector {
    #[default]
    Front,
    Back,
}

/// Recorder quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Sd,
    Hd,
    #[default]
    Fhd,
    Uhd,
}

impl Quality {
    /// Frame size (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            Quality::Sd => (720, 480),
            Quality::Hd => (1280, 720),
            Quality::Fhd => (1920, 1080),
            Quality::Uhd => (3840, 2160),
        }
    }

    /// Target video bitrate in bits per second
    pub fn bitrate_bps(&self) -> u64 {
        match self {
            Quality::Sd => 2_500_000,
            Quality::Hd => 5_000_000,
            Quality::Fhd => 10_000_000,
            Quality::Uhd => 40_000_000,
        }
    }
}

/// Where preview frames end up
///
/// Presentation is out of scope here; the surface only keeps enough state to
/// tell whether frames are flowing and from which camera.
#[derive(Debug, Clone, Default)]
pub struct PreviewSurface {
    frames: Arc<AtomicU64>,
    attached: Arc<Mutex<Option<String>>>,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by a backend for every rendered frame
    pub fn render_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn attach(&self, camera_name: &str) {
        *self.attached_lock() = Some(camera_name.to_string());
    }

    pub fn detach(&self) {
        *self.attached_lock() = None;
    }

    /// Name of the camera currently feeding this surface
    pub fn attached_camera(&self) -> Option<String> {
        self.attached_lock().clone()
    }

    fn attached_lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.attached.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Preview use case
#[derive(Debug, Clone)]
pub struct Preview {
    pub surface: PreviewSurface,
}

impl Preview {
    pub fn new(surface: PreviewSurface) -> Self {
        Self { surface }
    }
}

/// Video-capture use case
///
/// Wraps the recorder that owns the encoder. Clones refer to the same use case.
#[derive(Clone)]
pub struct VideoCapture {
    id: Uuid,
    recorder: Arc<dyn Recorder>,
}

impl VideoCapture {
    pub fn with_output(recorder: Arc<dyn Recorder>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorder,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn output(&self) -> &Arc<dyn Recorder> {
        &self.recorder
    }

    /// Start configuring a recording into `output`
    pub fn prepare_recording(&self, output: OutputTarget) -> PendingRecording {
        PendingRecording::new(Arc::clone(&self.recorder), output)
    }
}

impl std::fmt::Debug for VideoCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoCapture")
            .field("id", &self.id)
            .field("recorder", &self.recorder.name())
            .finish()
    }
}
