use anyhow::Result;
use uuid::Uuid;

use super::lifecycle::Lifecycle;
use super::use_cases::{CameraSelector, Preview, VideoCapture};

/// Handle to an active camera pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSession {
    pub id: Uuid,
    pub selector: CameraSelector,
    pub camera_name: String,
    /// Lifecycle owner the session follows
    pub lifecycle_id: Uuid,
}

/// A successful bind as seen by the screen: the session plus the capture use
/// case recordings are started against
#[derive(Debug, Clone)]
pub struct BoundCamera {
    pub session: CameraSession,
    pub capture: VideoCapture,
}

/// Camera binding backend trait
///
/// Implementations:
/// - Virtual: synthetic cameras for development and tests
#[async_trait::async_trait]
pub trait CameraBinder: Send + Sync {
    /// Unbind every use case from every session
    async fn unbind_all(&self) -> Result<()>;

    /// Bind the preview and capture use cases to the camera picked by `selector`
    ///
    /// The session stays active until `owner` is destroyed or the binder is
    /// unbound, whichever comes first. Fails if no camera matches or the use
    /// cases cannot be combined.
    async fn bind_to_lifecycle(
        &self,
        owner: &Lifecycle,
        selector: CameraSelector,
        preview: &Preview,
        capture: &VideoCapture,
    ) -> Result<CameraSession>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
