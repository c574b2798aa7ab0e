use anyhow::Result;
use uuid::Uuid;

use crate::camera::BoundCamera;
use crate::permissions::PermissionResult;
use crate::recording::RecordEvent;

/// Everything the capture screen reacts to
#[derive(Debug)]
pub enum ScreenEvent {
    /// The capture control was pressed
    RecordPressed,

    /// The consent flow finished
    PermissionsResult(PermissionResult),

    /// The camera worker finished a bind attempt
    CameraBound(Result<BoundCamera>),

    /// A recorder reported progress
    Recording(RecordEvent),

    /// A recording reached its fixed duration
    StopTimerElapsed { recording_id: Uuid },

    /// Tear the screen down
    Destroy,
}
