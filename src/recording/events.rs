use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::main_loop::Listener;

/// Audio track state of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    /// Audio is being captured
    Active,
    /// The recording was started without audio
    Disabled,
}

/// Running totals reported by a recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStats {
    /// Media time written so far
    pub recorded_duration: Duration,

    /// Bytes written to the output so far
    pub bytes_written: u64,

    pub audio: AudioState,
}

/// Events emitted over the life of one recording
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEvent {
    /// The recorder started writing
    Start { recording_id: Uuid },

    Pause {
        recording_id: Uuid,
        stats: RecordingStats,
    },

    Resume {
        recording_id: Uuid,
        stats: RecordingStats,
    },

    /// Periodic progress report
    Status {
        recording_id: Uuid,
        stats: RecordingStats,
    },

    /// The output is complete (or the recording failed). Always the last event.
    Finalize {
        recording_id: Uuid,
        stats: RecordingStats,
        output_location: PathBuf,
        error: Option<String>,
    },
}

impl RecordEvent {
    pub fn recording_id(&self) -> Uuid {
        match self {
            RecordEvent::Start { recording_id }
            | RecordEvent::Pause { recording_id, .. }
            | RecordEvent::Resume { recording_id, .. }
            | RecordEvent::Status { recording_id, .. }
            | RecordEvent::Finalize { recording_id, .. } => *recording_id,
        }
    }
}

/// Callback receiving recorder events
pub type EventListener = Listener<RecordEvent>;
