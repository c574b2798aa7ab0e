//! Recording sessions
//!
//! This module provides:
//! - The events a recorder reports while a clip is written
//! - The `Recorder` abstraction and the pending-recording builder
//! - Output naming and the shared media store
//! - `RecordingController`, which starts clips and stops them after a fixed delay

mod controller;
mod events;
mod output;
mod recorder;

pub use controller::{
    RecordingController, RecordingDiagnostics, RecordingSettings, RecordingState,
    DEFAULT_RECORDING_DURATION,
};
pub use events::{AudioState, EventListener, RecordEvent, RecordingStats};
pub use output::{MediaCollection, MediaStore, OutputTarget, FILENAME_FORMAT};
pub use recorder::{ActiveRecording, PendingRecording, Recorder, RecordingRequest};
