use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use super::events::EventListener;
use super::output::OutputTarget;

/// Everything a recorder needs to start one recording
#[derive(Clone)]
pub struct RecordingRequest {
    pub output: OutputTarget,
    pub audio_enabled: bool,
    pub listener: Option<EventListener>,
}

/// Encoder side of the video-capture use case
pub trait Recorder: Send + Sync {
    /// Start a recording
    ///
    /// Returns as soon as the start command is issued; progress is reported
    /// through the request's listener.
    fn start(&self, request: RecordingRequest) -> Result<Box<dyn ActiveRecording>>;

    /// Get recorder name for logging
    fn name(&self) -> &str;
}

/// An in-progress recording
pub trait ActiveRecording: Send {
    fn id(&self) -> Uuid;

    /// Ask the recorder to finish the output. `Finalize` follows asynchronously.
    fn stop(self: Box<Self>) -> Result<()>;
}

/// A recording that has been configured but not started
pub struct PendingRecording {
    recorder: Arc<dyn Recorder>,
    request: RecordingRequest,
}

impl PendingRecording {
    pub(crate) fn new(recorder: Arc<dyn Recorder>, output: OutputTarget) -> Self {
        Self {
            recorder,
            request: RecordingRequest {
                output,
                audio_enabled: false,
                listener: None,
            },
        }
    }

    pub fn with_event_listener(mut self, listener: EventListener) -> Self {
        self.request.listener = Some(listener);
        self
    }

    pub fn with_audio_enabled(mut self) -> Self {
        self.request.audio_enabled = true;
        self
    }

    pub fn audio_enabled(&self) -> bool {
        self.request.audio_enabled
    }

    pub fn output(&self) -> &OutputTarget {
        &self.request.output
    }

    pub fn start(self) -> Result<Box<dyn ActiveRecording>> {
        self.recorder.start(self.request)
    }
}
