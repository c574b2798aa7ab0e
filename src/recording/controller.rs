use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::events::{RecordEvent, RecordingStats};
use super::output::OutputTarget;
use super::recorder::ActiveRecording;
use crate::camera::VideoCapture;
use crate::main_loop::{DelayedTask, MainHandle};
use crate::permissions::{Permission, PermissionGate};
use crate::screen::ScreenEvent;

/// How long a clip runs before it is stopped
pub const DEFAULT_RECORDING_DURATION: Duration = Duration::from_millis(10_000);

/// Configuration for the recording controller
#[derive(Debug, Clone)]
pub struct RecordingSettings {
    /// Delay between starting a recording and the stop command
    pub duration: Duration,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            duration: DEFAULT_RECORDING_DURATION,
        }
    }
}

/// Where a recording is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    /// Start command issued, waiting for the recorder's `Start`
    Starting,
    Recording,
    /// Stop command issued, waiting for `Finalize`
    Stopping,
}

/// Counters kept for diagnostics
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    pub recordings_started: u64,
    pub status_events: u64,
    pub last_stats: Option<RecordingStats>,
    pub finalized: u64,
    pub failed: u64,
    pub last_output: Option<PathBuf>,
}

struct ActiveSlot {
    handle: Option<Box<dyn ActiveRecording>>,
    state: RecordingState,
    output: OutputTarget,
    stop_timer: DelayedTask,
}

/// Starts recordings and stops each one a fixed delay later
///
/// Lives on the main loop: recorder events and stop timers are delivered there
/// as [`ScreenEvent`]s and handed back through [`dispatch`](Self::dispatch) and
/// [`on_stop_timer`](Self::on_stop_timer).
pub struct RecordingController {
    main: MainHandle<ScreenEvent>,
    permissions: Arc<dyn PermissionGate>,
    settings: RecordingSettings,
    recordings: HashMap<Uuid, ActiveSlot>,
    latest: Option<Uuid>,
    diagnostics: RecordingDiagnostics,
}

impl RecordingController {
    pub fn new(
        main: MainHandle<ScreenEvent>,
        permissions: Arc<dyn PermissionGate>,
        settings: RecordingSettings,
    ) -> Self {
        Self {
            main,
            permissions,
            settings,
            recordings: HashMap::new(),
            latest: None,
            diagnostics: RecordingDiagnostics::default(),
        }
    }

    /// Start a recording on `capture` and arm its stop timer
    ///
    /// Audio is included only if the microphone is granted right now.
    /// Requests made while another recording is live are passed through to the
    /// recorder unchanged.
    pub fn record(&mut self, capture: &VideoCapture) -> Result<Uuid> {
        if !self.recordings.is_empty() {
            warn!(
                "Recording requested while {} recording(s) still active",
                self.recordings.len()
            );
        }

        let output = OutputTarget::now();
        let mut pending = capture
            .prepare_recording(output.clone())
            .with_event_listener(self.main.listener(ScreenEvent::Recording));

        if self.permissions.is_granted(Permission::Microphone) {
            pending = pending.with_audio_enabled();
        }
        let audio_enabled = pending.audio_enabled();

        let handle = pending
            .start()
            .with_context(|| format!("Failed to start recording {}", output.display_name))?;
        let recording_id = handle.id();

        let stop_timer = self.main.post_delayed(
            self.settings.duration,
            ScreenEvent::StopTimerElapsed { recording_id },
        );

        info!(
            "Recording {} -> {} (audio: {}, stops in {}ms)",
            recording_id,
            output.display_name,
            audio_enabled,
            self.settings.duration.as_millis()
        );

        self.recordings.insert(
            recording_id,
            ActiveSlot {
                handle: Some(handle),
                state: RecordingState::Starting,
                output,
                stop_timer,
            },
        );
        self.latest = Some(recording_id);
        self.diagnostics.recordings_started += 1;

        Ok(recording_id)
    }

    /// Stop a recording whose timer fired
    pub fn on_stop_timer(&mut self, recording_id: Uuid) -> Result<()> {
        let Some(slot) = self.recordings.get_mut(&recording_id) else {
            debug!("Stop timer for finished recording {}", recording_id);
            return Ok(());
        };

        let Some(handle) = slot.handle.take() else {
            return Ok(());
        };

        info!("Stopping recording {} ({})", recording_id, slot.output.display_name);
        slot.state = RecordingState::Stopping;

        handle
            .stop()
            .with_context(|| format!("Failed to stop recording {}", recording_id))
    }

    /// Handle an event reported by the recorder
    pub fn dispatch(&mut self, event: RecordEvent) {
        match event {
            RecordEvent::Start { recording_id } => {
                info!("VIDEO START {}", recording_id);
                if let Some(slot) = self.recordings.get_mut(&recording_id) {
                    if slot.state == RecordingState::Starting {
                        slot.state = RecordingState::Recording;
                    }
                }
            }
            RecordEvent::Pause { recording_id, stats } => {
                info!("VIDEO PAUSE {} at {:?}", recording_id, stats.recorded_duration);
            }
            RecordEvent::Resume { recording_id, stats } => {
                info!("VIDEO RESUME {} at {:?}", recording_id, stats.recorded_duration);
            }
            RecordEvent::Status { recording_id, stats } => {
                debug!(
                    "STATUS {} duration={:?} bytes={} audio={:?}",
                    recording_id, stats.recorded_duration, stats.bytes_written, stats.audio
                );
                self.diagnostics.status_events += 1;
                self.diagnostics.last_stats = Some(stats);
            }
            RecordEvent::Finalize {
                recording_id,
                stats,
                output_location,
                error,
            } => {
                match &error {
                    None => info!(
                        "VIDEO FINALIZE {} -> {} ({:?}, {} bytes)",
                        recording_id,
                        output_location.display(),
                        stats.recorded_duration,
                        stats.bytes_written
                    ),
                    Some(e) => {
                        error!("VIDEO FINALIZE {} failed: {}", recording_id, e);
                        self.diagnostics.failed += 1;
                    }
                }

                // Dropping the slot cancels a stop timer that has not fired yet
                if self.recordings.remove(&recording_id).is_some() && self.latest == Some(recording_id) {
                    self.latest = None;
                }
                self.diagnostics.finalized += 1;
                self.diagnostics.last_stats = Some(stats);
                self.diagnostics.last_output = Some(output_location);
            }
        }
    }

    /// State of the most recently started recording
    pub fn state(&self) -> RecordingState {
        self.latest
            .map(|id| self.state_of(id))
            .unwrap_or(RecordingState::Idle)
    }

    pub fn state_of(&self, recording_id: Uuid) -> RecordingState {
        self.recordings
            .get(&recording_id)
            .map(|slot| slot.state)
            .unwrap_or(RecordingState::Idle)
    }

    /// Number of recordings that have not finalized yet
    pub fn active_count(&self) -> usize {
        self.recordings.len()
    }

    pub fn diagnostics(&self) -> &RecordingDiagnostics {
        &self.diagnostics
    }

    /// Cancel every stop timer and stop every live recording
    pub fn shutdown(&mut self) {
        if self.recordings.is_empty() {
            return;
        }

        info!("Shutting down {} active recording(s)", self.recordings.len());

        for (recording_id, mut slot) in self.recordings.drain() {
            slot.stop_timer.cancel();
            if let Some(handle) = slot.handle.take() {
                if let Err(e) = handle.stop() {
                    error!("Failed to stop recording {} on shutdown: {:#}", recording_id, e);
                }
            }
        }
        self.latest = None;
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
