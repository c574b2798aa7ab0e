// Shared fakes for the integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use clipcam::main_loop::Listener;
use clipcam::recording::{ActiveRecording, AudioState, RecordingRequest, RecordingStats};
use clipcam::{
    CameraSelector, CaptureScreen, ConsentPolicy, Permission, RecordEvent, Recorder,
    RecordingSettings, ScreenDeps, ScreenEvent, ScreenSettings, StaticPermissionGate,
    VirtualCameraBinder,
};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// A start call seen by [`FakeRecorder`]
#[derive(Debug, Clone)]
pub struct StartCall {
    pub id: Uuid,
    pub at: Instant,
    pub audio_enabled: bool,
    pub display_name: String,
}

/// Recorder that only records what it was asked to do
///
/// Emits `Start` from `start` and `Finalize` from `stop`.
#[derive(Default)]
pub struct FakeRecorder {
    pub starts: Mutex<Vec<StartCall>>,
    pub stops: Arc<Mutex<Vec<(Uuid, Instant)>>>,
    pub fail_start: AtomicBool,
}

impl FakeRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn starts(&self) -> Vec<StartCall> {
        self.starts.lock().unwrap().clone()
    }

    pub fn stops(&self) -> Vec<(Uuid, Instant)> {
        self.stops.lock().unwrap().clone()
    }
}

impl Recorder for FakeRecorder {
    fn start(&self, request: RecordingRequest) -> Result<Box<dyn ActiveRecording>> {
        if self.fail_start.load(Ordering::SeqCst) {
            bail!("encoder unavailable");
        }

        let id = Uuid::new_v4();
        self.starts.lock().unwrap().push(StartCall {
            id,
            at: Instant::now(),
            audio_enabled: request.audio_enabled,
            display_name: request.output.display_name.clone(),
        });

        if let Some(listener) = &request.listener {
            listener(RecordEvent::Start { recording_id: id });
        }

        Ok(Box::new(FakeRecording {
            id,
            display_name: request.output.display_name,
            audio_enabled: request.audio_enabled,
            stops: Arc::clone(&self.stops),
            listener: request.listener,
        }))
    }

    fn name(&self) -> &str {
        "Fake recorder"
    }
}

struct FakeRecording {
    id: Uuid,
    display_name: String,
    audio_enabled: bool,
    stops: Arc<Mutex<Vec<(Uuid, Instant)>>>,
    listener: Option<Listener<RecordEvent>>,
}

impl ActiveRecording for FakeRecording {
    fn id(&self) -> Uuid {
        self.id
    }

    fn stop(self: Box<Self>) -> Result<()> {
        self.stops.lock().unwrap().push((self.id, Instant::now()));

        if let Some(listener) = &self.listener {
            listener(RecordEvent::Finalize {
                recording_id: self.id,
                stats: stats(Duration::from_secs(10), self.audio_enabled),
                output_location: PathBuf::from(&self.display_name),
                error: None,
            });
        }
        Ok(())
    }
}

pub fn stats(recorded: Duration, audio: bool) -> RecordingStats {
    RecordingStats {
        recorded_duration: recorded,
        bytes_written: 4096,
        audio: if audio {
            AudioState::Active
        } else {
            AudioState::Disabled
        },
    }
}

pub fn gate(camera: bool, microphone: bool) -> Arc<StaticPermissionGate> {
    let mut granted = Vec::new();
    if camera {
        granted.push(Permission::Camera);
    }
    if microphone {
        granted.push(Permission::Microphone);
    }
    Arc::new(StaticPermissionGate::new(granted, ConsentPolicy::Deny))
}

pub fn screen(
    permissions: Arc<StaticPermissionGate>,
    binder: Arc<VirtualCameraBinder>,
    recorder: Arc<dyn Recorder>,
) -> CaptureScreen {
    CaptureScreen::new(
        ScreenDeps {
            permissions,
            binder,
            recorder,
        },
        ScreenSettings {
            selector: CameraSelector::Front,
            recording: RecordingSettings::default(),
            once: false,
        },
    )
}

/// Handle events until `stop` matches one (after handling it) or the screen closes
pub async fn pump_until<F>(screen: &mut CaptureScreen, mut stop: F) -> ControlFlow<()>
where
    F: FnMut(&ScreenEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(Duration::from_secs(120), screen.next_event())
            .await
            .expect("timed out waiting for a screen event")
            .expect("main loop closed");

        let hit = stop(&event);
        let flow = screen.handle_event(event);
        if hit || flow.is_break() {
            return flow;
        }
    }
}

/// Whether `name` looks like `yyyy-MM-dd-HH-mm-ss-SSS.mp4`
pub fn is_clip_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".mp4") else {
        return false;
    };

    let parts: Vec<&str> = stem.split('-').collect();
    let widths = [4, 2, 2, 2, 2, 2, 3];

    parts.len() == widths.len()
        && parts
            .iter()
            .zip(widths)
            .all(|(part, width)| part.len() == width && part.chars().all(|c| c.is_ascii_digit()))
}
