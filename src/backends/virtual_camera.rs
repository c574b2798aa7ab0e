// Virtual camera backend: synthetic lenses and a recorder that writes placeholder clips

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::camera::{
    CameraBinder, CameraSelector, CameraSession, Lifecycle, Preview, PreviewSurface, Quality,
    VideoCapture,
};
use crate::recording::{
    ActiveRecording, AudioState, EventListener, MediaStore, RecordEvent, Recorder,
    RecordingRequest, RecordingStats,
};

/// Preview frame rate of the virtual cameras
const PREVIEW_FPS: u64 = 30;

/// Payload written per status tick
const SYNTHETIC_BLOCK_BYTES: usize = 4096;

// MARK: - Binder

/// Binder over a fixed set of synthetic cameras
///
/// Holds at most one session. A session follows its lifecycle owner and is torn
/// down when the owner is destroyed.
pub struct VirtualCameraBinder {
    cameras: Vec<CameraSelector>,
    bound: Arc<Mutex<Option<BoundSession>>>,
    binds: AtomicUsize,
}

struct BoundSession {
    session: CameraSession,
    capture_id: Uuid,
    surface: PreviewSurface,
    preview_task: JoinHandle<()>,
    lifecycle_task: JoinHandle<()>,
}

impl BoundSession {
    fn teardown(self) {
        self.preview_task.abort();
        self.lifecycle_task.abort();
        self.surface.detach();
    }
}

impl VirtualCameraBinder {
    pub fn new(cameras: impl IntoIterator<Item = CameraSelector>) -> Self {
        let cameras: Vec<_> = cameras.into_iter().collect();
        info!("Virtual camera backend initialized ({:?})", cameras);

        Self {
            cameras,
            bound: Arc::new(Mutex::new(None)),
            binds: AtomicUsize::new(0),
        }
    }

    /// Currently bound session, if any
    pub fn session(&self) -> Option<CameraSession> {
        lock(&self.bound).as_ref().map(|b| b.session.clone())
    }

    /// Video-capture use case attached to the current session
    pub fn bound_capture_id(&self) -> Option<Uuid> {
        lock(&self.bound).as_ref().map(|b| b.capture_id)
    }

    /// Number of successful binds so far
    pub fn bind_count(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    fn camera_name(selector: CameraSelector) -> String {
        match selector {
            CameraSelector::Front => "Virtual Front Camera".to_string(),
            CameraSelector::Back => "Virtual Back Camera".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl CameraBinder for VirtualCameraBinder {
    async fn unbind_all(&self) -> Result<()> {
        if let Some(previous) = lock(&self.bound).take() {
            info!("Unbinding session {}", previous.session.id);
            previous.teardown();
        }
        Ok(())
    }

    async fn bind_to_lifecycle(
        &self,
        owner: &Lifecycle,
        selector: CameraSelector,
        preview: &Preview,
        capture: &VideoCapture,
    ) -> Result<CameraSession> {
        if owner.is_destroyed() {
            bail!("Lifecycle {} is already destroyed", owner.id());
        }

        if !self.cameras.contains(&selector) {
            bail!("No camera matches selector {:?}", selector);
        }

        let mut bound = lock(&self.bound);

        if let Some(existing) = bound.as_ref() {
            if existing.session.lifecycle_id != owner.id() {
                bail!(
                    "Use case conflict: {} is bound to lifecycle {}",
                    existing.session.camera_name,
                    existing.session.lifecycle_id
                );
            }
        }

        if let Some(previous) = bound.take() {
            previous.teardown();
        }

        let session = CameraSession {
            id: Uuid::new_v4(),
            selector,
            camera_name: Self::camera_name(selector),
            lifecycle_id: owner.id(),
        };

        let surface = preview.surface.clone();
        surface.attach(&session.camera_name);

        let preview_task = {
            let surface = surface.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_millis(1000 / PREVIEW_FPS));
                loop {
                    ticker.tick().await;
                    surface.render_frame();
                }
            })
        };

        let lifecycle_task = {
            let owner = owner.clone();
            let slot = Arc::clone(&self.bound);
            let session_id = session.id;
            tokio::spawn(async move {
                owner.destroyed().await;

                let mut bound = lock(&slot);
                if bound.as_ref().map(|b| b.session.id) == Some(session_id) {
                    if let Some(finished) = bound.take() {
                        info!("Lifecycle {} destroyed, unbinding session {}", owner.id(), session_id);
                        finished.preview_task.abort();
                        finished.surface.detach();
                    }
                }
            })
        };

        info!(
            "Bound {} to lifecycle {} (session {})",
            session.camera_name,
            owner.id(),
            session.id
        );

        *bound = Some(BoundSession {
            session: session.clone(),
            capture_id: capture.id(),
            surface,
            preview_task,
            lifecycle_task,
        });
        self.binds.fetch_add(1, Ordering::SeqCst);

        Ok(session)
    }

    fn name(&self) -> &str {
        "Virtual camera"
    }
}

// MARK: - Recorder

/// Shortest gap between two status reports
pub const MIN_STATUS_INTERVAL: Duration = Duration::from_millis(1);

/// Recorder that writes a synthetic payload into the media store
///
/// The file is named after the output target and grows by a fixed block every
/// status interval. One recording at a time.
pub struct VirtualRecorder {
    media: MediaStore,
    quality: Quality,
    status_interval: Duration,
    active: Arc<Mutex<Option<Uuid>>>,
}

impl VirtualRecorder {
    /// A zero `status_interval` is raised to [`MIN_STATUS_INTERVAL`]
    pub fn new(media: MediaStore, quality: Quality, status_interval: Duration) -> Self {
        if status_interval < MIN_STATUS_INTERVAL {
            warn!(
                "Status interval {:?} too short, using {:?}",
                status_interval, MIN_STATUS_INTERVAL
            );
        }

        Self {
            media,
            quality,
            status_interval: status_interval.max(MIN_STATUS_INTERVAL),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a recording is in progress
    pub fn is_recording(&self) -> bool {
        lock(&self.active).is_some()
    }
}

impl Recorder for VirtualRecorder {
    fn start(&self, request: RecordingRequest) -> Result<Box<dyn ActiveRecording>> {
        let path = self.media.path_for(&request.output)?;
        let id = Uuid::new_v4();

        {
            let mut active = lock(&self.active);
            if let Some(current) = *active {
                bail!("Recorder already has an active recording ({})", current);
            }
            *active = Some(id);
        }

        let job = RecordingJob {
            id,
            path,
            quality: self.quality,
            audio_enabled: request.audio_enabled,
            status_interval: self.status_interval,
            listener: request.listener,
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(run_recording(job, stop_rx, Arc::clone(&self.active)));

        Ok(Box::new(VirtualRecording {
            id,
            stop: stop_tx,
        }))
    }

    fn name(&self) -> &str {
        "Virtual recorder"
    }
}

struct VirtualRecording {
    id: Uuid,
    stop: oneshot::Sender<()>,
}

impl ActiveRecording for VirtualRecording {
    fn id(&self) -> Uuid {
        self.id
    }

    fn stop(self: Box<Self>) -> Result<()> {
        let VirtualRecording { id, stop } = *self;
        if stop.send(()).is_err() {
            debug!("Recording {} already finalized", id);
        }
        Ok(())
    }
}

struct RecordingJob {
    id: Uuid,
    path: PathBuf,
    quality: Quality,
    audio_enabled: bool,
    status_interval: Duration,
    listener: Option<EventListener>,
}

impl RecordingJob {
    fn emit(&self, event: RecordEvent) {
        if let Some(listener) = &self.listener {
            listener(event);
        }
    }
}

async fn run_recording(
    job: RecordingJob,
    mut stop_rx: oneshot::Receiver<()>,
    active: Arc<Mutex<Option<Uuid>>>,
) {
    let mut stats = RecordingStats {
        recorded_duration: Duration::ZERO,
        bytes_written: 0,
        audio: if job.audio_enabled {
            AudioState::Active
        } else {
            AudioState::Disabled
        },
    };

    let error = match write_clip(&job, &mut stop_rx, &mut stats).await {
        Ok(()) => None,
        Err(e) => {
            error!("Recording {} failed: {:#}", job.id, e);
            Some(format!("{:#}", e))
        }
    };

    {
        let mut active = lock(&active);
        if *active == Some(job.id) {
            *active = None;
        }
    }

    job.emit(RecordEvent::Finalize {
        recording_id: job.id,
        stats,
        output_location: job.path.clone(),
        error,
    });
}

async fn write_clip(
    job: &RecordingJob,
    stop_rx: &mut oneshot::Receiver<()>,
    stats: &mut RecordingStats,
) -> Result<()> {
    let mut file = tokio::fs::File::create(&job.path)
        .await
        .with_context(|| format!("Failed to create output file: {:?}", job.path))?;

    let (width, height) = job.quality.resolution();
    let header = format!(
        "clipcam-virtual {}x{} {}bps audio={}\n",
        width,
        height,
        job.quality.bitrate_bps(),
        job.audio_enabled
    );
    file.write_all(header.as_bytes())
        .await
        .context("Failed to write clip header")?;
    stats.bytes_written += header.len() as u64;

    job.emit(RecordEvent::Start { recording_id: job.id });

    let started = Instant::now();
    let block = vec![0u8; SYNTHETIC_BLOCK_BYTES];
    let mut ticker = tokio::time::interval(job.status_interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut *stop_rx => break,
            _ = ticker.tick() => {
                file.write_all(&block)
                    .await
                    .context("Failed to write clip data")?;
                stats.bytes_written += block.len() as u64;
                stats.recorded_duration = started.elapsed();

                job.emit(RecordEvent::Status {
                    recording_id: job.id,
                    stats: stats.clone(),
                });
            }
        }
    }

    stats.recorded_duration = started.elapsed();
    file.flush().await.context("Failed to flush clip")?;
    file.sync_all().await.context("Failed to sync clip")?;

    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
