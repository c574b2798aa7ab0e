use anyhow::{Context, Result};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::event::ScreenEvent;
use crate::camera::{
    BoundCamera, CameraBinder, CameraSelector, CameraWorker, Lifecycle, LifecycleState, Preview,
    PreviewSurface, VideoCapture,
};
use crate::main_loop::{MainHandle, MainLoop};
use crate::permissions::{
    PermissionGate, PermissionResult, REQUEST_CODE_PERMISSIONS, REQUIRED_PERMISSIONS,
};
use crate::recording::{Recorder, RecordingController, RecordingDiagnostics, RecordingSettings};

/// External services the screen talks to
#[derive(Clone)]
pub struct ScreenDeps {
    pub permissions: Arc<dyn PermissionGate>,
    pub binder: Arc<dyn CameraBinder>,
    pub recorder: Arc<dyn Recorder>,
}

/// Configuration for the capture screen
#[derive(Debug, Clone, Default)]
pub struct ScreenSettings {
    pub selector: CameraSelector,
    pub recording: RecordingSettings,
    /// Press capture as soon as the camera is bound, then close the screen once
    /// that clip is finalized or if the camera never comes up
    pub once: bool,
}

/// Screen controller
///
/// All fields are only touched from the main loop.
pub struct CaptureScreen {
    deps: ScreenDeps,
    settings: ScreenSettings,
    main_loop: MainLoop<ScreenEvent>,
    lifecycle: Lifecycle,
    worker: CameraWorker,
    preview: Preview,
    /// Set on a successful bind, cleared on teardown
    camera: Option<BoundCamera>,
    controller: RecordingController,
}

impl CaptureScreen {
    /// Create the screen. Must be called inside a tokio runtime.
    pub fn new(deps: ScreenDeps, settings: ScreenSettings) -> Self {
        let main_loop = MainLoop::new();
        let controller = RecordingController::new(
            main_loop.handle(),
            Arc::clone(&deps.permissions),
            settings.recording.clone(),
        );

        Self {
            deps,
            settings,
            main_loop,
            lifecycle: Lifecycle::new(),
            worker: CameraWorker::new(),
            preview: Preview::new(PreviewSurface::new()),
            camera: None,
            controller,
        }
    }

    /// Posting handle for input sources
    pub fn handle(&self) -> MainHandle<ScreenEvent> {
        self.main_loop.handle()
    }

    pub fn preview_surface(&self) -> &PreviewSurface {
        &self.preview.surface
    }

    pub fn camera(&self) -> Option<&BoundCamera> {
        self.camera.as_ref()
    }

    pub fn controller(&self) -> &RecordingController {
        &self.controller
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Check permissions and either start the camera or ask for them
    pub fn on_create(&mut self) {
        info!("Capture screen created ({:?} camera)", self.settings.selector);

        if self.deps.permissions.all_granted(&REQUIRED_PERMISSIONS) {
            self.start_camera();
        } else {
            self.deps.permissions.request(
                &REQUIRED_PERMISSIONS,
                REQUEST_CODE_PERMISSIONS,
                self.main_loop.handle().listener(ScreenEvent::PermissionsResult),
            );
        }

        self.lifecycle.advance(LifecycleState::Started);
    }

    /// Wait for the next event on the main loop
    pub async fn next_event(&mut self) -> Option<ScreenEvent> {
        self.main_loop.next().await
    }

    /// Take the next event if one is already queued
    pub fn try_next_event(&mut self) -> Option<ScreenEvent> {
        self.main_loop.try_next()
    }

    /// Handle one event. `Break` means the screen has been destroyed.
    pub fn handle_event(&mut self, event: ScreenEvent) -> ControlFlow<()> {
        match event {
            ScreenEvent::RecordPressed => self.on_record_pressed(),
            ScreenEvent::PermissionsResult(result) => self.on_permissions_result(result),
            ScreenEvent::CameraBound(result) => self.on_camera_bound(result),
            ScreenEvent::Recording(event) => {
                self.controller.dispatch(event);
                if self.settings.once
                    && self.controller.diagnostics().finalized > 0
                    && self.controller.active_count() == 0
                {
                    self.on_destroy();
                    return ControlFlow::Break(());
                }
            }
            ScreenEvent::StopTimerElapsed { recording_id } => {
                report_uncaught("stop timer", self.controller.on_stop_timer(recording_id));
            }
            ScreenEvent::Destroy => {
                self.on_destroy();
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    /// Create, then drain the main loop until the screen is destroyed
    pub async fn run(mut self) -> Result<RecordingDiagnostics> {
        self.on_create();

        while let Some(event) = self.next_event().await {
            if self.handle_event(event).is_break() {
                break;
            }
        }

        Ok(self.controller.diagnostics().clone())
    }

    /// Tear down: stop recordings, end the lifecycle, stop the worker
    pub fn on_destroy(&mut self) {
        if self.lifecycle.is_destroyed() {
            return;
        }

        info!("Capture screen destroyed");
        self.controller.shutdown();
        self.lifecycle.advance(LifecycleState::Destroyed);
        self.worker.shutdown();
        self.camera = None;
    }

    fn on_record_pressed(&mut self) {
        let Some(camera) = &self.camera else {
            debug!("Capture pressed with no bound camera");
            return;
        };

        let capture = camera.capture.clone();
        report_uncaught("record", self.controller.record(&capture).map(|_| ()));
    }

    fn on_permissions_result(&mut self, result: PermissionResult) {
        if result.request_code != REQUEST_CODE_PERMISSIONS {
            return;
        }

        if result.all_granted() {
            info!("Permissions granted: {:?}", result.grants);
        } else {
            warn!("Permissions not granted: {:?}", result.grants);
        }

        // The preview only starts from on_create, so there is nothing left to wait for
        if self.settings.once {
            self.main_loop.handle().post(ScreenEvent::Destroy);
        }
    }

    fn start_camera(&mut self) {
        let binder = Arc::clone(&self.deps.binder);
        let lifecycle = self.lifecycle.clone();
        let selector = self.settings.selector;
        let preview = self.preview.clone();
        let capture = VideoCapture::with_output(Arc::clone(&self.deps.recorder));
        let main = self.main_loop.handle();

        let submitted = self.worker.submit(async move {
            let result = bind_camera(binder.as_ref(), &lifecycle, selector, &preview, capture).await;
            main.post(ScreenEvent::CameraBound(result));
        });

        if let Err(e) = submitted {
            error!("Failed to schedule camera bind: {:#}", e);
        }
    }

    fn on_camera_bound(&mut self, result: Result<BoundCamera>) {
        match result {
            Ok(bound) => {
                info!(
                    "Camera bound: {} ({:?}, session {})",
                    bound.session.camera_name, bound.session.selector, bound.session.id
                );
                self.camera = Some(bound);

                if self.settings.once {
                    let before = self.controller.diagnostics().recordings_started;
                    self.on_record_pressed();
                    if self.controller.diagnostics().recordings_started == before {
                        self.main_loop.handle().post(ScreenEvent::Destroy);
                    }
                }
            }
            Err(e) => {
                error!("cameraError: {:#}", e);
                self.camera = None;

                if self.settings.once {
                    self.main_loop.handle().post(ScreenEvent::Destroy);
                }
            }
        }
    }
}

async fn bind_camera(
    binder: &dyn CameraBinder,
    lifecycle: &Lifecycle,
    selector: CameraSelector,
    preview: &Preview,
    capture: VideoCapture,
) -> Result<BoundCamera> {
    binder
        .unbind_all()
        .await
        .context("Failed to unbind previous session")?;

    let session = binder
        .bind_to_lifecycle(lifecycle, selector, preview, &capture)
        .await
        .with_context(|| format!("{} rejected {:?} camera", binder.name(), selector))?;

    Ok(BoundCamera { session, capture })
}

/// Errors from recorder calls end the operation that raised them, nothing else
fn report_uncaught(operation: &str, result: Result<()>) {
    if let Err(e) = result {
        error!("Uncaught error in {}: {:#}", operation, e);
    }
}
