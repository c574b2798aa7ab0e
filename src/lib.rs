pub mod backends;
pub mod camera;
pub mod config;
pub mod main_loop;
pub mod permissions;
pub mod recording;
pub mod screen;

pub use backends::{VirtualCameraBinder, VirtualRecorder};
pub use camera::{
    BoundCamera, CameraBinder, CameraSelector, CameraSession, CameraWorker, Lifecycle,
    LifecycleState, Preview, PreviewSurface, Quality, VideoCapture,
};
pub use config::Config;
pub use main_loop::{DelayedTask, Listener, MainHandle, MainLoop};
pub use permissions::{
    ConsentPolicy, Permission, PermissionGate, PermissionResult, StaticPermissionGate,
};
pub use recording::{
    ActiveRecording, MediaStore, OutputTarget, RecordEvent, Recorder, RecordingController,
    RecordingSettings, RecordingState, RecordingStats,
};
pub use screen::{CaptureScreen, ScreenDeps, ScreenEvent, ScreenSettings};
