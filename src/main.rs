use anyhow::{Context, Result};
use clap::Parser;
use clipcam::screen::{spawn_ctrl_c, spawn_terminal_input};
use clipcam::{
    CameraSelector, CaptureScreen, Config, MediaStore, Permission, RecordingSettings,
    ScreenDeps, ScreenSettings, StaticPermissionGate, VirtualCameraBinder,
    VirtualRecorder,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "clipcam")]
#[command(about = "Preview a camera and record fixed-length clips")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/clipcam")]
    config: String,

    /// Camera to open (overrides config)
    #[arg(long, value_parser = parse_selector)]
    camera: Option<CameraSelector>,

    /// Start with camera permission revoked
    #[arg(long)]
    deny_camera: bool,

    /// Start with microphone permission revoked
    #[arg(long)]
    deny_microphone: bool,

    /// Press capture once and exit after the clip is finalized
    #[arg(long)]
    once: bool,
}

fn parse_selector(s: &str) -> Result<CameraSelector, String> {
    match s {
        "front" => Ok(CameraSelector::Front),
        "back" => Ok(CameraSelector::Back),
        other => Err(format!("unknown camera '{}' (expected front or back)", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let permissions = Arc::new(StaticPermissionGate::new(
        cfg.permissions.granted(),
        cfg.permissions.on_request,
    ));
    if args.deny_camera {
        permissions.revoke(Permission::Camera);
    }
    if args.deny_microphone {
        permissions.revoke(Permission::Microphone);
    }

    let media = MediaStore::open(&cfg.media.videos_path, &cfg.media.fallback_path)?;
    let recorder = Arc::new(VirtualRecorder::new(
        media,
        cfg.camera.quality,
        cfg.recording.status_interval(),
    ));
    let binder = Arc::new(VirtualCameraBinder::new(cfg.camera.available.iter().copied()));

    let settings = ScreenSettings {
        selector: args.camera.unwrap_or(cfg.camera.selector),
        recording: RecordingSettings {
            duration: cfg.recording.duration(),
        },
        once: args.once,
    };

    let screen = CaptureScreen::new(
        ScreenDeps {
            permissions,
            binder,
            recorder,
        },
        settings,
    );

    let handle = screen.handle();
    spawn_ctrl_c(handle.clone());

    if !args.once {
        info!("Press Enter to record a clip, q to quit");
        spawn_terminal_input(handle).context("Failed to start input thread")?;
    }

    let diagnostics = screen.run().await?;

    info!(
        "Done: {} recording(s) started, {} finalized, {} failed",
        diagnostics.recordings_started, diagnostics.finalized, diagnostics.failed
    );
    if let Some(path) = diagnostics.last_output {
        info!("Last clip: {}", path.display());
    }

    Ok(())
}
