use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::camera::{CameraSelector, Quality};
use crate::permissions::{ConsentPolicy, Permission};
use crate::recording::DEFAULT_RECORDING_DURATION;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub camera: CameraConfig,
    pub recording: RecordingConfig,
    pub media: MediaConfig,
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    pub selector: CameraSelector,
    pub quality: Quality,
    /// Lenses the virtual backend exposes
    pub available: Vec<CameraSelector>,
}

#[derive(Debug, Deserialize)]
pub struct RecordingConfig {
    pub duration_ms: u64,
    pub status_interval_ms: u64,
}

impl RecordingConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct MediaConfig {
    pub videos_path: String,
    pub fallback_path: String,
}

#[derive(Debug, Deserialize)]
pub struct PermissionsConfig {
    pub camera: bool,
    pub microphone: bool,
    pub on_request: ConsentPolicy,
}

impl PermissionsConfig {
    /// Permissions granted at startup
    pub fn granted(&self) -> Vec<Permission> {
        let mut granted = Vec::new();
        if self.camera {
            granted.push(Permission::Camera);
        }
        if self.microphone {
            granted.push(Permission::Microphone);
        }
        granted
    }
}

impl Config {
    /// Load defaults, then `path` (any format `config` understands, optional),
    /// then `CLIPCAM__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = Self::with_defaults()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CLIPCAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Built-in defaults only
    pub fn defaults() -> Result<Self> {
        Ok(Self::with_defaults()?.build()?.try_deserialize()?)
    }

    fn validate(&self) -> Result<()> {
        if self.recording.status_interval_ms == 0 {
            bail!("recording.status_interval_ms must be greater than zero");
        }
        Ok(())
    }

    fn with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("service.name", "clipcam")?
            .set_default("camera.selector", "front")?
            .set_default("camera.quality", "fhd")?
            .set_default("camera.available", vec!["front", "back"])?
            .set_default(
                "recording.duration_ms",
                DEFAULT_RECORDING_DURATION.as_millis() as i64,
            )?
            .set_default("recording.status_interval_ms", 1_000i64)?
            .set_default("media.videos_path", "~/Videos/clipcam")?
            .set_default("media.fallback_path", "./recordings")?
            .set_default("permissions.camera", true)?
            .set_default("permissions.microphone", true)?
            .set_default("permissions.on_request", "deny")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::defaults().unwrap();

        assert_eq!(cfg.service.name, "clipcam");
        assert_eq!(cfg.camera.selector, CameraSelector::Front);
        assert_eq!(cfg.camera.quality, Quality::Fhd);
        assert_eq!(cfg.recording.duration(), DEFAULT_RECORDING_DURATION);
        assert_eq!(cfg.recording.duration(), Duration::from_millis(10_000));
        assert_eq!(cfg.permissions.on_request, ConsentPolicy::Deny);
        assert_eq!(
            cfg.permissions.granted(),
            vec![Permission::Camera, Permission::Microphone]
        );
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("clipcam.toml");
        std::fs::write(
            &path,
            r#"
[camera]
selector = "back"
quality = "hd"

[recording]
duration_ms = 2500

[permissions]
microphone = false
on_request = "grant"
"#,
        )
        .unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(cfg.camera.selector, CameraSelector::Back);
        assert_eq!(cfg.camera.quality, Quality::Hd);
        assert_eq!(cfg.recording.duration_ms, 2500);
        assert_eq!(cfg.recording.status_interval_ms, 1000);
        assert_eq!(cfg.permissions.granted(), vec![Permission::Camera]);
        assert_eq!(cfg.permissions.on_request, ConsentPolicy::Grant);
    }

    #[test]
    fn test_zero_status_interval_is_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("clipcam.toml");
        std::fs::write(
            &path,
            r#"
[recording]
status_interval_ms = 0
"#,
        )
        .unwrap();

        let err = Config::load(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("status_interval_ms"), "{}", err);
    }

    #[test]
    fn test_missing_file_is_optional() {
        let cfg = Config::load("does/not/exist/clipcam").unwrap();
        assert_eq!(cfg.media.fallback_path, "./recordings");
    }
}
