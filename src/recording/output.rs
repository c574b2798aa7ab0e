use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Display-name timestamp format (`yyyy-MM-dd-HH-mm-ss-SSS`)
pub const FILENAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

/// Shared media collections a recording can be written into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCollection {
    Video,
}

/// Where a single recording goes
///
/// Computed fresh for every recording request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub display_name: String,
    pub collection: MediaCollection,
}

impl OutputTarget {
    /// Target named after the current local time
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    /// Target named after `timestamp`
    pub fn at<Tz: TimeZone>(timestamp: DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            display_name: format!("{}.mp4", timestamp.format(FILENAME_FORMAT)),
            collection: MediaCollection::Video,
        }
    }
}

/// Resolves media collections to directories on disk
#[derive(Debug, Clone)]
pub struct MediaStore {
    videos_dir: PathBuf,
}

impl MediaStore {
    /// Media store rooted at an existing or creatable videos directory
    pub fn new(videos_dir: impl Into<PathBuf>) -> Result<Self> {
        let videos_dir = videos_dir.into();
        fs::create_dir_all(&videos_dir)
            .with_context(|| format!("Failed to create videos directory: {:?}", videos_dir))?;

        Ok(Self { videos_dir })
    }

    /// Open the shared videos directory, falling back to a private one
    ///
    /// Both paths are tilde-expanded. The fallback is only used when the
    /// primary directory cannot be created.
    pub fn open(videos_path: &str, fallback_path: &str) -> Result<Self> {
        let primary = expand(videos_path);

        match Self::new(&primary) {
            Ok(store) => {
                info!("Media store: {}", store.videos_dir.display());
                Ok(store)
            }
            Err(e) => {
                let fallback = expand(fallback_path);
                if fallback == primary {
                    return Err(e);
                }

                warn!(
                    "Shared videos directory unavailable ({:#}), using {}",
                    e,
                    fallback.display()
                );
                Self::new(fallback)
            }
        }
    }

    /// Directory backing `collection`
    pub fn collection_dir(&self, collection: MediaCollection) -> &Path {
        match collection {
            MediaCollection::Video => &self.videos_dir,
        }
    }

    /// Full path a target is written to
    pub fn path_for(&self, target: &OutputTarget) -> Result<PathBuf> {
        let name = Path::new(&target.display_name);
        if name.file_name() != Some(name.as_os_str()) {
            bail!("Invalid display name: {}", target.display_name);
        }

        Ok(self.collection_dir(target.collection).join(name))
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}
