use std::path::{Path, PathBuf};

use super::absolute;

/// Container formats the browser recorder is known to produce.
pub const VIDEO_EXTENSIONS: [&str; 4] = ["webm", "mp4", "avi", "mov"];

/// Finds the recorded video for a test by looking for its uuid in file names.
#[derive(Debug, Clone)]
pub struct VideoLocator {
    dir: PathBuf,
}

impl VideoLocator {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: absolute(dir.as_ref()),
        }
    }

    /// First video whose file name contains `uuid`.
    ///
    /// Matching is a case-sensitive substring test in directory enumeration
    /// order, so ids that prefix one another can pick either file.
    pub fn find(&self, uuid: &str) -> Option<PathBuf> {
        if uuid.is_empty() {
            return None;
        }
        let entries = std::fs::read_dir(&self.dir).ok()?;

        entries
            .flatten()
            .map(|entry| entry.path())
            .find(|path| is_video(path) && file_name_contains(path, uuid) && path.is_file())
    }
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext))
}

fn file_name_contains(path: &Path, needle: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.contains(needle))
}
