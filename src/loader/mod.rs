pub mod allure;
pub mod video;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::Diagnostics;
use crate::error::ArtifactError;
use crate::models::TestResultRecord;

pub use allure::parse_artifact;
pub use video::VideoLocator;

/// File name suffix Allure uses for per-test result artifacts.
pub const RESULT_SUFFIX: &str = "-result.json";

/// Reads a directory of Allure result artifacts into normalized records.
pub struct ResultLoader {
    results_dir: PathBuf,
    videos: VideoLocator,
    diagnostics: Arc<Diagnostics>,
}

impl ResultLoader {
    pub fn new(
        results_dir: impl AsRef<Path>,
        videos: VideoLocator,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            results_dir: absolute(results_dir.as_ref()),
            videos,
            diagnostics,
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Parse every artifact in the results directory.
    ///
    /// Never fails: a missing directory yields no records and unreadable or
    /// malformed artifacts are skipped, each leaving a diagnostic behind.
    pub fn load(&self) -> Vec<TestResultRecord> {
        let dir = &self.results_dir;
        self.diagnostics
            .info(format!("Searching for result files in {}", dir.display()));

        if !dir.is_dir() {
            self.diagnostics.error(format!(
                "Results directory {} does not exist",
                dir.display()
            ));
            return Vec::new();
        }

        let artifacts = self.find_artifacts();
        if artifacts.is_empty() {
            self.diagnostics.warn(format!(
                "No '*{}' files found in {}",
                RESULT_SUFFIX,
                dir.display()
            ));
        }

        let mut records = Vec::with_capacity(artifacts.len());
        for path in artifacts {
            match self.load_file(&path) {
                Ok(record) => {
                    tracing::debug!(
                        "{} {} ({})",
                        record.status.icon(),
                        record.name,
                        path.display()
                    );
                    records.push(record);
                }
                Err(e) => self
                    .diagnostics
                    .error(format!("Skipping {}: {}", path.display(), e)),
            }
        }

        self.diagnostics
            .info(format!("Loaded {} test results", records.len()));
        records
    }

    fn load_file(&self, path: &Path) -> Result<TestResultRecord, ArtifactError> {
        let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_artifact(&text, &self.videos)
    }

    fn find_artifacts(&self) -> Vec<PathBuf> {
        let pattern = format!(
            "{}/*{}",
            glob::Pattern::escape(&self.results_dir.to_string_lossy()),
            RESULT_SUFFIX
        );

        match glob::glob(&pattern) {
            Ok(entries) => entries.flatten().filter(|p| p.is_file()).collect(),
            Err(e) => {
                self.diagnostics
                    .error(format!("Invalid results pattern {}: {}", pattern, e));
                Vec::new()
            }
        }
    }
}

/// Resolve `path` against the working directory without touching the filesystem.
pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
