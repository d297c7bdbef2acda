use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ProgressError, ProgressRecord, ProgressStore};

/// File name of the progress record inside the working directory.
pub const PROGRESS_FILE: &str = "upload_progress.json";

/// Progress store backed by a JSON file in the staging directory.
///
/// Saves are atomic: the record is written to a temp file in the same
/// directory and renamed over the old one, so a concurrent reader never
/// observes a half-written record.
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    /// Creates a store rooted at the staging directory `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The staging directory this store manages.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> Result<Option<ProgressRecord>, ProgressError> {
        let path = self.record_path();
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        let record: ProgressRecord = serde_json::from_str(&data)?;
        record.validate()?;
        debug!(filename = %record.filename, next = record.next_chunk(), "progress loaded");
        Ok(Some(record))
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), ProgressError> {
        record.validate()?;
        std::fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(record)?;
        // Same-directory temp file so the rename stays on one filesystem.
        let tmp = self.dir.join(format!("{PROGRESS_FILE}.tmp"));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, self.record_path())?;

        debug!(
            filename = %record.filename,
            last = ?record.last_uploaded_chunk,
            "progress saved"
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), ProgressError> {
        if !self.dir.exists() {
            return Ok(());
        }
        // The directory is dedicated to this upload, so removing every
        // regular file in it is the bounded footprint.
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                std::fs::remove_file(entry.path())?;
            }
        }
        debug!(dir = %self.dir.display(), "staging cleared");
        Ok(())
    }
}
