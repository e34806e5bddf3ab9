//! Output directory resolution.

use crate::Result;
use crate::error::DbExportError;
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

/// `strftime` pattern of the per-run subdirectory; sorts chronologically.
pub const DATE_SUBDIR_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Name of the per-run subdirectory for a run started at `started_at`.
pub fn date_subdir_name<Tz>(started_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    started_at.format(DATE_SUBDIR_FORMAT).to_string()
}

/// The directory every document of one run is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    path: PathBuf,
}

impl OutputLocation {
    /// Resolves and creates the output directory.
    ///
    /// With `use_date_subdir`, a subdirectory named after `started_at` is
    /// appended to `base`. Missing intermediate directories are created and an
    /// existing directory is reused, so a rerun within the same second writes
    /// into the same place.
    ///
    /// # Errors
    /// Returns a path error if the directory cannot be created, exists as
    /// something other than a directory, or is read-only.
    pub async fn resolve<Tz>(base: &Path, use_date_subdir: bool, started_at: &DateTime<Tz>) -> Result<Self>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let path = if use_date_subdir {
            base.join(date_subdir_name(started_at))
        } else {
            base.to_path_buf()
        };

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| DbExportError::path(&path, "cannot create directory", Some(e)))?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| DbExportError::path(&path, "cannot inspect directory", Some(e)))?;
        if !metadata.is_dir() {
            return Err(DbExportError::path(&path, "not a directory", None));
        }
        if metadata.permissions().readonly() {
            return Err(DbExportError::path(&path, "directory is read-only", None));
        }

        let path = tokio::fs::canonicalize(&path)
            .await
            .map_err(|e| DbExportError::path(&path, "cannot resolve absolute path", Some(e)))?;

        tracing::debug!("Output directory: {}", path.display());
        Ok(Self { path })
    }

    /// Absolute path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the document for `file_name` inside this directory.
    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }
}
