//! Archive creation and relocation.
//!
//! At the end of a run the destination directory is bundled into a single
//! timestamped tar.gz in the current working directory and then moved to
//! the archive directory. Both steps fail independently and non-fatally:
//! the run completes either way, just without the expected artifact.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{error, info};

use crate::error::ArchiveError;

/// Produces the backup artifact and moves it to its storage location.
pub struct Archiver {
    archive_dir: PathBuf,
}

impl Archiver {
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
        }
    }

    /// Archive file name for the current instant.
    pub fn file_name() -> String {
        let stamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        format!("githubbackup_{stamp}.tar.gz")
    }

    /// Compress and relocate, logging each failure independently.
    ///
    /// Returns the final artifact path when both steps succeeded.
    pub fn run(&self, source: &Path) -> Option<PathBuf> {
        let tarball = match self.compress(source) {
            Ok(tarball) => tarball,
            Err(e) => {
                error!("Unable to compress backup into archive: {e}");
                return None;
            }
        };

        match self.relocate(&tarball) {
            Ok(stored) => {
                info!("Backup archive stored at {}", stored.display());
                Some(stored)
            }
            Err(e) => {
                error!("Unable to move backup archive: {e}");
                None
            }
        }
    }

    /// Bundle `source` into a timestamped tar.gz in the current working
    /// directory, with entries rooted at the directory's basename.
    pub fn compress(&self, source: &Path) -> Result<PathBuf, ArchiveError> {
        let tarball = PathBuf::from(Self::file_name());
        self.compress_to(source, &tarball)?;
        Ok(tarball)
    }

    fn compress_to(&self, source: &Path, tarball: &Path) -> Result<(), ArchiveError> {
        let wrap = |source_err: io::Error| ArchiveError::Compress {
            source_dir: source.to_path_buf(),
            source: source_err,
        };

        let arcname = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "backup".to_string());

        let file = fs::File::create(tarball).map_err(wrap)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        builder.append_dir_all(&arcname, source).map_err(wrap)?;
        let encoder = builder.into_inner().map_err(wrap)?;
        encoder.finish().map_err(wrap)?;

        Ok(())
    }

    /// Move a finished tarball into the archive directory, falling back to
    /// copy-and-remove when a plain rename crosses filesystems.
    pub fn relocate(&self, tarball: &Path) -> Result<PathBuf, ArchiveError> {
        let wrap = |source: io::Error| ArchiveError::Relocate {
            dest: self.archive_dir.clone(),
            source,
        };

        fs::create_dir_all(&self.archive_dir).map_err(wrap)?;

        let file_name = tarball
            .file_name()
            .ok_or_else(|| wrap(io::Error::new(io::ErrorKind::InvalidInput, "not a file path")))?;
        let dest = self.archive_dir.join(file_name);

        if fs::rename(tarball, &dest).is_err() {
            fs::copy(tarball, &dest).map_err(wrap)?;
            fs::remove_file(tarball).map_err(wrap)?;
        }

        Ok(dest)
    }
}
