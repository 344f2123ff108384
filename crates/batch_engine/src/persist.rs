//! Saving downloaded artifacts next to each other without clobbering.

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::local_artifact_name;

/// Suffixes tried after the plain name, e.g. `photo (1).webp`.
const MAX_RENAMES: usize = 99;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("{0} is read-only")]
    ReadOnly(PathBuf),
    #[error("no free name for {0} in the download directory")]
    NameTaken(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Where an artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub path: PathBuf,
    /// Set when the preferred name was taken and a numbered one was used.
    pub renamed_from: Option<String>,
}

/// A download directory. Existing files are never overwritten.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create `dir` if needed and check that it can hold downloads.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| match err.kind() {
            ErrorKind::AlreadyExists => PersistError::NotADirectory(dir.clone()),
            _ => PersistError::Io(err),
        })?;
        let meta = fs::metadata(&dir)?;
        if !meta.is_dir() {
            return Err(PersistError::NotADirectory(dir));
        }
        if meta.permissions().readonly() {
            return Err(PersistError::ReadOnly(dir));
        }
        Ok(Self { dir })
    }

    /// Save the artifact produced for `input_name` under a name derived from
    /// the input stem and the artifact's extension.
    pub fn save(
        &self,
        input_name: &str,
        artifact_filename: &str,
        content: &[u8],
    ) -> Result<SavedArtifact, PersistError> {
        let preferred = local_artifact_name(input_name, artifact_filename);

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(content)?;
        staged.as_file().sync_all()?;

        for attempt in 0..=MAX_RENAMES {
            let name = numbered(&preferred, attempt);
            let target = self.dir.join(&name);
            match staged.persist_noclobber(&target) {
                Ok(_) => {
                    return Ok(SavedArtifact {
                        path: target,
                        renamed_from: (attempt > 0).then(|| preferred.clone()),
                    })
                }
                Err(err) if err.error.kind() == ErrorKind::AlreadyExists => staged = err.file,
                Err(err) => return Err(PersistError::Io(err.error)),
            }
        }
        Err(PersistError::NameTaken(preferred))
    }
}

fn numbered(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem} ({attempt}).{ext}"),
        None => format!("{name} ({attempt})"),
    }
}
