// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod backup;
pub mod conventions;
pub mod locator;
pub mod pipeline;
pub mod progress;
pub mod terrain;
pub mod validator;

pub use backup::PatchedFile;
pub use conventions::Conventions;
pub use pipeline::{run, FailurePolicy, PatchFailure, PatchOptions, PatchReport};
pub use progress::{Phase, ProgressSink, SilentProgress};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Step of the backup-and-patch sequence that failed to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    CreateBackupDir,
    CopyBackup,
    RewriteOriginal,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WriteStage::CreateBackupDir => "create backup directory for",
            WriteStage::CopyBackup => "create backup copy of",
            WriteStage::RewriteOriginal => "rewrite",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum DecalError {
    #[error("Given path '{}' does not exist", .0.display())]
    InvalidInput(PathBuf),
    #[error("Failed to traverse subdirectories of '{}': {source}", .root.display())]
    Traversal {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to read terrain-file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No scenery base-folder found for terrain-file '{}'", .0.display())]
    Structure(PathBuf),
    #[error(
        "Can't backup terrain-file '{}' at '{}': backup target-file already exists",
        .path.display(),
        .backup.display()
    )]
    BackupCollision { path: PathBuf, backup: PathBuf },
    #[error("Failed to {stage} terrain-file '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        stage: WriteStage,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DecalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_path() {
        let err = DecalError::InvalidInput(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "Given path '/nope' does not exist");

        let err = DecalError::Write {
            path: PathBuf::from("/t/terrain/a.ter"),
            stage: WriteStage::CopyBackup,
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create backup copy of terrain-file '/t/terrain/a.ter': disk full"
        );
    }
}
