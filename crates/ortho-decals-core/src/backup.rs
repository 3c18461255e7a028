// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::conventions::Conventions;
use crate::terrain::TerrainContent;
use crate::{DecalError, Result, WriteStage};
use log::debug;
use serde::Serialize;
use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A terrain-file together with the place its backup goes (or went).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchedFile {
    pub original: PathBuf,
    pub backup: PathBuf,
}

/// Finds the folder the backup layout is relative to.
///
/// Walks up from the directory holding `terrain_file` until a directory is
/// found whose parent also contains `Earth nav data`; that parent is the
/// base. For a regular tile this is the tile folder holding both `terrain/`
/// and `Earth nav data/`.
pub fn scenery_base_folder(terrain_file: &Path, conventions: &Conventions) -> Result<PathBuf> {
    let mut current = terrain_file.parent();
    while let Some(dir) = current {
        let parent = dir.parent();
        if let Some(base) = parent {
            if base.join(&conventions.earth_nav_data_dir).is_dir() {
                return Ok(base.to_path_buf());
            }
        }
        current = parent;
    }
    Err(DecalError::Structure(terrain_file.to_path_buf()))
}

/// `backup_root` joined with the path of `terrain_file` relative to `base`.
pub fn backup_destination(terrain_file: &Path, base: &Path, backup_root: &Path) -> Result<PathBuf> {
    let relative = terrain_file
        .strip_prefix(base)
        .map_err(|_| DecalError::Structure(terrain_file.to_path_buf()))?;
    Ok(backup_root.join(relative))
}

/// Backs up terrain-files below a fixed root and appends the marker line.
pub struct BackupPatcher<'a> {
    conventions: &'a Conventions,
    backup_root: &'a Path,
}

impl<'a> BackupPatcher<'a> {
    pub fn new(conventions: &'a Conventions, backup_root: &'a Path) -> Self {
        Self {
            conventions,
            backup_root,
        }
    }

    /// Resolves the backup destination and checks it is still free.
    /// Touches nothing on disk.
    pub fn plan(&self, terrain_file: &Path) -> Result<PatchedFile> {
        let base = scenery_base_folder(terrain_file, self.conventions)?;
        let backup = backup_destination(terrain_file, &base, self.backup_root)?;

        if fs::symlink_metadata(&backup).is_ok() {
            return Err(DecalError::BackupCollision {
                path: terrain_file.to_path_buf(),
                backup,
            });
        }

        Ok(PatchedFile {
            original: terrain_file.to_path_buf(),
            backup,
        })
    }

    /// Copies the file to its backup destination, then appends the marker.
    pub fn backup_and_patch(&self, terrain_file: &Path) -> Result<PatchedFile> {
        let planned = self.plan(terrain_file)?;
        self.commit(&planned)?;
        Ok(planned)
    }

    /// Carries out a planned backup-and-patch.
    ///
    /// The original is only rewritten once the backup has been synced and
    /// moved into place. An existing backup is never replaced.
    pub fn commit(&self, planned: &PatchedFile) -> Result<()> {
        let terrain_file = planned.original.as_path();
        let write_err = |stage: WriteStage| {
            let path = terrain_file.to_path_buf();
            move |source: io::Error| DecalError::Write {
                path,
                stage,
                source,
            }
        };

        if let Some(parent) = planned.backup.parent() {
            fs::create_dir_all(parent).map_err(write_err(WriteStage::CreateBackupDir))?;
        }

        let content = TerrainContent::read(terrain_file)?;
        let permissions = fs::metadata(terrain_file)
            .map_err(|source| DecalError::Read {
                path: terrain_file.to_path_buf(),
                source,
            })?
            .permissions();

        match write_new_file(&planned.backup, content.as_bytes(), permissions.clone()) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(DecalError::BackupCollision {
                    path: planned.original.clone(),
                    backup: planned.backup.clone(),
                });
            }
            Err(e) => return Err(write_err(WriteStage::CopyBackup)(e)),
        }
        debug!(
            "Backed up {} to {}",
            terrain_file.display(),
            planned.backup.display()
        );

        let patched = content.with_marker(&self.conventions.marker);
        replace_file(terrain_file, &patched, permissions)
            .map_err(write_err(WriteStage::RewriteOriginal))?;
        debug!(
            "Added {} to {}",
            self.conventions.marker,
            terrain_file.display()
        );

        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn staged_file(path: &Path, data: &[u8], permissions: Permissions) -> io::Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(data)?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Flushes the directory entry of a freshly renamed file.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Writes `data` to `path` through a temp file. Fails with `AlreadyExists`
/// instead of replacing an existing file.
fn write_new_file(path: &Path, data: &[u8], permissions: Permissions) -> io::Result<()> {
    let tmp = staged_file(path, data, permissions)?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    sync_dir(parent_dir(path))
}

/// Atomically replaces the contents of `path`.
fn replace_file(path: &Path, data: &[u8], permissions: Permissions) -> io::Result<()> {
    let tmp = staged_file(path, data, permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    sync_dir(parent_dir(path))
}
