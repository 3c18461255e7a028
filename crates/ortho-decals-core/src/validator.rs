// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::{DecalError, Result};
use std::path::{Path, PathBuf};

/// Checks that every root exists. Stops at the first missing one.
pub fn check_paths_exist<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DecalError::InvalidInput(path.to_path_buf()));
        }
    }
    Ok(())
}

/// Resolves validated roots to canonical absolute paths, dropping duplicates
/// while keeping the order they were given in.
pub fn canonical_roots<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    let mut roots: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .map_err(|_| DecalError::InvalidInput(path.to_path_buf()))?;
        if !roots.contains(&canonical) {
            roots.push(canonical);
        }
    }
    Ok(roots)
}
