// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::conventions::Conventions;
use crate::progress::{Phase, ProgressSink};
use crate::terrain::TerrainContent;
use crate::{DecalError, Result};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds the `.ter` files of Ortho4XP tiles that still lack the marker line.
pub struct TerrainLocator<'a> {
    conventions: &'a Conventions,
    progress: &'a dyn ProgressSink,
}

impl<'a> TerrainLocator<'a> {
    pub fn new(conventions: &'a Conventions, progress: &'a dyn ProgressSink) -> Self {
        Self {
            conventions,
            progress,
        }
    }

    /// Discovery followed by content inspection.
    pub fn locate(&self, roots: &[PathBuf]) -> Result<BTreeSet<PathBuf>> {
        let candidates = self.collect_candidates(roots)?;
        self.filter_needing_modification(&candidates)
    }

    /// Walks every root in parallel and returns the union of candidate paths.
    ///
    /// Links are not followed, so a symlinked file is never a candidate and a
    /// symlinked directory is never descended into.
    pub fn collect_candidates(&self, roots: &[PathBuf]) -> Result<BTreeSet<PathBuf>> {
        self.progress.phase_started(Phase::Discovery, None);

        let per_root: Vec<Vec<PathBuf>> = roots
            .par_iter()
            .map(|root| self.walk_root(root))
            .collect::<Result<_>>()?;

        let candidates: BTreeSet<PathBuf> = per_root.into_iter().flatten().collect();
        self.progress.phase_finished(Phase::Discovery);
        info!(
            "Found {} terrain-file candidates in {} folder(s)",
            candidates.len(),
            roots.len()
        );
        Ok(candidates)
    }

    fn walk_root(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|source| DecalError::Traversal {
                root: root.to_path_buf(),
                source,
            })?;

            if entry.file_type().is_file() && self.is_candidate_file(entry.path()) {
                debug!("Candidate: {}", entry.path().display());
                self.progress.advance(Phase::Discovery, entry.path());
                found.push(entry.into_path());
            }
        }

        Ok(found)
    }

    /// Name and location check for a path on disk, including the regular-file test.
    pub fn is_candidate(&self, path: &Path) -> bool {
        let is_file = std::fs::symlink_metadata(path)
            .map(|m| m.file_type().is_file())
            .unwrap_or(false);
        is_file && self.is_candidate_file(path)
    }

    fn is_candidate_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !self.conventions.matches_file_name(name) {
            return false;
        }

        let Some(parent) = path.parent() else {
            return false;
        };
        let in_terrain_dir = parent
            .file_name()
            .map(|n| n == self.conventions.terrain_dir.as_str())
            .unwrap_or(false);
        if !in_terrain_dir {
            return false;
        }

        parent
            .parent()
            .map(|tile| tile.join(&self.conventions.earth_nav_data_dir).is_dir())
            .unwrap_or(false)
    }

    pub fn needs_modification(&self, path: &Path) -> Result<bool> {
        let content = TerrainContent::read(path)?;
        Ok(content.needs_marker(self.conventions))
    }

    /// Reads all candidates in parallel and keeps the ones needing the marker.
    pub fn filter_needing_modification(
        &self,
        candidates: &BTreeSet<PathBuf>,
    ) -> Result<BTreeSet<PathBuf>> {
        self.progress
            .phase_started(Phase::Inspection, Some(candidates.len() as u64));

        let flagged: Vec<Option<PathBuf>> = candidates
            .par_iter()
            .map(|path| -> Result<Option<PathBuf>> {
                let needs = self.needs_modification(path)?;
                debug!(
                    "{}: {}",
                    path.display(),
                    if needs { "needs patch" } else { "ok" }
                );
                self.progress.advance(Phase::Inspection, path);
                Ok(needs.then(|| path.clone()))
            })
            .collect::<Result<_>>()?;

        self.progress.phase_finished(Phase::Inspection);

        let needing: BTreeSet<PathBuf> = flagged.into_iter().flatten().collect();
        info!(
            "{} of {} terrain-files need {}",
            needing.len(),
            candidates.len(),
            self.conventions.marker
        );
        Ok(needing)
    }
}
