// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::backup::{BackupPatcher, PatchedFile};
use crate::conventions::Conventions;
use crate::locator::TerrainLocator;
use crate::progress::{Phase, ProgressSink};
use crate::{validator, DecalError, Result};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FailurePolicy {
    /// Stop at the first file that cannot be backed up or patched.
    #[default]
    Abort,
    /// Try every file and report the failures at the end.
    KeepGoing,
}

#[derive(Debug, Clone)]
pub struct PatchOptions {
    pub backup_root: PathBuf,
    pub failure_policy: FailurePolicy,
    pub dry_run: bool,
}

impl PatchOptions {
    pub fn new(backup_root: impl Into<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
            failure_policy: FailurePolicy::default(),
            dry_run: false,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct PatchFailure {
    pub path: PathBuf,
    #[serde(serialize_with = "serialize_display")]
    pub error: DecalError,
}

fn serialize_display<S: Serializer>(
    error: &DecalError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Serialize)]
pub struct PatchReport {
    pub roots: Vec<PathBuf>,
    pub backup_root: PathBuf,
    pub candidates: usize,
    pub patched: Vec<PatchedFile>,
    pub failures: Vec<PatchFailure>,
    pub failure_policy: FailurePolicy,
    pub dry_run: bool,
}

impl PatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn nothing_to_do(&self) -> bool {
        self.patched.is_empty() && self.failures.is_empty()
    }
}

/// Validates the roots, locates the terrain-files lacking the marker and
/// backs up and patches each of them.
pub fn run<P: AsRef<Path>>(
    roots: &[P],
    options: &PatchOptions,
    conventions: &Conventions,
    progress: &dyn ProgressSink,
) -> Result<PatchReport> {
    validator::check_paths_exist(roots)?;
    let roots = validator::canonical_roots(roots)?;
    let backup_root = absolute(&options.backup_root)?;

    let locator = TerrainLocator::new(conventions, progress);
    let candidates = locator.collect_candidates(&roots)?;
    let needing = locator.filter_needing_modification(&candidates)?;

    let patcher = BackupPatcher::new(conventions, &backup_root);
    let (patched, failures) = execute(&patcher, &needing, options, progress)?;

    if options.dry_run {
        info!("Dry run: {} terrain-files would be updated", patched.len());
    } else {
        info!(
            "{} terrain-files updated, {} failed",
            patched.len(),
            failures.len()
        );
    }

    Ok(PatchReport {
        roots,
        backup_root,
        candidates: candidates.len(),
        patched,
        failures,
        failure_policy: options.failure_policy,
        dry_run: options.dry_run,
    })
}

fn execute(
    patcher: &BackupPatcher<'_>,
    needing: &BTreeSet<PathBuf>,
    options: &PatchOptions,
    progress: &dyn ProgressSink,
) -> Result<(Vec<PatchedFile>, Vec<PatchFailure>)> {
    progress.phase_started(Phase::Patching, Some(needing.len() as u64));
    let result = plan_and_apply(patcher, needing, options, progress);
    progress.phase_finished(Phase::Patching);
    result
}

/// Plans every file first, so collisions (including two files of this run
/// sharing one backup destination) are known before anything is written.
/// The first file in path order keeps a contested destination.
fn plan_and_apply(
    patcher: &BackupPatcher<'_>,
    needing: &BTreeSet<PathBuf>,
    options: &PatchOptions,
    progress: &dyn ProgressSink,
) -> Result<(Vec<PatchedFile>, Vec<PatchFailure>)> {
    let mut planned: Vec<(PathBuf, Result<PatchedFile>)> = needing
        .par_iter()
        .map(|path| (path.clone(), patcher.plan(path)))
        .collect();
    planned.sort_by(|a, b| a.0.cmp(&b.0));

    let mut claimed = HashSet::new();
    let mut ready = Vec::with_capacity(planned.len());
    let mut failures = Vec::new();
    for (path, outcome) in planned {
        let outcome = match outcome {
            Ok(plan) if !claimed.insert(plan.backup.clone()) => {
                Err(DecalError::BackupCollision {
                    path: plan.original,
                    backup: plan.backup,
                })
            }
            other => other,
        };
        match outcome {
            Ok(plan) => ready.push(plan),
            Err(error) if options.failure_policy == FailurePolicy::Abort => return Err(error),
            Err(error) => {
                warn!("{}", error);
                progress.advance(Phase::Patching, &path);
                failures.push(PatchFailure { path, error });
            }
        }
    }

    if options.dry_run {
        for plan in &ready {
            progress.advance(Phase::Patching, &plan.original);
        }
        return Ok((ready, failures));
    }

    let commit = |plan: &PatchedFile| -> Result<()> {
        let outcome = patcher.commit(plan);
        progress.advance(Phase::Patching, &plan.original);
        outcome
    };

    match options.failure_policy {
        FailurePolicy::Abort => ready
            .par_iter()
            .map(|plan| commit(plan).map(|()| plan.clone()))
            .collect::<Result<Vec<_>>>()
            .map(|patched| (patched, failures)),
        FailurePolicy::KeepGoing => {
            let outcomes: Vec<(PatchedFile, Result<()>)> = ready
                .into_par_iter()
                .map(|plan| {
                    let outcome = commit(&plan);
                    (plan, outcome)
                })
                .collect();

            let mut patched = Vec::new();
            for (plan, outcome) in outcomes {
                match outcome {
                    Ok(()) => patched.push(plan),
                    Err(error) => {
                        warn!("{}", error);
                        failures.push(PatchFailure {
                            path: plan.original,
                            error,
                        });
                    }
                }
            }
            Ok((patched, failures))
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|_| DecalError::InvalidInput(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentProgress;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_root_aborts_before_traversal() {
        let dir = tempdir().unwrap();
        let backup = dir.path().join("backup");
        let missing = dir.path().join("missing");

        let err = run(
            &[missing.clone()],
            &PatchOptions::new(&backup),
            &Conventions::default(),
            &SilentProgress,
        )
        .unwrap_err();

        assert!(matches!(err, DecalError::InvalidInput(p) if p == missing));
        assert!(!backup.exists());
    }

    #[test]
    fn test_nothing_to_do() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("empty");
        fs::create_dir_all(&root).unwrap();

        let report = run(
            &[root],
            &PatchOptions::new(dir.path().join("backup")),
            &Conventions::default(),
            &SilentProgress,
        )
        .unwrap();

        assert!(report.nothing_to_do());
        assert!(report.is_success());
        assert_eq!(report.candidates, 0);
    }

    #[test]
    fn test_report_serializes_failures_as_messages() {
        let report = PatchReport {
            roots: vec![PathBuf::from("/s")],
            backup_root: PathBuf::from("/b"),
            candidates: 1,
            patched: Vec::new(),
            failures: vec![PatchFailure {
                path: PathBuf::from("/s/terrain/a.ter"),
                error: DecalError::Structure(PathBuf::from("/s/terrain/a.ter")),
            }],
            failure_policy: FailurePolicy::KeepGoing,
            dry_run: false,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["failures"][0]["error"],
            "No scenery base-folder found for terrain-file '/s/terrain/a.ter'"
        );
        assert_eq!(json["candidates"], 1);
        assert_eq!(json["failure_policy"], "KeepGoing");
    }

    #[test]
    fn test_report_records_failure_policy() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("empty");
        fs::create_dir_all(&root).unwrap();

        let options = PatchOptions::new(dir.path().join("backup"))
            .with_failure_policy(FailurePolicy::KeepGoing);
        let report = run(&[root], &options, &Conventions::default(), &SilentProgress).unwrap();
        assert_eq!(report.failure_policy, FailurePolicy::KeepGoing);
    }
}
