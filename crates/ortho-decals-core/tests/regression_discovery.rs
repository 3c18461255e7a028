// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use ortho_decals_core::locator::TerrainLocator;
use ortho_decals_core::{Conventions, Phase, ProgressSink, SilentProgress};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<(Phase, &'static str)>>,
    advanced: Mutex<Vec<(Phase, PathBuf)>>,
}

impl ProgressSink for RecordingProgress {
    fn phase_started(&self, phase: Phase, _total: Option<u64>) {
        self.events.lock().unwrap().push((phase, "start"));
    }

    fn advance(&self, phase: Phase, path: &Path) {
        self.advanced.lock().unwrap().push((phase, path.to_path_buf()));
    }

    fn phase_finished(&self, phase: Phase) {
        self.events.lock().unwrap().push((phase, "finish"));
    }
}

#[test]
fn test_nested_tiles_are_found() {
    let dir = tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    // Custom Scenery/Ortho/zOrtho4XP_+47+008/terrain/...
    let tile = root
        .join("Custom Scenery")
        .join("Ortho")
        .join("zOrtho4XP_+47+008");
    fs::create_dir_all(tile.join("Earth nav data")).unwrap();
    fs::create_dir_all(tile.join("terrain")).unwrap();
    fs::write(tile.join("terrain/116401_24801_BI17.ter"), "DECAL_LIB x\n").unwrap();
    fs::write(tile.join("terrain/116401_24801_BI17.TER"), "DECAL_LIB x\n").unwrap();
    fs::write(tile.join("terrain/readme.txt"), "DECAL_LIB x\n").unwrap();

    let conventions = Conventions::default();
    let locator = TerrainLocator::new(&conventions, &SilentProgress);
    let found = locator.locate(&[root]).unwrap();

    assert_eq!(found.len(), 2, "Both spellings of the extension match");
    assert!(found.iter().all(|p| p.parent().unwrap().ends_with("terrain")));
}

#[test]
fn test_terrain_dir_name_is_case_sensitive() {
    let dir = tempdir().unwrap();
    let tile = dir.path().join("tile");
    fs::create_dir_all(tile.join("Earth nav data")).unwrap();
    fs::create_dir_all(tile.join("Terrain")).unwrap();
    fs::write(tile.join("Terrain/116401_24801_BI17.ter"), "DECAL_LIB x\n").unwrap();

    let conventions = Conventions::default();
    let locator = TerrainLocator::new(&conventions, &SilentProgress);
    assert!(locator.locate(&[tile]).unwrap().is_empty());
}

#[test]
fn test_content_filter() {
    let dir = tempdir().unwrap();
    let tile = dir.path().join("tile");
    fs::create_dir_all(tile.join("Earth nav data")).unwrap();
    fs::create_dir_all(tile.join("terrain")).unwrap();

    let needs = tile.join("terrain/10000_20000_a.ter");
    let marked = tile.join("terrain/10000_20001_a.ter");
    let plain = tile.join("terrain/10000_20002_a.ter");
    let plain_marked = tile.join("terrain/10000_20003_a.ter");
    fs::write(&needs, "DECAL_LIB x\n").unwrap();
    fs::write(&marked, "DECAL_LIB x\nNO_ALPHA\n").unwrap();
    fs::write(&plain, "BASE_TEX x.dds\n").unwrap();
    fs::write(&plain_marked, "BASE_TEX x.dds\nNO_ALPHA\n").unwrap();

    let conventions = Conventions::default();
    let locator = TerrainLocator::new(&conventions, &SilentProgress);
    let candidates = locator.collect_candidates(&[tile.clone()]).unwrap();
    assert_eq!(candidates.len(), 4);

    let needing = locator.filter_needing_modification(&candidates).unwrap();
    assert_eq!(needing.len(), 1);
    assert!(needing.contains(&needs));
}

#[cfg(unix)]
#[test]
fn test_unreadable_subtree_is_fatal() {
    use ortho_decals_core::DecalError;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir_all(locked.join("inner")).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits, nothing to assert in that case.
    let readable = fs::read_dir(&locked).is_ok();

    let conventions = Conventions::default();
    let locator = TerrainLocator::new(&conventions, &SilentProgress);
    let result = locator.collect_candidates(&[dir.path().to_path_buf()]);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    if !readable {
        assert!(matches!(result, Err(DecalError::Traversal { .. })));
    }
}

#[test]
fn test_progress_is_reported_per_phase() {
    let dir = tempdir().unwrap();
    let tile = dir.path().join("tile");
    fs::create_dir_all(tile.join("Earth nav data")).unwrap();
    fs::create_dir_all(tile.join("terrain")).unwrap();
    fs::write(tile.join("terrain/10000_20000_a.ter"), "DECAL_LIB x\n").unwrap();
    fs::write(tile.join("terrain/10000_20001_a.ter"), "BASE_TEX x\n").unwrap();

    let progress = RecordingProgress::default();
    let conventions = Conventions::default();
    let locator = TerrainLocator::new(&conventions, &progress);
    locator.locate(&[tile]).unwrap();

    let events = progress.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            (Phase::Discovery, "start"),
            (Phase::Discovery, "finish"),
            (Phase::Inspection, "start"),
            (Phase::Inspection, "finish"),
        ]
    );

    let advanced = progress.advanced.lock().unwrap();
    assert_eq!(advanced.iter().filter(|(p, _)| *p == Phase::Discovery).count(), 2);
    assert_eq!(advanced.iter().filter(|(p, _)| *p == Phase::Inspection).count(), 2);
}
