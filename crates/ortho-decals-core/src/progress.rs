// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Discovery,
    Inspection,
    Patching,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Discovery => "Searching for terrain-files",
            Phase::Inspection => "Analyzing terrain-files",
            Phase::Patching => "Updating terrain-files",
        };
        f.write_str(s)
    }
}

/// Receives progress while the pipeline runs.
///
/// Calls arrive from rayon worker threads, hence `Sync`. `total` is `None`
/// during discovery where the number of entries is unknown up front.
pub trait ProgressSink: Send + Sync {
    fn phase_started(&self, phase: Phase, total: Option<u64>);
    fn advance(&self, phase: Phase, path: &Path);
    fn phase_finished(&self, phase: Phase);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn phase_started(&self, _phase: Phase, _total: Option<u64>) {}
    fn advance(&self, _phase: Phase, _path: &Path) {}
    fn phase_finished(&self, _phase: Phase) {}
}
