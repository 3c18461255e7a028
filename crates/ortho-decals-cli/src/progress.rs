// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use ortho_decals_core::{Phase, ProgressSink};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Draws one indicatif bar per pipeline phase on stdout.
pub struct TerminalProgress {
    enabled: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner} {msg} ({pos} candidates)")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({elapsed})")
            .map(|s| s.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl ProgressSink for TerminalProgress {
    fn phase_started(&self, phase: Phase, total: Option<u64>) {
        if !self.enabled {
            return;
        }
        let pb = match total {
            Some(len) => ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stdout())
                .with_style(Self::bar_style()),
            None => ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout())
                .with_style(Self::spinner_style()),
        };
        pb.set_message(phase.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn advance(&self, _phase: Phase, _path: &Path) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(pb) = slot.as_ref() {
                pb.inc(1);
            }
        }
    }

    fn phase_finished(&self, _phase: Phase) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish();
            }
        }
    }
}
