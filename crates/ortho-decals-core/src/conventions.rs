// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use regex::Regex;

pub const TERRAIN_FILENAME_PATTERN: &str = r"(?i)^[0-9]{5,6}_[0-9]{5,6}_.+\.ter$";
pub const TERRAIN_DIR: &str = "terrain";
pub const EARTH_NAV_DATA_DIR: &str = "Earth nav data";
pub const DECAL_LIB: &str = "DECAL_LIB";
pub const NO_ALPHA: &str = "NO_ALPHA";

/// Naming conventions of an Ortho4XP tile that the pipeline keys on.
///
/// `Default` gives the values Ortho4XP actually writes. Tests swap single
/// values through the `with_*` builders to exercise synthetic layouts.
#[derive(Debug, Clone)]
pub struct Conventions {
    pub file_pattern: Regex,
    pub terrain_dir: String,
    pub earth_nav_data_dir: String,
    pub decal_prefix: String,
    pub marker: String,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            file_pattern: Regex::new(TERRAIN_FILENAME_PATTERN)
                .expect("built-in terrain filename pattern is valid"),
            terrain_dir: TERRAIN_DIR.to_string(),
            earth_nav_data_dir: EARTH_NAV_DATA_DIR.to_string(),
            decal_prefix: DECAL_LIB.to_string(),
            marker: NO_ALPHA.to_string(),
        }
    }
}

impl Conventions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_pattern(mut self, pattern: Regex) -> Self {
        self.file_pattern = pattern;
        self
    }

    pub fn with_terrain_dir(mut self, name: impl Into<String>) -> Self {
        self.terrain_dir = name.into();
        self
    }

    pub fn with_earth_nav_data_dir(mut self, name: impl Into<String>) -> Self {
        self.earth_nav_data_dir = name.into();
        self
    }

    pub fn with_decal_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.decal_prefix = prefix.into();
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Whole-name match against the terrain filename pattern.
    pub fn matches_file_name(&self, name: &str) -> bool {
        self.file_pattern.is_match(name)
    }
}
