// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::conventions::Conventions;
use crate::{DecalError, Result};
use std::borrow::Cow;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
            LineEnding::Cr => b"\r",
        }
    }
}

/// Raw content of a `.ter` file.
///
/// Only line-level matching is done on the text. The bytes themselves are
/// kept untouched so a patched file differs from the original by the
/// appended marker line alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainContent {
    bytes: Vec<u8>,
}

impl TerrainContent {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn read(path: &Path) -> Result<Self> {
        std::fs::read(path)
            .map(Self::from_bytes)
            .map_err(|source| DecalError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// True if some line is exactly the marker.
    pub fn has_marker(&self, marker: &str) -> bool {
        split_lines(&self.text()).any(|line| line == marker)
    }

    pub fn has_decals(&self, prefix: &str) -> bool {
        split_lines(&self.text()).any(|line| line.starts_with(prefix))
    }

    /// Decals present and marker missing.
    pub fn needs_marker(&self, conventions: &Conventions) -> bool {
        !self.has_marker(&conventions.marker) && self.has_decals(&conventions.decal_prefix)
    }

    /// The most frequent line break. Ties go to LF, then CRLF.
    pub fn line_ending(&self) -> LineEnding {
        let (mut lf, mut crlf, mut cr) = (0usize, 0usize, 0usize);
        let mut bytes = self.bytes.iter().peekable();
        while let Some(&b) = bytes.next() {
            match b {
                b'\r' if bytes.peek() == Some(&&b'\n') => {
                    bytes.next();
                    crlf += 1;
                }
                b'\r' => cr += 1,
                b'\n' => lf += 1,
                _ => {}
            }
        }
        if crlf > lf && crlf >= cr {
            LineEnding::CrLf
        } else if cr > lf && cr > crlf {
            LineEnding::Cr
        } else {
            LineEnding::Lf
        }
    }

    /// Content with `marker` appended as a new last line.
    pub fn with_marker(&self, marker: &str) -> Vec<u8> {
        let ending = self.line_ending();
        let mut out = Vec::with_capacity(self.bytes.len() + marker.len() + 4);
        out.extend_from_slice(&self.bytes);
        if !out.is_empty() && !out.ends_with(b"\n") && !out.ends_with(b"\r") {
            out.extend_from_slice(ending.as_bytes());
        }
        out.extend_from_slice(marker.as_bytes());
        out.extend_from_slice(ending.as_bytes());
        out
    }
}

/// Splits on `\r\n`, `\n` and a lone `\r`, without a trailing empty line.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(i) => {
                let line = &rest[..i];
                let skip = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + skip..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}
