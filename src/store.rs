//! Persistence of compositions.
//!
//! The engine treats storage as an opaque collaborator: a [`GraphStore`]
//! loads and saves a [`GraphFormat`]. Saves are diff-based: a store skips
//! the write when nothing changed since the last load or save.

use crate::error::{HomeflowError, Result};
use crate::graph::{FormatDiff, GraphFormat};
use std::path::{Path, PathBuf};

/// Loads and saves the canonical form of a graph.
pub trait GraphStore {
    fn load(&mut self) -> Result<GraphFormat>;

    /// Persist `format`, returning what changed since the previous save.
    fn save(&mut self, format: &GraphFormat) -> Result<FormatDiff>;
}

/// Diff of `format` against the last known state, or everything when there is none.
fn changes(last: Option<&GraphFormat>, format: &GraphFormat) -> FormatDiff {
    match last {
        Some(last) => last.diff(format),
        None => GraphFormat::default().diff(format),
    }
}

// ==================== JSON File Store ====================

/// Pretty-printed JSON file on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    last: Option<GraphFormat>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GraphStore for JsonFileStore {
    fn load(&mut self) -> Result<GraphFormat> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            HomeflowError::Io(e).with_context(format!("Failed to read {:?}", self.path))
        })?;
        let format = GraphFormat::from_json(&content).map_err(|e| {
            HomeflowError::from(e).with_context(format!("Failed to parse {:?}", self.path))
        })?;
        tracing::info!(
            "Loaded {:?}: {} sensors, {} modules",
            self.path,
            format.sensors.len(),
            format.module_ids.len()
        );
        self.last = Some(format.clone());
        Ok(format)
    }

    fn save(&mut self, format: &GraphFormat) -> Result<FormatDiff> {
        let diff = changes(self.last.as_ref(), format);
        // Without a known previous state the file on disk may hold anything
        if diff.is_empty() && self.last.is_some() {
            tracing::debug!("{:?} unchanged, skipping write", self.path);
            return Ok(diff);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut canonical = format.clone();
        canonical.normalize();
        std::fs::write(&self.path, canonical.to_json()?)?;
        tracing::info!("Saved {:?}", self.path);

        self.last = Some(canonical);
        Ok(diff)
    }
}

// ==================== Memory Store ====================

/// In-process store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Option<GraphFormat>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `format`.
    pub fn with_format(format: GraphFormat) -> Self {
        Self {
            saved: Some(format),
            writes: 0,
        }
    }

    /// Number of saves that changed the stored format.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl GraphStore for MemoryStore {
    fn load(&mut self) -> Result<GraphFormat> {
        self.saved
            .clone()
            .ok_or_else(|| HomeflowError::Store("Nothing saved yet".to_string()))
    }

    fn save(&mut self, format: &GraphFormat) -> Result<FormatDiff> {
        let diff = changes(self.saved.as_ref(), format);
        if !diff.is_empty() || self.saved.is_none() {
            self.saved = Some(format.clone());
            self.writes += 1;
        }
        Ok(diff)
    }
}
