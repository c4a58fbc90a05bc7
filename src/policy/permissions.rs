//! Allow/deny decisions over enumerated pipelines.

use super::enumerator::Pipeline;
use crate::error::{HomeflowError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A persisted decision.
///
/// `pipeline` is the human-readable label. `nodes` keeps every hop with its
/// kind, since different pipelines can share a label (a domain named like a
/// module, or module `a.b` next to sensor output `a.b`). Records without
/// `nodes` are matched by label, and only when that label is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub pipeline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Pipeline>,
    pub allowed: bool,
}

impl PermissionRecord {
    pub fn new(pipeline: &Pipeline, allowed: bool) -> Self {
        Self {
            pipeline: pipeline.label(),
            nodes: Some(pipeline.clone()),
            allowed,
        }
    }
}

/// One decision per pipeline. Everything is allowed until denied.
#[derive(Debug, Clone, Default)]
pub struct Permissions {
    pipelines: Vec<Pipeline>,
    allowed: Vec<bool>,
}

impl Permissions {
    pub fn new(pipelines: Vec<Pipeline>) -> Self {
        let allowed = vec![true; pipelines.len()];
        Self { pipelines, allowed }
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    pub fn is_allowed(&self, index: usize) -> Option<bool> {
        self.allowed.get(index).copied()
    }

    pub fn set(&mut self, index: usize, allowed: bool) -> Result<()> {
        let count = self.pipelines.len();
        let slot = self.allowed.get_mut(index).ok_or_else(|| {
            HomeflowError::Policy(format!(
                "no pipeline at index {} ({} pipelines)",
                index, count
            ))
        })?;
        *slot = allowed;
        tracing::debug!(
            "Pipeline {} {}",
            self.pipelines[index],
            if allowed { "allowed" } else { "denied" }
        );
        Ok(())
    }

    pub fn allow(&mut self, index: usize) -> Result<()> {
        self.set(index, true)
    }

    pub fn deny(&mut self, index: usize) -> Result<()> {
        self.set(index, false)
    }

    /// Every pipeline with its index and decision.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Pipeline, bool)> {
        self.pipelines
            .iter()
            .zip(self.allowed.iter().copied())
            .enumerate()
            .map(|(i, (p, a))| (i, p, a))
    }

    pub fn denied(&self) -> impl Iterator<Item = &Pipeline> {
        self.iter().filter(|(_, _, a)| !a).map(|(_, p, _)| p)
    }

    pub fn to_records(&self) -> Vec<PermissionRecord> {
        self.iter()
            .map(|(_, p, allowed)| PermissionRecord::new(p, allowed))
            .collect()
    }

    /// Re-associate saved decisions with the current pipelines.
    ///
    /// Records whose pipeline no longer exists are dropped. Returns how many
    /// records matched.
    pub fn apply_records(&mut self, records: &[PermissionRecord]) -> usize {
        let by_nodes: BTreeMap<&Pipeline, usize> = self
            .pipelines
            .iter()
            .enumerate()
            .map(|(i, p)| (p, i))
            .collect();
        // None marks a label shared by several pipelines
        let mut by_label: BTreeMap<String, Option<usize>> = BTreeMap::new();
        for (i, p) in self.pipelines.iter().enumerate() {
            by_label
                .entry(p.label())
                .and_modify(|slot| *slot = None)
                .or_insert(Some(i));
        }

        let mut updates = Vec::new();
        for record in records {
            let index = match &record.nodes {
                Some(nodes) => by_nodes.get(nodes).copied(),
                None => match by_label.get(&record.pipeline) {
                    Some(Some(i)) => Some(*i),
                    Some(None) => {
                        tracing::warn!(
                            "Ignoring permission for ambiguous pipeline {}",
                            record.pipeline
                        );
                        None
                    }
                    None => None,
                },
            };
            match index {
                Some(i) => updates.push((i, record.allowed)),
                None => tracing::debug!("Dropping stale permission for {}", record.pipeline),
            }
        }

        for (i, allowed) in &updates {
            self.allowed[*i] = *allowed;
        }
        updates.len()
    }
}
