//! Overlay graphs: the composition with denied pipelines cut.
//!
//! Only the terminal hop of a denied pipeline is cut. A pipeline that ends at
//! a domain revokes all network access of the modules that reach it; one that
//! ends at a sensor state key removes the matching state edges. Data edges
//! are never touched.

use super::enumerator::Pipeline;
use super::flow_graph::FlowNodeKind;
use super::permissions::Permissions;
use crate::catalog::ModuleRepository;
use crate::error::{Result, ResultExt};
use crate::graph::{Graph, GraphFormat, StateEdge};
use crate::types::ModuleId;
use std::collections::BTreeSet;

/// What an overlay removed from the base graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayReport {
    /// Modules whose network edges were all removed
    pub revoked_network: Vec<ModuleId>,
    pub removed_state_edges: Vec<StateEdge>,
}

impl OverlayReport {
    pub fn is_empty(&self) -> bool {
        self.revoked_network.is_empty() && self.removed_state_edges.is_empty()
    }
}

/// The overlay graph and what was cut to produce it.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub graph: Graph,
    pub report: OverlayReport,
}

/// Builds overlay graphs, resolving modules through a repository.
pub struct OverlayBuilder<'a> {
    repo: &'a dyn ModuleRepository,
}

impl<'a> OverlayBuilder<'a> {
    pub fn new(repo: &'a dyn ModuleRepository) -> Self {
        Self { repo }
    }

    /// Clone `graph` and cut every pipeline `permissions` denies.
    pub fn build(&self, graph: &Graph, permissions: &Permissions) -> Result<Overlay> {
        let format = graph.to_format();
        let mut overlay =
            Graph::from_format(&format, self.repo).context("Failed to clone graph for overlay")?;

        let mut revoke: BTreeSet<ModuleId> = BTreeSet::new();
        let mut cut: Vec<StateEdge> = Vec::new();
        for pipeline in permissions.denied() {
            Self::implicated(&format, pipeline, &mut revoke, &mut cut);
        }

        for module_id in &revoke {
            overlay
                .remove_network_edges(module_id)
                .with_context(|| format!("Failed to revoke network access of {}", module_id))?;
        }
        for edge in &cut {
            overlay
                .remove_state_edge(edge)
                .with_context(|| format!("Failed to remove state edge {}", edge))?;
        }

        let report = OverlayReport {
            revoked_network: revoke.into_iter().collect(),
            removed_state_edges: cut,
        };
        tracing::info!(
            "Built overlay: {} modules lost network access, {} state edges removed",
            report.revoked_network.len(),
            report.removed_state_edges.len()
        );
        Ok(Overlay {
            graph: overlay,
            report,
        })
    }

    /// Collect the edges of `format` implicated by the terminal hop of `pipeline`.
    fn implicated(
        format: &GraphFormat,
        pipeline: &Pipeline,
        revoke: &mut BTreeSet<ModuleId>,
        cut: &mut Vec<StateEdge>,
    ) {
        let (Some(module), Some(terminal)) = (pipeline.penultimate(), pipeline.terminal()) else {
            return;
        };
        if module.kind != FlowNodeKind::Module {
            tracing::warn!("Pipeline {} does not end in a module hop, ignored", pipeline);
            return;
        }
        let global = module.entity.as_str();
        let is_instance = |local: &str| format.global_id(local) == Some(global);

        match terminal.kind {
            FlowNodeKind::Domain => {
                for edge in &format.edges.network {
                    if edge.domain == terminal.entity && is_instance(&edge.module_id) {
                        revoke.insert(edge.module_id.clone());
                    }
                }
            }
            FlowNodeKind::DeviceInput => {
                let key = terminal.port.as_deref();
                for edge in &format.edges.state {
                    if edge.sensor_id == terminal.entity
                        && Some(edge.sensor_key.as_str()) == key
                        && is_instance(&edge.module_id)
                        && !cut.contains(edge)
                    {
                        cut.push(edge.clone());
                    }
                }
            }
            _ => tracing::warn!("Pipeline {} has no terminal endpoint, ignored", pipeline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::graph::{presets, NetworkEdge};
    use crate::policy::PathEnumerator;

    fn deny_where(perms: &mut Permissions, label: &str) {
        let index = perms
            .iter()
            .find(|(_, p, _)| p.label() == label)
            .map(|(i, _, _)| i)
            .unwrap();
        perms.deny(index).unwrap();
    }

    #[test]
    fn test_allow_all_is_identity() {
        let catalog = Catalog::builtin();
        let g = presets::voice_assistant(&catalog).unwrap();
        let perms = Permissions::new(PathEnumerator::enumerate(&g.to_format()));

        let overlay = OverlayBuilder::new(&catalog).build(&g, &perms).unwrap();
        assert!(overlay.report.is_empty());
        assert_eq!(overlay.graph.to_format(), g.to_format());
    }

    #[test]
    fn test_deny_egress_revokes_network_only() {
        let catalog = Catalog::builtin();
        let g = presets::security_camera(&catalog).unwrap();
        let mut perms = Permissions::new(PathEnumerator::enumerate(&g.to_format()));
        deny_where(
            &mut perms,
            "camera.motion -> person_detection -> differential_privacy -> metrics.com",
        );

        let overlay = OverlayBuilder::new(&catalog).build(&g, &perms).unwrap();
        assert_eq!(overlay.report.revoked_network, vec!["differential_privacy"]);
        assert!(overlay.graph.network_edges("differential_privacy").is_empty());
        assert_eq!(
            overlay.graph.network_edges("firmware_update"),
            &[NetworkEdge::new("firmware_update", "firmware.com")]
        );
        assert_eq!(overlay.graph.to_format().edges.data, g.to_format().edges.data);
    }

    #[test]
    fn test_deny_actuation_removes_matching_state_edge() {
        let catalog = Catalog::builtin();
        let g = presets::voice_assistant(&catalog).unwrap();
        let mut perms = Permissions::new(PathEnumerator::enumerate(&g.to_format()));
        deny_where(
            &mut perms,
            "mic.sound -> command_classifier -> light_switch -> kitchen_bulb.on",
        );

        let overlay = OverlayBuilder::new(&catalog).build(&g, &perms).unwrap();
        assert_eq!(
            overlay.report.removed_state_edges,
            vec![StateEdge::new("light_switch", "state", "kitchen_bulb", "on")]
        );
        assert_eq!(overlay.graph.state_edges_into("bathroom_bulb").len(), 1);
        assert!(overlay.graph.state_edges_into("kitchen_bulb").is_empty());
        // Base graph is untouched
        assert_eq!(g.state_edges_into("kitchen_bulb").len(), 1);
    }
}
