//! Indexed information-flow graph derived from a [`GraphFormat`].
//!
//! Nodes:
//! - one *device-input* per sensor state key (`camera.firmware`)
//! - one *device-output* per sensor return (`camera.motion`)
//! - one *module* per distinct global module id (instances of the same
//!   template share a node)
//! - one *domain* per distinct domain named by a network edge
//!
//! Edges follow the composition's data, state and network edges. Network
//! edges are bidirectional: data that reaches a domain may come back to
//! influence the module that sent it.

use super::id::FlowNodeId;
use crate::graph::GraphFormat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a flow-graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowNodeKind {
    /// A sensor state key, consumes data
    DeviceInput,
    /// A sensor return, produces data
    DeviceOutput,
    Module,
    Domain,
}

impl FlowNodeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            FlowNodeKind::DeviceInput => "device input",
            FlowNodeKind::DeviceOutput => "device output",
            FlowNodeKind::Module => "module",
            FlowNodeKind::Domain => "domain",
        }
    }
}

impl std::fmt::Display for FlowNodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A node of the flow graph.
///
/// `entity` is the sensor id, global module id or domain; `port` is the
/// state key or return name of device nodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlowNode {
    pub name: String,
    pub kind: FlowNodeKind,
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl FlowNode {
    pub fn device_input(sensor: &str, key: &str) -> Self {
        Self::device(FlowNodeKind::DeviceInput, sensor, key)
    }

    pub fn device_output(sensor: &str, ret: &str) -> Self {
        Self::device(FlowNodeKind::DeviceOutput, sensor, ret)
    }

    pub fn module(global_id: &str) -> Self {
        Self {
            name: global_id.to_string(),
            kind: FlowNodeKind::Module,
            entity: global_id.to_string(),
            port: None,
        }
    }

    pub fn domain(domain: &str) -> Self {
        Self {
            name: domain.to_string(),
            kind: FlowNodeKind::Domain,
            entity: domain.to_string(),
            port: None,
        }
    }

    fn device(kind: FlowNodeKind, sensor: &str, port: &str) -> Self {
        Self {
            name: format!("{}.{}", sensor, port),
            kind,
            entity: sensor.to_string(),
            port: Some(port.to_string()),
        }
    }
}

impl std::fmt::Display for FlowNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Directed flow graph with deduplicated adjacency.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: Vec<FlowNode>,
    lookup: BTreeMap<FlowNode, FlowNodeId>,
    successors: Vec<BTreeSet<FlowNodeId>>,
}

impl FlowGraph {
    /// Build the flow graph of a composition.
    ///
    /// Edges whose endpoints are not declared in the format are skipped with
    /// a warning; the format is expected to be structurally valid.
    pub fn from_format(format: &GraphFormat) -> Self {
        let mut g = Self::default();

        let sensors: BTreeSet<&str> = format.sensors.iter().map(|s| s.id.as_str()).collect();
        for sensor in &format.sensors {
            for key in &sensor.state_keys {
                g.intern(FlowNode::device_input(&sensor.id, key));
            }
            for ret in &sensor.returns {
                g.intern(FlowNode::device_output(&sensor.id, ret));
            }
        }
        for m in &format.module_ids {
            g.intern(FlowNode::module(&m.global));
        }

        for edge in &format.edges.data {
            let source = match format.global_id(&edge.out_id) {
                Some(global) => FlowNode::module(global),
                None if sensors.contains(edge.out_id.as_str()) => {
                    FlowNode::device_output(&edge.out_id, &edge.out_ret)
                }
                None => {
                    tracing::warn!("Flow graph: data edge {} has no source, skipped", edge);
                    continue;
                }
            };
            let Some(target) = format.global_id(&edge.module_id) else {
                tracing::warn!("Flow graph: data edge {} has no target, skipped", edge);
                continue;
            };
            let from = g.intern(source);
            let to = g.intern(FlowNode::module(target));
            g.connect(from, to);
        }

        for edge in &format.edges.state {
            let Some(global) = format.global_id(&edge.module_id) else {
                tracing::warn!("Flow graph: state edge {} has no module, skipped", edge);
                continue;
            };
            let from = g.intern(FlowNode::module(global));
            let to = g.intern(FlowNode::device_input(&edge.sensor_id, &edge.sensor_key));
            g.connect(from, to);
        }

        for edge in &format.edges.network {
            let Some(global) = format.global_id(&edge.module_id) else {
                tracing::warn!("Flow graph: network edge {} has no module, skipped", edge);
                continue;
            };
            let module = g.intern(FlowNode::module(global));
            let domain = g.intern(FlowNode::domain(&edge.domain));
            g.connect(module, domain);
            g.connect(domain, module);
        }

        tracing::debug!(
            "Built flow graph: {} nodes, {} edges",
            g.len(),
            g.edge_count()
        );
        g
    }

    fn intern(&mut self, node: FlowNode) -> FlowNodeId {
        if let Some(&id) = self.lookup.get(&node) {
            return id;
        }
        let id = FlowNodeId(self.nodes.len() as u32);
        self.lookup.insert(node.clone(), id);
        self.nodes.push(node);
        self.successors.push(BTreeSet::new());
        id
    }

    fn connect(&mut self, from: FlowNodeId, to: FlowNodeId) {
        self.successors[from.index()].insert(to);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(BTreeSet::len).sum()
    }

    pub fn node(&self, id: FlowNodeId) -> &FlowNode {
        &self.nodes[id.index()]
    }

    pub fn find(&self, node: &FlowNode) -> Option<FlowNodeId> {
        self.lookup.get(node).copied()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = FlowNodeId> {
        (0..self.nodes.len() as u32).map(FlowNodeId)
    }

    pub fn successors(&self, id: FlowNodeId) -> impl Iterator<Item = FlowNodeId> + '_ {
        self.successors[id.index()].iter().copied()
    }
}
