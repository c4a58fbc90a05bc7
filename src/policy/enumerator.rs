use super::flow_graph::{FlowGraph, FlowNode, FlowNodeKind};
use super::id::FlowNodeId;
use crate::graph::GraphFormat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// One complete information-flow path, from a sensor output or domain to a
/// sensor input or domain. Every hop is recorded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pipeline(pub Vec<FlowNode>);

impl Pipeline {
    pub fn nodes(&self) -> &[FlowNode] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Where the flow starts.
    pub fn source(&self) -> Option<&FlowNode> {
        self.0.first()
    }

    /// Where the flow ends.
    pub fn terminal(&self) -> Option<&FlowNode> {
        self.0.last()
    }

    /// The hop right before the terminal, always a module in an enumerated pipeline.
    pub fn penultimate(&self) -> Option<&FlowNode> {
        self.0.len().checked_sub(2).and_then(|i| self.0.get(i))
    }

    /// Whether the flow leaves the home through a network domain.
    pub fn is_network_egress(&self) -> bool {
        self.terminal()
            .is_some_and(|n| n.kind == FlowNodeKind::Domain)
    }

    /// Stable label used to key permission decisions.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

/// Enumerates every pipeline a composition permits.
pub struct PathEnumerator;

impl PathEnumerator {
    /// Enumerate the pipelines of a composition, sorted and deduplicated.
    pub fn enumerate(format: &GraphFormat) -> Vec<Pipeline> {
        let start_time = std::time::Instant::now();
        let graph = FlowGraph::from_format(format);
        let pipelines = Self::enumerate_graph(&graph);
        tracing::info!(
            "Enumerated {} pipelines over {} flow nodes in {}us",
            pipelines.len(),
            graph.len(),
            start_time.elapsed().as_micros()
        );
        pipelines
    }

    /// Breadth-first search from every device output and domain.
    ///
    /// A path is complete when it reaches a device input, or a domain if it
    /// started at a device output. Any other step into a domain is the
    /// reverse of a network edge and ends the branch. A successor already on
    /// the path is never revisited, so module cycles terminate.
    pub fn enumerate_graph(graph: &FlowGraph) -> Vec<Pipeline> {
        let mut queue: VecDeque<Vec<FlowNodeId>> = graph
            .node_ids()
            .filter(|&id| {
                matches!(
                    graph.node(id).kind,
                    FlowNodeKind::DeviceOutput | FlowNodeKind::Domain
                )
            })
            .map(|id| vec![id])
            .collect();

        let mut complete: BTreeSet<Pipeline> = BTreeSet::new();
        while let Some(path) = queue.pop_front() {
            let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
                continue;
            };
            let from_device = graph.node(first).kind == FlowNodeKind::DeviceOutput;

            for next in graph.successors(last) {
                if path.contains(&next) {
                    continue;
                }
                let kind = graph.node(next).kind;
                let mut extended = path.clone();
                extended.push(next);

                if kind == FlowNodeKind::DeviceInput || (from_device && kind == FlowNodeKind::Domain)
                {
                    complete.insert(Self::materialize(graph, &extended));
                } else if kind != FlowNodeKind::Domain {
                    queue.push_back(extended);
                }
            }
        }
        complete.into_iter().collect()
    }

    fn materialize(graph: &FlowGraph, path: &[FlowNodeId]) -> Pipeline {
        Pipeline(path.iter().map(|&id| graph.node(id).clone()).collect())
    }
}
