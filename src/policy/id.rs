//! Identity types for the flow graph.
//!
//! Ids are newtypes over `u32` that index directly into the flow graph's
//! node and adjacency vectors.

use std::fmt;

/// Index into `FlowGraph::nodes`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FlowNodeId(pub u32);

impl FlowNodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FlowNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowNodeId({})", self.0)
    }
}

impl fmt::Display for FlowNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
