//! Change notifications sent from the graph engine to the presentation layer.
//!
//! The engine never calls into a UI. When an event sink is attached it sends
//! one [`GraphEvent`] per successful mutation, carrying enough of the payload
//! for a view to update incrementally.

use crate::graph::edge::{DataEdge, NetworkEdge, StateEdge};
use crate::types::{ModuleId, SensorId};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// A successful mutation of the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    SensorAdded(SensorId),
    SensorRemoved(SensorId),
    ModuleAdded { local_id: ModuleId, global_id: String },
    ModuleRemoved(ModuleId),
    DataEdgeAdded(DataEdge),
    DataEdgeRemoved(DataEdge),
    StateEdgeAdded(StateEdge),
    StateEdgeRemoved(StateEdge),
    NetworkEdgeAdded(NetworkEdge),
    /// All network edges of a module were cleared.
    NetworkEdgesRemoved(ModuleId),
    IntervalChanged {
        module_id: ModuleId,
        duration: Option<f64>,
    },
    /// The whole graph was cleared.
    Reset,
}

/// Create the channel pair used to observe a graph.
///
/// Mutations run to completion before a view can drain the receiver, so the
/// channel is unbounded: a bulk operation such as [`Graph::reset`] must not
/// lose the tail of its events.
///
/// [`Graph::reset`]: crate::graph::Graph::reset
pub fn event_channel() -> (Sender<GraphEvent>, Receiver<GraphEvent>) {
    unbounded()
}
