//! The composition graph engine.
//!
//! Owns the live composition of sensors and module instances together with
//! the three edge kinds and the per-module schedule intervals, and enforces
//! the structural invariants on every mutation:
//!
//! 1. Entity ids are unique across sensors and modules and never equal
//!    [`NETWORK_NODE_ID`].
//! 2. A data edge ends at an existing module on a declared param and starts at
//!    an existing entity on a declared return.
//! 3. A state edge starts at an existing module on a declared return and ends
//!    at an existing sensor on a declared state key.
//! 4. A network edge names an existing module.
//! 5. No edge is added twice.
//! 6. Removing an entity first removes every edge touching it.
//!
//! Every mutation either succeeds completely or returns a [`GraphError`] and
//! leaves the graph as it was.
//!
//! # Example
//!
//! ```
//! use homeflow::graph::{DataEdge, Graph, NetworkEdge};
//! use homeflow::types::{ModuleTemplate, Sensor};
//!
//! let mut g = Graph::new();
//! g.add_sensor(Sensor::new("camera").with_return("motion", "")).unwrap();
//! let stats = g.add_module(
//!     &ModuleTemplate::new("statistics").with_param("count", "").with_domain("statistics.com", ""),
//! );
//! g.add_data_edge(DataEdge::new("camera", "motion", &stats, "count")).unwrap();
//! g.add_network_edge(NetworkEdge::new(&stats, "statistics.com")).unwrap();
//!
//! g.remove_module(&stats).unwrap();
//! assert_eq!(g.incident_edge_count("camera"), 0);
//! ```

pub mod edge;
pub mod error;
pub mod event;
pub mod format;
pub mod presets;

pub use edge::{DataEdge, Interval, NetworkEdge, StateEdge};
pub use error::{GraphError, GraphResult, Missing, NameRole};
pub use event::{event_channel, GraphEvent};
pub use format::{EdgeSet, FormatDiff, GraphFormat, LoadPolicy, ModuleFormat};

use crate::types::{
    DataSource, Entity, EntityKind, ModuleId, ModuleInstance, ModuleTemplate, Sensor, SensorId,
    NETWORK_NODE_ID,
};
use crossbeam_channel::Sender;
use std::collections::BTreeMap;

/// A sensor with the edges attached to it.
#[derive(Debug, Clone)]
struct SensorNode {
    sensor: Sensor,
    /// Outgoing data edges
    data_edges: Vec<DataEdge>,
    /// State edges that actuate this sensor
    incoming_state: Vec<StateEdge>,
}

/// A module instance with the edges attached to it.
#[derive(Debug, Clone)]
struct ModuleNode {
    module: ModuleInstance,
    data_edges: Vec<DataEdge>,
    incoming_data: Vec<DataEdge>,
    state_edges: Vec<StateEdge>,
    network_edges: Vec<NetworkEdge>,
    interval: Option<f64>,
}

impl ModuleNode {
    fn new(module: ModuleInstance) -> Self {
        Self {
            module,
            data_edges: Vec::new(),
            incoming_data: Vec::new(),
            state_edges: Vec::new(),
            network_edges: Vec::new(),
            interval: None,
        }
    }
}

/// The live composition graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    sensors: BTreeMap<SensorId, SensorNode>,
    modules: BTreeMap<ModuleId, ModuleNode>,
    events: Option<Sender<GraphEvent>>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink that receives one event per successful mutation
    pub fn with_event_sink(mut self, sink: Sender<GraphEvent>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn set_event_sink(&mut self, sink: Option<Sender<GraphEvent>>) {
        self.events = sink;
    }

    fn emit(&self, event: GraphEvent) {
        if let Some(tx) = &self.events {
            // Never blocks. Sinks from `event_channel` are unbounded, so this
            // only fails once the receiver is gone.
            let _ = tx.try_send(event);
        }
    }

    // ── Queries ──

    /// Whether `id` is taken by a sensor, a module, or the network node.
    pub fn contains(&self, id: &str) -> bool {
        self.sensors.contains_key(id) || self.modules.contains_key(id) || id == NETWORK_NODE_ID
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty() && self.modules.is_empty()
    }

    pub fn sensor(&self, id: &str) -> Option<&Sensor> {
        self.sensors.get(id).map(|n| &n.sensor)
    }

    pub fn module(&self, id: &str) -> Option<&ModuleInstance> {
        self.modules.get(id).map(|n| &n.module)
    }

    /// Sensors in id order.
    pub fn sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.values().map(|n| &n.sensor)
    }

    /// Module instances in local-id order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleInstance> {
        self.modules.values().map(|n| &n.module)
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Look up any entity that can be a data-edge source.
    pub fn entity(&self, id: &str) -> Option<Entity<'_>> {
        if let Some(node) = self.modules.get(id) {
            Some(Entity::Module(&node.module))
        } else {
            self.sensors.get(id).map(|node| Entity::Sensor(&node.sensor))
        }
    }

    pub fn interval(&self, module_id: &str) -> Option<f64> {
        self.modules.get(module_id).and_then(|n| n.interval)
    }

    /// Outgoing data edges of a sensor or module.
    pub fn data_edges_from(&self, id: &str) -> &[DataEdge] {
        if let Some(node) = self.modules.get(id) {
            &node.data_edges
        } else if let Some(node) = self.sensors.get(id) {
            &node.data_edges
        } else {
            &[]
        }
    }

    /// Incoming data edges of a module.
    pub fn data_edges_into(&self, module_id: &str) -> &[DataEdge] {
        self.modules
            .get(module_id)
            .map(|n| n.incoming_data.as_slice())
            .unwrap_or(&[])
    }

    pub fn state_edges_from(&self, module_id: &str) -> &[StateEdge] {
        self.modules
            .get(module_id)
            .map(|n| n.state_edges.as_slice())
            .unwrap_or(&[])
    }

    pub fn state_edges_into(&self, sensor_id: &str) -> &[StateEdge] {
        self.sensors
            .get(sensor_id)
            .map(|n| n.incoming_state.as_slice())
            .unwrap_or(&[])
    }

    pub fn network_edges(&self, module_id: &str) -> &[NetworkEdge] {
        self.modules
            .get(module_id)
            .map(|n| n.network_edges.as_slice())
            .unwrap_or(&[])
    }

    /// Number of edges anywhere in the graph that name `id` at either end.
    pub fn incident_edge_count(&self, id: &str) -> usize {
        let data = self
            .sensors
            .values()
            .flat_map(|n| n.data_edges.iter())
            .chain(self.modules.values().flat_map(|n| n.data_edges.iter()))
            .filter(|e| e.out_id == id || e.module_id == id)
            .count();
        let state = self
            .modules
            .values()
            .flat_map(|n| n.state_edges.iter())
            .filter(|e| e.module_id == id || e.sensor_id == id)
            .count();
        let network = self
            .modules
            .values()
            .flat_map(|n| n.network_edges.iter())
            .filter(|e| e.module_id == id)
            .count();
        data + state + network
    }

    // ── Entities ──

    /// Register a sensor under its own id.
    pub fn add_sensor(&mut self, sensor: Sensor) -> GraphResult<()> {
        if self.contains(&sensor.id) {
            let err = GraphError::Duplicate(format!("entity {}", sensor.id));
            tracing::warn!("add_sensor rejected: {}", err);
            return Err(err);
        }
        let id = sensor.id.clone();
        self.sensors.insert(
            id.clone(),
            SensorNode {
                sensor,
                data_edges: Vec::new(),
                incoming_state: Vec::new(),
            },
        );
        tracing::debug!("Added sensor {}", id);
        self.emit(GraphEvent::SensorAdded(id));
        Ok(())
    }

    /// Place an instance of `template`, returning its freshly allocated local id.
    ///
    /// The local id is the template's global id, or `{id}_{n}` with the smallest
    /// `n` that is not taken.
    pub fn add_module(&mut self, template: &ModuleTemplate) -> ModuleId {
        let local_id = self.next_local_id(&template.id);
        self.insert_module(ModuleInstance::from_template(local_id.clone(), template));
        local_id
    }

    /// Place an instance of `template` under a caller-chosen local id.
    pub fn add_module_with_id(
        &mut self,
        local_id: impl Into<String>,
        template: &ModuleTemplate,
    ) -> GraphResult<()> {
        let local_id = local_id.into();
        if self.contains(&local_id) {
            let err = GraphError::Duplicate(format!("entity {}", local_id));
            tracing::warn!("add_module rejected: {}", err);
            return Err(err);
        }
        self.insert_module(ModuleInstance::from_template(local_id, template));
        Ok(())
    }

    fn insert_module(&mut self, module: ModuleInstance) {
        let local_id = module.local_id.clone();
        let global_id = module.global_id.clone();
        self.modules.insert(local_id.clone(), ModuleNode::new(module));
        tracing::debug!("Added module {} ({})", local_id, global_id);
        self.emit(GraphEvent::ModuleAdded {
            local_id,
            global_id,
        });
    }

    fn next_local_id(&self, base: &str) -> ModuleId {
        if !self.contains(base) {
            return base.to_string();
        }
        (1u64..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Remove a sensor and every edge touching it.
    pub fn remove_sensor(&mut self, id: &str) -> GraphResult<()> {
        let node = self.sensors.get(id).ok_or_else(|| {
            let err = GraphError::not_found(Missing::Sensor, id);
            tracing::warn!("remove_sensor rejected: {}", err);
            err
        })?;

        // Snapshot the lists: detaching mutates them.
        let outgoing = node.data_edges.clone();
        let incoming = node.incoming_state.clone();
        for edge in &outgoing {
            self.detach_data_edge(edge);
        }
        for edge in &incoming {
            self.detach_state_edge(edge);
        }

        self.sensors.remove(id);
        tracing::debug!("Removed sensor {}", id);
        self.emit(GraphEvent::SensorRemoved(id.to_string()));
        Ok(())
    }

    /// Remove a module instance and every edge touching it.
    pub fn remove_module(&mut self, id: &str) -> GraphResult<()> {
        let node = self.modules.get(id).ok_or_else(|| {
            let err = GraphError::not_found(Missing::Module, id);
            tracing::warn!("remove_module rejected: {}", err);
            err
        })?;

        let outgoing = node.data_edges.clone();
        let incoming = node.incoming_data.clone();
        let state = node.state_edges.clone();
        let has_network = !node.network_edges.is_empty();

        for edge in outgoing.iter().chain(incoming.iter()) {
            self.detach_data_edge(edge);
        }
        for edge in &state {
            self.detach_state_edge(edge);
        }
        if has_network {
            self.clear_network_edges(id);
        }

        self.modules.remove(id);
        tracing::debug!("Removed module {}", id);
        self.emit(GraphEvent::ModuleRemoved(id.to_string()));
        Ok(())
    }

    /// Remove every sensor and module.
    pub fn reset(&mut self) {
        let module_ids: Vec<ModuleId> = self.modules.keys().cloned().collect();
        let sensor_ids: Vec<SensorId> = self.sensors.keys().cloned().collect();
        for id in &module_ids {
            let _ = self.remove_module(id);
        }
        for id in &sensor_ids {
            let _ = self.remove_sensor(id);
        }
        tracing::debug!(
            "Reset graph ({} modules, {} sensors removed)",
            module_ids.len(),
            sensor_ids.len()
        );
        self.emit(GraphEvent::Reset);
    }

    // ── Data edges ──

    fn validate_data_edge(&self, edge: &DataEdge) -> GraphResult<()> {
        if self.sensors.contains_key(&edge.module_id) {
            return Err(GraphError::TypeMismatch {
                id: edge.module_id.clone(),
                expected: EntityKind::Module,
            });
        }
        let target = self
            .modules
            .get(&edge.module_id)
            .ok_or_else(|| GraphError::not_found(Missing::Module, &edge.module_id))?;
        let source = self
            .entity(&edge.out_id)
            .ok_or_else(|| GraphError::not_found(Missing::Entity, &edge.out_id))?;

        if !target.module.has_param(&edge.module_param) {
            return Err(GraphError::invalid_reference(
                &edge.module_id,
                NameRole::Param,
                &edge.module_param,
            ));
        }
        if !source.has_return(&edge.out_ret) {
            return Err(GraphError::invalid_reference(
                &edge.out_id,
                NameRole::Return,
                &edge.out_ret,
            ));
        }
        if self.data_edges_from(&edge.out_id).contains(edge) {
            return Err(GraphError::Duplicate(format!("data edge {}", edge)));
        }
        Ok(())
    }

    /// Add a data edge from a sensor or module return to a module param.
    pub fn add_data_edge(&mut self, edge: DataEdge) -> GraphResult<()> {
        self.validate_data_edge(&edge)
            .inspect_err(|e| tracing::warn!("add_data_edge rejected: {}", e))?;

        if let Some(list) = self.outgoing_data_mut(&edge.out_id) {
            list.push(edge.clone());
        }
        if let Some(target) = self.modules.get_mut(&edge.module_id) {
            target.incoming_data.push(edge.clone());
        }
        tracing::debug!("Added data edge {}", edge);
        self.emit(GraphEvent::DataEdgeAdded(edge));
        Ok(())
    }

    /// Remove a data edge equal in every field to `edge`.
    pub fn remove_data_edge(&mut self, edge: &DataEdge) -> GraphResult<()> {
        let result = if !self.modules.contains_key(&edge.module_id) {
            Err(GraphError::not_found(Missing::Module, &edge.module_id))
        } else if self.entity(&edge.out_id).is_none() {
            Err(GraphError::not_found(Missing::Entity, &edge.out_id))
        } else if !self.data_edges_from(&edge.out_id).contains(edge) {
            Err(GraphError::not_found(Missing::DataEdge, edge.to_string()))
        } else {
            Ok(())
        };
        result.inspect_err(|e| tracing::warn!("remove_data_edge rejected: {}", e))?;

        self.detach_data_edge(edge);
        Ok(())
    }

    fn outgoing_data_mut(&mut self, id: &str) -> Option<&mut Vec<DataEdge>> {
        if let Some(node) = self.modules.get_mut(id) {
            Some(&mut node.data_edges)
        } else {
            self.sensors.get_mut(id).map(|node| &mut node.data_edges)
        }
    }

    /// Drop `edge` from both endpoint lists. Missing entries are skipped.
    fn detach_data_edge(&mut self, edge: &DataEdge) {
        let mut removed = false;
        if let Some(list) = self.outgoing_data_mut(&edge.out_id) {
            if let Some(pos) = list.iter().position(|e| e == edge) {
                list.remove(pos);
                removed = true;
            }
        }
        if let Some(target) = self.modules.get_mut(&edge.module_id) {
            if let Some(pos) = target.incoming_data.iter().position(|e| e == edge) {
                target.incoming_data.remove(pos);
            }
        }
        if removed {
            tracing::debug!("Removed data edge {}", edge);
            self.emit(GraphEvent::DataEdgeRemoved(edge.clone()));
        }
    }

    // ── State edges ──

    fn validate_state_edge(&self, edge: &StateEdge) -> GraphResult<()> {
        if self.sensors.contains_key(&edge.module_id) {
            return Err(GraphError::TypeMismatch {
                id: edge.module_id.clone(),
                expected: EntityKind::Module,
            });
        }
        if self.modules.contains_key(&edge.sensor_id) {
            return Err(GraphError::TypeMismatch {
                id: edge.sensor_id.clone(),
                expected: EntityKind::Sensor,
            });
        }
        let module = self
            .modules
            .get(&edge.module_id)
            .ok_or_else(|| GraphError::not_found(Missing::Module, &edge.module_id))?;
        let sensor = self
            .sensors
            .get(&edge.sensor_id)
            .ok_or_else(|| GraphError::not_found(Missing::Sensor, &edge.sensor_id))?;

        if !module.module.has_return(&edge.module_ret) {
            return Err(GraphError::invalid_reference(
                &edge.module_id,
                NameRole::Return,
                &edge.module_ret,
            ));
        }
        if !sensor.sensor.has_state_key(&edge.sensor_key) {
            return Err(GraphError::invalid_reference(
                &edge.sensor_id,
                NameRole::StateKey,
                &edge.sensor_key,
            ));
        }
        if module.state_edges.contains(edge) {
            return Err(GraphError::Duplicate(format!("state edge {}", edge)));
        }
        Ok(())
    }

    /// Add a state edge from a module return to a sensor state key.
    pub fn add_state_edge(&mut self, edge: StateEdge) -> GraphResult<()> {
        self.validate_state_edge(&edge)
            .inspect_err(|e| tracing::warn!("add_state_edge rejected: {}", e))?;

        if let Some(source) = self.modules.get_mut(&edge.module_id) {
            source.state_edges.push(edge.clone());
        }
        if let Some(target) = self.sensors.get_mut(&edge.sensor_id) {
            target.incoming_state.push(edge.clone());
        }
        tracing::debug!("Added state edge {}", edge);
        self.emit(GraphEvent::StateEdgeAdded(edge));
        Ok(())
    }

    /// Remove a state edge equal in every field to `edge`.
    pub fn remove_state_edge(&mut self, edge: &StateEdge) -> GraphResult<()> {
        let result = match (
            self.modules.get(&edge.module_id),
            self.sensors.contains_key(&edge.sensor_id),
        ) {
            (None, _) => Err(GraphError::not_found(Missing::Module, &edge.module_id)),
            (_, false) => Err(GraphError::not_found(Missing::Sensor, &edge.sensor_id)),
            (Some(node), true) if !node.state_edges.contains(edge) => {
                Err(GraphError::not_found(Missing::StateEdge, edge.to_string()))
            }
            _ => Ok(()),
        };
        result.inspect_err(|e| tracing::warn!("remove_state_edge rejected: {}", e))?;

        self.detach_state_edge(edge);
        Ok(())
    }

    fn detach_state_edge(&mut self, edge: &StateEdge) {
        let mut removed = false;
        if let Some(source) = self.modules.get_mut(&edge.module_id) {
            if let Some(pos) = source.state_edges.iter().position(|e| e == edge) {
                source.state_edges.remove(pos);
                removed = true;
            }
        }
        if let Some(target) = self.sensors.get_mut(&edge.sensor_id) {
            if let Some(pos) = target.incoming_state.iter().position(|e| e == edge) {
                target.incoming_state.remove(pos);
            }
        }
        if removed {
            tracing::debug!("Removed state edge {}", edge);
            self.emit(GraphEvent::StateEdgeRemoved(edge.clone()));
        }
    }

    // ── Network edges and intervals ──

    /// Grant a module network access to one domain.
    pub fn add_network_edge(&mut self, edge: NetworkEdge) -> GraphResult<()> {
        let result = if self.sensors.contains_key(&edge.module_id) {
            Err(GraphError::TypeMismatch {
                id: edge.module_id.clone(),
                expected: EntityKind::Module,
            })
        } else {
            match self.modules.get(&edge.module_id) {
                None => Err(GraphError::not_found(Missing::Module, &edge.module_id)),
                Some(node) if node.network_edges.contains(&edge) => {
                    Err(GraphError::Duplicate(format!("network edge {}", edge)))
                }
                Some(_) => Ok(()),
            }
        };
        result.inspect_err(|e| tracing::warn!("add_network_edge rejected: {}", e))?;

        if let Some(node) = self.modules.get_mut(&edge.module_id) {
            node.network_edges.push(edge.clone());
        }
        tracing::debug!("Added network edge {}", edge);
        self.emit(GraphEvent::NetworkEdgeAdded(edge));
        Ok(())
    }

    /// Revoke all network access of a module.
    pub fn remove_network_edges(&mut self, module_id: &str) -> GraphResult<()> {
        if !self.modules.contains_key(module_id) {
            let err = GraphError::not_found(Missing::Module, module_id);
            tracing::warn!("remove_network_edges rejected: {}", err);
            return Err(err);
        }
        self.clear_network_edges(module_id);
        Ok(())
    }

    fn clear_network_edges(&mut self, module_id: &str) {
        if let Some(node) = self.modules.get_mut(module_id) {
            let count = node.network_edges.len();
            node.network_edges.clear();
            tracing::debug!("Cleared {} network edges of {}", count, module_id);
            self.emit(GraphEvent::NetworkEdgesRemoved(module_id.to_string()));
        }
    }

    /// Set or clear the schedule of a module.
    ///
    /// `None` or NaN clears it; a finite positive number sets it; anything else
    /// is rejected.
    pub fn set_interval(&mut self, module_id: &str, duration: Option<f64>) -> GraphResult<()> {
        let result = match (self.modules.contains_key(module_id), duration) {
            (false, _) => Err(GraphError::not_found(Missing::Module, module_id)),
            (true, Some(d)) if !d.is_nan() && !(d > 0.0 && d.is_finite()) => Err(
                GraphError::InvalidValue(format!("positive interval required: {}", d)),
            ),
            _ => Ok(()),
        };
        result.inspect_err(|e| tracing::warn!("set_interval rejected: {}", e))?;

        let duration = duration.filter(|d| !d.is_nan());
        if let Some(node) = self.modules.get_mut(module_id) {
            node.interval = duration;
        }
        tracing::debug!("Interval of {} set to {:?}", module_id, duration);
        self.emit(GraphEvent::IntervalChanged {
            module_id: module_id.to_string(),
            duration,
        });
        Ok(())
    }
}
