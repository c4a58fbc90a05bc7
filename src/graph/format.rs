//! Canonical flat serialization of the graph.
//!
//! [`GraphFormat`] is the stable contract between the engine, persistence and
//! the policy enumerator. Every list is deterministically ordered so that two
//! structurally identical graphs serialize to identical bytes:
//!
//! | list        | order                                              |
//! |-------------|----------------------------------------------------|
//! | `sensors`   | sensor id                                          |
//! | `moduleIds` | local id                                           |
//! | `data`      | source id, source return, target id, target param  |
//! | `state`     | module id, module return, sensor id, sensor key    |
//! | `network`   | module id, domain                                  |
//! | `interval`  | module id                                          |

use super::edge::{DataEdge, Interval, NetworkEdge, StateEdge};
use super::error::{GraphError, GraphResult};
use super::event::event_channel;
use super::Graph;
use crate::catalog::ModuleRepository;
use crate::types::{ModuleTemplate, Sensor};
use serde::{Deserialize, Serialize};

/// A module instance as it appears in the format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFormat {
    pub local: String,
    pub global: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub returns: Vec<String>,
}

/// All edges of a graph, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSet {
    #[serde(default)]
    pub data: Vec<DataEdge>,
    #[serde(default)]
    pub state: Vec<StateEdge>,
    #[serde(default)]
    pub network: Vec<NetworkEdge>,
    #[serde(default)]
    pub interval: Vec<Interval>,
}

impl EdgeSet {
    pub fn len(&self) -> usize {
        self.data.len() + self.state.len() + self.network.len() + self.interval.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical flat representation of a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphFormat {
    #[serde(default)]
    pub sensors: Vec<Sensor>,
    #[serde(default, rename = "moduleIds")]
    pub module_ids: Vec<ModuleFormat>,
    #[serde(default)]
    pub edges: EdgeSet,
}

impl GraphFormat {
    /// Put every list into canonical order.
    pub fn normalize(&mut self) {
        self.sensors.sort_by(|a, b| a.id.cmp(&b.id));
        self.module_ids.sort_by(|a, b| a.local.cmp(&b.local));
        self.edges.data.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.edges.state.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.edges
            .network
            .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.edges.interval.sort_by(|a, b| a.module_id.cmp(&b.module_id));
    }

    /// Global id of the module placed under `local`.
    pub fn global_id(&self, local: &str) -> Option<&str> {
        self.module_ids
            .iter()
            .find(|m| m.local == local)
            .map(|m| m.global.as_str())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// What changed going from `self` to `other`.
    pub fn diff(&self, other: &GraphFormat) -> FormatDiff {
        fn missing_from<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
            a.iter().filter(|x| !b.contains(x)).cloned().collect()
        }

        FormatDiff {
            added_sensors: missing_from(&other.sensors, &self.sensors),
            removed_sensors: missing_from(&self.sensors, &other.sensors),
            added_modules: missing_from(&other.module_ids, &self.module_ids),
            removed_modules: missing_from(&self.module_ids, &other.module_ids),
            added_edges: EdgeSet {
                data: missing_from(&other.edges.data, &self.edges.data),
                state: missing_from(&other.edges.state, &self.edges.state),
                network: missing_from(&other.edges.network, &self.edges.network),
                interval: missing_from(&other.edges.interval, &self.edges.interval),
            },
            removed_edges: EdgeSet {
                data: missing_from(&self.edges.data, &other.edges.data),
                state: missing_from(&self.edges.state, &other.edges.state),
                network: missing_from(&self.edges.network, &other.edges.network),
                interval: missing_from(&self.edges.interval, &other.edges.interval),
            },
        }
    }
}

/// Difference between two formats, for incremental persistence.
///
/// A changed sensor or module definition shows up as removed plus added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatDiff {
    pub added_sensors: Vec<Sensor>,
    pub removed_sensors: Vec<Sensor>,
    pub added_modules: Vec<ModuleFormat>,
    pub removed_modules: Vec<ModuleFormat>,
    pub added_edges: EdgeSet,
    pub removed_edges: EdgeSet,
}

impl FormatDiff {
    pub fn is_empty(&self) -> bool {
        self.added_sensors.is_empty()
            && self.removed_sensors.is_empty()
            && self.added_modules.is_empty()
            && self.removed_modules.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

impl std::fmt::Display for FormatDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for s in &self.added_sensors {
            writeln!(f, "+ sensor {}", s.id)?;
        }
        for s in &self.removed_sensors {
            writeln!(f, "- sensor {}", s.id)?;
        }
        for m in &self.added_modules {
            writeln!(f, "+ module {} ({})", m.local, m.global)?;
        }
        for m in &self.removed_modules {
            writeln!(f, "- module {} ({})", m.local, m.global)?;
        }
        for (sign, set) in [("+", &self.added_edges), ("-", &self.removed_edges)] {
            for e in &set.data {
                writeln!(f, "{} data {}", sign, e)?;
            }
            for e in &set.state {
                writeln!(f, "{} state {}", sign, e)?;
            }
            for e in &set.network {
                writeln!(f, "{} network {}", sign, e)?;
            }
            for i in &set.interval {
                writeln!(f, "{} interval {} every {}s", sign, i.module_id, i.duration)?;
            }
        }
        Ok(())
    }
}

/// What to do when an entity or edge of a loaded format is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Stop at the first rejected item
    #[default]
    Strict,
    /// Skip rejected items and report them
    Lenient,
}

impl Graph {
    /// Project the graph into its canonical flat form.
    pub fn to_format(&self) -> GraphFormat {
        let sensors = self.sensors().cloned().collect();
        let module_ids = self
            .modules()
            .map(|m| ModuleFormat {
                local: m.local_id.clone(),
                global: m.global_id.clone(),
                params: m.params.clone(),
                returns: m.returns.clone(),
            })
            .collect();

        let mut data: Vec<DataEdge> = self
            .sensors
            .values()
            .flat_map(|n| n.data_edges.iter())
            .chain(self.modules.values().flat_map(|n| n.data_edges.iter()))
            .cloned()
            .collect();
        data.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut state: Vec<StateEdge> = self
            .modules
            .values()
            .flat_map(|n| n.state_edges.iter())
            .cloned()
            .collect();
        state.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut network: Vec<NetworkEdge> = self
            .modules
            .values()
            .flat_map(|n| n.network_edges.iter())
            .cloned()
            .collect();
        network.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let interval = self
            .modules
            .iter()
            .filter_map(|(id, n)| n.interval.map(|d| Interval::new(id.clone(), d)))
            .collect();

        GraphFormat {
            sensors,
            module_ids,
            edges: EdgeSet {
                data,
                state,
                network,
                interval,
            },
        }
    }

    /// Build a graph from a format, failing on the first rejected item.
    pub fn from_format(format: &GraphFormat, repo: &dyn ModuleRepository) -> GraphResult<Graph> {
        let mut graph = Graph::new();
        graph.load_format(format, repo, LoadPolicy::Strict)?;
        Ok(graph)
    }

    /// Build a graph from a format, skipping rejected items.
    pub fn from_format_lenient(
        format: &GraphFormat,
        repo: &dyn ModuleRepository,
    ) -> (Graph, Vec<GraphError>) {
        let mut graph = Graph::new();
        let skipped = graph
            .load_format(format, repo, LoadPolicy::Lenient)
            .unwrap_or_default();
        (graph, skipped)
    }

    /// Replace the contents of this graph with `format`.
    ///
    /// Sensors are added first, then modules under the local ids the format
    /// gives, then data, state, network edges and intervals. Nothing is
    /// pre-validated: rejected items surface the engine's own errors. Under
    /// [`LoadPolicy::Lenient`] they are collected and returned instead.
    ///
    /// The format is staged into a separate graph first. On failure `self` is
    /// left untouched and no events are sent. On success the old contents are
    /// reset and the staged events follow the `Reset` event.
    pub fn load_format(
        &mut self,
        format: &GraphFormat,
        repo: &dyn ModuleRepository,
        policy: LoadPolicy,
    ) -> GraphResult<Vec<GraphError>> {
        let (tx, staged_events) = event_channel();
        let mut staged = Graph::new().with_event_sink(tx);
        let skipped = staged
            .stage_format(format, repo, policy)
            .inspect_err(|e| tracing::warn!("load_format rejected: {}", e))?;

        self.reset();
        staged.events = self.events.take();
        *self = staged;
        for event in staged_events.try_iter() {
            self.emit(event);
        }

        tracing::info!(
            "Loaded graph: {} sensors, {} modules, {} items skipped",
            self.sensor_count(),
            self.module_count(),
            skipped.len()
        );
        Ok(skipped)
    }

    fn stage_format(
        &mut self,
        format: &GraphFormat,
        repo: &dyn ModuleRepository,
        policy: LoadPolicy,
    ) -> GraphResult<Vec<GraphError>> {
        let mut skipped = Vec::new();
        let mut check = |result: GraphResult<()>| -> GraphResult<()> {
            match (result, policy) {
                (Ok(()), _) => Ok(()),
                (Err(e), LoadPolicy::Strict) => Err(e),
                (Err(e), LoadPolicy::Lenient) => {
                    skipped.push(e);
                    Ok(())
                }
            }
        };

        for sensor in &format.sensors {
            check(self.add_sensor(sensor.clone()))?;
        }
        for m in &format.module_ids {
            let template = repo.lookup_module(&m.global).unwrap_or_else(|| {
                tracing::warn!(
                    "Module {} not in catalog, using the declaration stored with {}",
                    m.global,
                    m.local
                );
                ModuleTemplate {
                    params: m.params.clone(),
                    returns: m.returns.clone(),
                    ..ModuleTemplate::new(m.global.clone())
                }
            });
            check(self.add_module_with_id(m.local.clone(), &template))?;
        }
        for edge in &format.edges.data {
            check(self.add_data_edge(edge.clone()))?;
        }
        for edge in &format.edges.state {
            check(self.add_state_edge(edge.clone()))?;
        }
        for edge in &format.edges.network {
            check(self.add_network_edge(edge.clone()))?;
        }
        for interval in &format.edges.interval {
            check(self.set_interval(&interval.module_id, Some(interval.duration)))?;
        }
        Ok(skipped)
    }
}
