//! Edge types of the composition graph.
//!
//! Three edge kinds connect entities, plus a per-module schedule:
//!
//! ```text
//! sensor.return ──data──► module.param
//! module.return ──data──► module.param
//! module.return ──state─► sensor.state_key
//! module ───────network─► domain
//! ```
//!
//! Edges compare structurally (every field). The `sort_key` of each kind is
//! the canonical order used by `GraphFormat`.

use crate::types::{EntityId, ModuleId, SensorId};
use serde::{Deserialize, Serialize};

/// Data flowing from a sensor or module return into a module parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataEdge {
    /// Stateless edges trigger the destination on every value
    pub stateless: bool,
    pub out_id: EntityId,
    pub out_ret: String,
    pub module_id: ModuleId,
    pub module_param: String,
}

impl DataEdge {
    pub fn new(
        out_id: impl Into<String>,
        out_ret: impl Into<String>,
        module_id: impl Into<String>,
        module_param: impl Into<String>,
    ) -> Self {
        Self {
            stateless: true,
            out_id: out_id.into(),
            out_ret: out_ret.into(),
            module_id: module_id.into(),
            module_param: module_param.into(),
        }
    }

    /// Mark the edge as stateful
    pub fn stateful(mut self) -> Self {
        self.stateless = false;
        self
    }

    pub fn sort_key(&self) -> (&str, &str, &str, &str, bool) {
        (
            &self.out_id,
            &self.out_ret,
            &self.module_id,
            &self.module_param,
            self.stateless,
        )
    }
}

impl std::fmt::Display for DataEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.out_id, self.out_ret, self.module_id, self.module_param
        )?;
        if !self.stateless {
            write!(f, " (stateful)")?;
        }
        Ok(())
    }
}

/// A module return actuating a sensor state key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateEdge {
    pub module_id: ModuleId,
    pub module_ret: String,
    pub sensor_id: SensorId,
    pub sensor_key: String,
}

impl StateEdge {
    pub fn new(
        module_id: impl Into<String>,
        module_ret: impl Into<String>,
        sensor_id: impl Into<String>,
        sensor_key: impl Into<String>,
    ) -> Self {
        Self {
            module_id: module_id.into(),
            module_ret: module_ret.into(),
            sensor_id: sensor_id.into(),
            sensor_key: sensor_key.into(),
        }
    }

    pub fn sort_key(&self) -> (&str, &str, &str, &str) {
        (
            &self.module_id,
            &self.module_ret,
            &self.sensor_id,
            &self.sensor_key,
        )
    }
}

impl std::fmt::Display for StateEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} => {}.{}",
            self.module_id, self.module_ret, self.sensor_id, self.sensor_key
        )
    }
}

/// Network access granted to a module for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub module_id: ModuleId,
    pub domain: String,
}

impl NetworkEdge {
    pub fn new(module_id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            domain: domain.into(),
        }
    }

    pub fn sort_key(&self) -> (&str, &str) {
        (&self.module_id, &self.domain)
    }
}

impl std::fmt::Display for NetworkEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~> {}", self.module_id, self.domain)
    }
}

/// Schedule of a module that runs every `duration` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub module_id: ModuleId,
    pub duration: f64,
}

impl Interval {
    pub fn new(module_id: impl Into<String>, duration: f64) -> Self {
        Self {
            module_id: module_id.into(),
            duration,
        }
    }
}
