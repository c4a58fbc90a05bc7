//! Core entity types for homeflow
//!
//! This module contains the fundamental data structures placed on the
//! composition graph: physical sensors and processing modules.
//!
//! # Main Types
//!
//! - [`Sensor`] - A physical device with state keys (inputs) and returns (outputs)
//! - [`ModuleTemplate`] - A reusable module definition from the catalog
//! - [`ModuleInstance`] - A placed copy of a template with its own local id
//! - [`Entity`] - Either of the two, as a data-edge source
//!
//! # Data sources
//!
//! Data edges may originate at a sensor or a module instance. Both implement
//! [`DataSource`], which exposes only the capability the graph needs from an
//! edge source: an id and its declared return names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a sensor.
pub type SensorId = String;

/// Local identifier of a module instance.
pub type ModuleId = String;

/// Identifier of any entity on the graph (sensor or module instance).
pub type EntityId = String;

/// Reserved identifier of the network node. No sensor or module may use it.
pub const NETWORK_NODE_ID: &str = "NET";

/// The kind of an entity on the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Sensor,
    Module,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Sensor => write!(f, "sensor"),
            EntityKind::Module => write!(f, "module"),
        }
    }
}

// ==================== Data Source Capability ====================

/// Anything that can sit at the source end of a data edge.
pub trait DataSource {
    /// Identifier used to address edges.
    fn id(&self) -> &str;

    /// Declared return names, in declaration order.
    fn returns(&self) -> &[String];

    /// Whether `name` is a declared return.
    fn has_return(&self, name: &str) -> bool {
        self.returns().iter().any(|r| r == name)
    }
}

/// Borrowed view of an entity, tagged by kind.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Sensor(&'a Sensor),
    Module(&'a ModuleInstance),
}

impl Entity<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Sensor(_) => EntityKind::Sensor,
            Entity::Module(_) => EntityKind::Module,
        }
    }
}

impl DataSource for Entity<'_> {
    fn id(&self) -> &str {
        match self {
            Entity::Sensor(s) => s.id(),
            Entity::Module(m) => m.id(),
        }
    }

    fn returns(&self) -> &[String] {
        match self {
            Entity::Sensor(s) => DataSource::returns(*s),
            Entity::Module(m) => DataSource::returns(*m),
        }
    }
}

// ==================== Sensor ====================

/// Display-only descriptions of a sensor's keys and returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescription {
    #[serde(default)]
    pub state_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub returns: BTreeMap<String, String>,
}

impl SensorDescription {
    pub fn is_empty(&self) -> bool {
        self.state_keys.is_empty() && self.returns.is_empty()
    }
}

/// A physical sensor or actuator registered on the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// Unique identifier
    pub id: SensorId,

    /// Names of the actuation/control inputs the sensor accepts
    #[serde(default)]
    pub state_keys: Vec<String>,

    /// Names of the outputs the sensor produces
    #[serde(default)]
    pub returns: Vec<String>,

    /// Human-readable descriptions (not load-bearing)
    #[serde(default, skip_serializing_if = "SensorDescription::is_empty")]
    pub description: SensorDescription,
}

impl Sensor {
    /// Create a sensor with no keys or returns
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state_keys: Vec::new(),
            returns: Vec::new(),
            description: SensorDescription::default(),
        }
    }

    /// Declare a state key with its description
    pub fn with_state_key(mut self, key: impl Into<String>, description: impl Into<String>) -> Self {
        let key = key.into();
        self.description
            .state_keys
            .insert(key.clone(), description.into());
        self.state_keys.push(key);
        self
    }

    /// Declare a return value with its description
    pub fn with_return(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        self.description.returns.insert(name.clone(), description.into());
        self.returns.push(name);
        self
    }

    /// Copy of this sensor registered under another id
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    pub fn has_state_key(&self, key: &str) -> bool {
        self.state_keys.iter().any(|k| k == key)
    }
}

impl DataSource for Sensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn returns(&self) -> &[String] {
        &self.returns
    }
}

// ==================== Modules ====================

/// Display-only descriptions of a module template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescription {
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub returns: BTreeMap<String, String>,
    #[serde(default)]
    pub network: BTreeMap<String, String>,
}

/// Reusable module definition, looked up by its global id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTemplate {
    /// Global identifier in the module repository
    pub id: String,

    #[serde(default)]
    pub params: Vec<String>,

    #[serde(default)]
    pub returns: Vec<String>,

    /// Network domains the module declares it may contact
    #[serde(default)]
    pub network: Vec<String>,

    #[serde(default)]
    pub description: ModuleDescription,
}

impl ModuleTemplate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Vec::new(),
            returns: Vec::new(),
            network: Vec::new(),
            description: ModuleDescription::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description.module = description.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        self.description.params.insert(name.clone(), description.into());
        self.params.push(name);
        self
    }

    pub fn with_return(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        self.description.returns.insert(name.clone(), description.into());
        self.returns.push(name);
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>, description: impl Into<String>) -> Self {
        let domain = domain.into();
        self.description
            .network
            .insert(domain.clone(), description.into());
        self.network.push(domain);
        self
    }
}

/// A module template placed on the graph under a local id.
///
/// The global id is not unique: a template may be instantiated several times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInstance {
    pub local_id: ModuleId,
    pub global_id: String,
    pub params: Vec<String>,
    pub returns: Vec<String>,
    pub network: Vec<String>,
    pub description: ModuleDescription,
}

impl ModuleInstance {
    pub fn from_template(local_id: impl Into<String>, template: &ModuleTemplate) -> Self {
        Self {
            local_id: local_id.into(),
            global_id: template.id.clone(),
            params: template.params.clone(),
            returns: template.returns.clone(),
            network: template.network.clone(),
            description: template.description.clone(),
        }
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }
}

impl DataSource for ModuleInstance {
    fn id(&self) -> &str {
        &self.local_id
    }

    fn returns(&self) -> &[String] {
        &self.returns
    }
}
