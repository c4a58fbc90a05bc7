//! Module and sensor catalog.
//!
//! The graph engine never invents declarations: modules are placed from
//! templates looked up by global id, and sensors are instantiated from
//! sensor templates. [`ModuleRepository`] is the lookup seam; [`Catalog`] is
//! the in-process implementation, seeded with [`builtin`] templates and
//! optionally extended from a TOML file:
//!
//! ```toml
//! [[modules]]
//! id = "weather"
//! params = ["location"]
//! returns = ["forecast"]
//! network = ["weather.com"]
//!
//! [[sensors]]
//! id = "thermostat"
//! state_keys = ["target"]
//! returns = ["temperature"]
//! ```

pub mod builtin;

use crate::error::{HomeflowError, Result};
use crate::types::{ModuleTemplate, Sensor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Lookup of module and sensor templates by id.
pub trait ModuleRepository {
    /// Module template registered under `global_id`.
    fn lookup_module(&self, global_id: &str) -> Option<ModuleTemplate>;

    /// Sensor template registered under `template`.
    fn lookup_sensor(&self, template: &str) -> Option<Sensor>;
}

/// On-disk shape of a catalog file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    modules: Vec<ModuleTemplate>,
    #[serde(default)]
    sensors: Vec<Sensor>,
}

/// Templates keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: BTreeMap<String, ModuleTemplate>,
    sensors: BTreeMap<String, Sensor>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in templates.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for module in builtin::modules() {
            catalog.insert_module(module);
        }
        for sensor in builtin::sensors() {
            catalog.insert_sensor(sensor);
        }
        catalog
    }

    /// Parse a TOML catalog.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)
            .map_err(|e| HomeflowError::Catalog(format!("Failed to parse catalog: {}", e)))?;
        let mut catalog = Self::new();
        for module in file.modules {
            catalog.insert_module(module);
        }
        for sensor in file.sensors {
            catalog.insert_sensor(sensor);
        }
        Ok(catalog)
    }

    /// Load a TOML catalog from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HomeflowError::Catalog(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::info!(
            "Loaded catalog from {:?}: {} modules, {} sensors",
            path,
            catalog.modules.len(),
            catalog.sensors.len()
        );
        Ok(catalog)
    }

    /// Overlay `other` on this catalog. Templates in `other` win on id clashes.
    pub fn merge(&mut self, other: Catalog) {
        for (id, module) in other.modules {
            if self.modules.insert(id.clone(), module).is_some() {
                tracing::debug!("Catalog module {} overridden", id);
            }
        }
        for (id, sensor) in other.sensors {
            if self.sensors.insert(id.clone(), sensor).is_some() {
                tracing::debug!("Catalog sensor {} overridden", id);
            }
        }
    }

    pub fn insert_module(&mut self, template: ModuleTemplate) {
        self.modules.insert(template.id.clone(), template);
    }

    pub fn insert_sensor(&mut self, sensor: Sensor) {
        self.sensors.insert(sensor.id.clone(), sensor);
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleTemplate> {
        self.modules.values()
    }

    pub fn sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.values()
    }

    /// Module template, or a catalog error naming the missing id.
    pub fn require_module(&self, global_id: &str) -> Result<ModuleTemplate> {
        self.lookup_module(global_id)
            .ok_or_else(|| HomeflowError::Catalog(format!("unknown module: {}", global_id)))
    }

    /// Instantiate sensor template `template` under `id`.
    pub fn sensor_with_id(&self, template: &str, id: &str) -> Result<Sensor> {
        self.lookup_sensor(template)
            .map(|s| s.with_id(id))
            .ok_or_else(|| {
                HomeflowError::Catalog(format!("unknown sensor template: {}", template))
            })
    }
}

impl ModuleRepository for Catalog {
    fn lookup_module(&self, global_id: &str) -> Option<ModuleTemplate> {
        self.modules.get(global_id).cloned()
    }

    fn lookup_sensor(&self, template: &str) -> Option<Sensor> {
        self.sensors.get(template).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.modules().count(), 10);
        assert_eq!(catalog.sensors().count(), 3);

        let search = catalog.lookup_module("search").unwrap();
        assert_eq!(search.network, vec!["google.com"]);
        assert!(catalog.lookup_module("weather").is_none());
    }

    #[test]
    fn test_sensor_with_id() {
        let catalog = Catalog::builtin();
        let bulb = catalog.sensor_with_id("bulb", "kitchen_bulb").unwrap();
        assert_eq!(bulb.id, "kitchen_bulb");
        assert!(bulb.has_state_key("on"));

        let err = catalog.sensor_with_id("radar", "r").unwrap_err();
        assert!(err.to_string().contains("radar"));
    }

    #[test]
    fn test_from_toml_and_merge() {
        let toml = r#"
            [[modules]]
            id = "weather"
            params = ["location"]
            returns = ["forecast"]
            network = ["weather.com"]

            [[modules]]
            id = "search"
            params = ["query_intent"]
            returns = ["response"]
            network = ["duckduckgo.com"]

            [[sensors]]
            id = "thermostat"
            state_keys = ["target"]
            returns = ["temperature"]
        "#;
        let extra = Catalog::from_toml_str(toml).unwrap();
        let mut catalog = Catalog::builtin();
        catalog.merge(extra);

        assert_eq!(catalog.modules().count(), 11);
        assert_eq!(
            catalog.lookup_module("search").unwrap().network,
            vec!["duckduckgo.com"]
        );
        assert!(catalog.lookup_sensor("thermostat").is_some());
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(Catalog::from_toml_str("[[modules]]\nid = 3").is_err());
    }
}
