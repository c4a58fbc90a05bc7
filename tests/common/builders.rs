//! Test data builders for creating test objects

use homeflow::types::{ModuleTemplate, Sensor};

/// Builder for creating test Sensors
pub struct SensorBuilder {
    id: String,
    state_keys: Vec<String>,
    returns: Vec<String>,
}

impl SensorBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state_keys: Vec::new(),
            returns: Vec::new(),
        }
    }

    pub fn state_key(mut self, key: &str) -> Self {
        self.state_keys.push(key.to_string());
        self
    }

    pub fn ret(mut self, name: &str) -> Self {
        self.returns.push(name.to_string());
        self
    }

    pub fn build(self) -> Sensor {
        Sensor {
            state_keys: self.state_keys,
            returns: self.returns,
            ..Sensor::new(self.id)
        }
    }
}

/// Builder for creating test ModuleTemplates
pub struct TemplateBuilder {
    template: ModuleTemplate,
}

impl TemplateBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            template: ModuleTemplate::new(id),
        }
    }

    pub fn param(mut self, name: &str) -> Self {
        self.template.params.push(name.to_string());
        self
    }

    pub fn ret(mut self, name: &str) -> Self {
        self.template.returns.push(name.to_string());
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.template.network.push(domain.to_string());
        self
    }

    pub fn build(self) -> ModuleTemplate {
        self.template
    }
}

/// Sensor `s{i}` with state keys `k0`, `k1` and returns `r0`, `r1`
pub fn generic_sensor(i: usize) -> Sensor {
    SensorBuilder::new(&format!("s{}", i))
        .state_key("k0")
        .state_key("k1")
        .ret("r0")
        .ret("r1")
        .build()
}

/// Templates `t0`, `t1`, `t2` with params `p0`, `p1` and returns `r0`, `r1`
pub fn generic_templates() -> Vec<ModuleTemplate> {
    (0..3)
        .map(|i| {
            TemplateBuilder::new(&format!("t{}", i))
                .param("p0")
                .param("p1")
                .ret("r0")
                .ret("r1")
                .domain(&format!("d{}.com", i))
                .build()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_builder() {
        let sensor = SensorBuilder::new("camera")
            .state_key("firmware")
            .ret("motion")
            .build();

        assert_eq!(sensor.id, "camera");
        assert_eq!(sensor.state_keys, vec!["firmware"]);
        assert_eq!(sensor.returns, vec!["motion"]);
    }
}
