//! Reference compositions.
//!
//! Two small homes used throughout the docs and tests: a voice assistant
//! that can search the web and switch lights, and a security camera that
//! reports noised people counts and pulls firmware once a day.

use super::{DataEdge, Graph, NetworkEdge, StateEdge};
use crate::catalog::Catalog;
use crate::error::Result;

/// Seconds in a day.
const DAILY: f64 = 24.0 * 60.0 * 60.0;

/// A named reference composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    VoiceAssistant,
    SecurityCamera,
}

impl Preset {
    pub fn all() -> &'static [Preset] {
        &[Preset::VoiceAssistant, Preset::SecurityCamera]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::VoiceAssistant => "voice-assistant",
            Preset::SecurityCamera => "security-camera",
        }
    }

    pub fn build(&self, catalog: &Catalog) -> Result<Graph> {
        match self {
            Preset::VoiceAssistant => voice_assistant(catalog),
            Preset::SecurityCamera => security_camera(catalog),
        }
    }
}

/// Two microphones feeding a command classifier that drives search and two bulbs.
pub fn voice_assistant(catalog: &Catalog) -> Result<Graph> {
    let mut g = Graph::new();
    g.add_sensor(catalog.sensor_with_id("mic", "mic")?)?;
    g.add_sensor(catalog.sensor_with_id("mic", "mic_1")?)?;
    g.add_sensor(catalog.sensor_with_id("bulb", "kitchen_bulb")?)?;
    g.add_sensor(catalog.sensor_with_id("bulb", "bathroom_bulb")?)?;

    let classifier = g.add_module(&catalog.require_module("command_classifier")?);
    let search = g.add_module(&catalog.require_module("search")?);
    let lights = g.add_module(&catalog.require_module("light_switch")?);

    g.add_data_edge(DataEdge::new("mic", "sound", &classifier, "sound"))?;
    g.add_data_edge(DataEdge::new("mic_1", "sound", &classifier, "sound"))?;
    g.add_data_edge(DataEdge::new(&classifier, "query_intent", &search, "query_intent"))?;
    g.add_data_edge(DataEdge::new(&classifier, "light_intent", &lights, "light_intent"))?;
    g.add_network_edge(NetworkEdge::new(&search, "google.com"))?;
    g.add_state_edge(StateEdge::new(&search, "response", "mic", "response"))?;
    g.add_state_edge(StateEdge::new(&lights, "state", "kitchen_bulb", "on"))?;
    g.add_state_edge(StateEdge::new(&lights, "state", "bathroom_bulb", "on"))?;
    Ok(g)
}

/// A camera with people counting, compressed streaming and daily firmware updates.
pub fn security_camera(catalog: &Catalog) -> Result<Graph> {
    let mut g = Graph::new();
    g.add_sensor(catalog.sensor_with_id("camera", "camera")?)?;

    let detection = g.add_module(&catalog.require_module("person_detection")?);
    let privacy = g.add_module(&catalog.require_module("differential_privacy")?);
    let firmware = g.add_module(&catalog.require_module("firmware_update")?);
    let targz = g.add_module(&catalog.require_module("targz")?);
    let on = g.add_module(&catalog.require_module("true")?);
    let off = g.add_module(&catalog.require_module("false")?);

    g.add_data_edge(DataEdge::new("camera", "motion", &detection, "image"))?;
    g.add_data_edge(DataEdge::new(&detection, "count", &privacy, "count"))?;
    g.add_data_edge(DataEdge::new("camera", "streaming", &targz, "bytes").stateful())?;
    g.add_network_edge(NetworkEdge::new(&privacy, "metrics.com"))?;
    g.add_network_edge(NetworkEdge::new(&firmware, "firmware.com"))?;
    g.set_interval(&firmware, Some(DAILY))?;
    g.add_state_edge(StateEdge::new(&firmware, "firmware", "camera", "firmware"))?;
    g.add_state_edge(StateEdge::new(&on, "true", "camera", "livestream"))?;
    g.add_state_edge(StateEdge::new(&off, "false", "camera", "livestream"))?;
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_build() {
        let catalog = Catalog::builtin();
        let g = voice_assistant(&catalog).unwrap();
        assert_eq!(g.sensor_count(), 4);
        assert_eq!(g.module_count(), 3);
        assert_eq!(g.data_edges_from("command_classifier").len(), 2);

        let g = security_camera(&catalog).unwrap();
        assert_eq!(g.sensor_count(), 1);
        assert_eq!(g.module_count(), 6);
        assert_eq!(g.state_edges_into("camera").len(), 3);
        assert_eq!(g.interval("firmware_update"), Some(DAILY));
    }

    #[test]
    fn test_presets_need_their_templates() {
        assert!(voice_assistant(&Catalog::new()).is_err());
        for preset in Preset::all() {
            assert!(preset.build(&Catalog::builtin()).is_ok(), "{}", preset.name());
        }
    }
}
