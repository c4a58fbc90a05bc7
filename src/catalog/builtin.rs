//! Built-in sensor and module templates.
//!
//! These are the devices and modules used by the reference compositions in
//! [`crate::graph::presets`].

use crate::types::{ModuleTemplate, Sensor};

/// Built-in sensor templates, keyed by their template id.
pub fn sensors() -> Vec<Sensor> {
    vec![
        Sensor::new("mic")
            .with_state_key("response", "Audio response to play back")
            .with_return("sound", "Recorded audio after a wake word"),
        Sensor::new("bulb").with_state_key("on", "Whether the bulb is lit"),
        Sensor::new("camera")
            .with_state_key("livestream", "Whether to stream continuously")
            .with_state_key("firmware", "Firmware image to install")
            .with_return("motion", "Frame captured on motion")
            .with_return("streaming", "Live video stream"),
    ]
}

/// Built-in module templates.
pub fn modules() -> Vec<ModuleTemplate> {
    vec![
        ModuleTemplate::new("command_classifier")
            .with_description("Classify a spoken command by intent")
            .with_param("sound", "Recorded speech")
            .with_return("light_intent", "Requested light state")
            .with_return("query_intent", "Search query"),
        ModuleTemplate::new("search")
            .with_description("Answer a query using a web search")
            .with_param("query_intent", "Search query")
            .with_return("response", "Spoken answer")
            .with_domain("google.com", "Search backend"),
        ModuleTemplate::new("light_switch")
            .with_description("Turn lights on or off")
            .with_param("light_intent", "Requested light state")
            .with_return("state", "New light state"),
        ModuleTemplate::new("person_detection")
            .with_description("Count the people in an image")
            .with_param("image", "Image to analyze")
            .with_return("count", "Number of people"),
        ModuleTemplate::new("differential_privacy")
            .with_description("Report a noised count")
            .with_param("count", "Exact count")
            .with_return("count", "Noised count")
            .with_domain("metrics.com", "Aggregate metrics collector"),
        ModuleTemplate::new("statistics")
            .with_description("Upload raw counts")
            .with_param("count", "Count to record")
            .with_domain("statistics.com", "Statistics collector"),
        ModuleTemplate::new("firmware_update")
            .with_description("Fetch the latest firmware image")
            .with_return("firmware", "Firmware image")
            .with_domain("firmware.com", "Firmware server"),
        ModuleTemplate::new("targz")
            .with_description("Compress a byte stream")
            .with_param("bytes", "Input bytes")
            .with_return("archive", "Compressed bytes"),
        ModuleTemplate::new("true")
            .with_description("Constant true")
            .with_return("true", "true"),
        ModuleTemplate::new("false")
            .with_description("Constant false")
            .with_return("false", "false"),
    ]
}
