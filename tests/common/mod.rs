//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use homeflow::catalog::Catalog;
use homeflow::graph::Graph;
use homeflow::policy::{PathEnumerator, Pipeline};

/// Labels of every pipeline of `graph`, in enumeration order
pub fn pipeline_labels(graph: &Graph) -> Vec<String> {
    PathEnumerator::enumerate(&graph.to_format())
        .iter()
        .map(Pipeline::label)
        .collect()
}

/// Index of the pipeline labelled `label`
pub fn pipeline_index(pipelines: &[Pipeline], label: &str) -> usize {
    pipelines
        .iter()
        .position(|p| p.label() == label)
        .unwrap_or_else(|| panic!("No pipeline {:?} in {:#?}", label, pipelines))
}

/// Built-in catalog plus the small generic templates used by builders
pub fn test_catalog() -> Catalog {
    let mut catalog = Catalog::builtin();
    for template in builders::generic_templates() {
        catalog.insert_module(template);
    }
    catalog
}
