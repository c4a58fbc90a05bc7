//! Integration tests for the graph engine
//!
//! These tests validate the engine through its public API:
//! - Referential integrity under arbitrary mutation sequences
//! - Canonical serialization and rebuilding through a module repository
//! - Change notifications

mod common;

use common::builders::{generic_sensor, generic_templates, SensorBuilder, TemplateBuilder};
use common::mock_helpers::{drain, observed_graph, MockRepo};
use homeflow::graph::{
    DataEdge, Graph, GraphError, GraphEvent, GraphFormat, Missing, ModuleFormat, NetworkEdge,
    StateEdge,
};
use proptest::prelude::*;

// ==================== Random mutation sequences ====================

const ENTITIES: &[&str] = &["s0", "s1", "s2", "t0", "t0_1", "t1", "t2", "ghost"];
const PORTS: &[&str] = &["k0", "k1", "r0", "r1", "p0", "p1", "zz"];
const DOMAINS: &[&str] = &["a.com", "b.com"];

#[derive(Debug, Clone)]
enum Op {
    AddSensor(usize),
    AddModule(usize),
    Data(usize, usize, usize, usize, bool),
    RemoveData(usize, usize, usize, usize, bool),
    State(usize, usize, usize, usize),
    RemoveState(usize, usize, usize, usize),
    Network(usize, usize),
    RemoveNetwork(usize),
    Interval(usize, i32),
    ClearInterval(usize),
    RemoveSensor(usize),
    RemoveModule(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let e = 0..ENTITIES.len();
    let p = 0..PORTS.len();
    prop_oneof![
        (0..3usize).prop_map(Op::AddSensor),
        (0..3usize).prop_map(Op::AddModule),
        (e.clone(), p.clone(), e.clone(), p.clone(), any::<bool>())
            .prop_map(|(a, b, c, d, s)| Op::Data(a, b, c, d, s)),
        (e.clone(), p.clone(), e.clone(), p.clone(), any::<bool>())
            .prop_map(|(a, b, c, d, s)| Op::RemoveData(a, b, c, d, s)),
        (e.clone(), p.clone(), e.clone(), p.clone()).prop_map(|(a, b, c, d)| Op::State(a, b, c, d)),
        (e.clone(), p.clone(), e.clone(), p.clone())
            .prop_map(|(a, b, c, d)| Op::RemoveState(a, b, c, d)),
        (e.clone(), 0..DOMAINS.len()).prop_map(|(a, d)| Op::Network(a, d)),
        e.clone().prop_map(Op::RemoveNetwork),
        (e.clone(), -10..100_000i32).prop_map(|(a, d)| Op::Interval(a, d)),
        e.clone().prop_map(Op::ClearInterval),
        e.clone().prop_map(Op::RemoveSensor),
        e.prop_map(Op::RemoveModule),
    ]
}

fn data_edge(a: usize, b: usize, c: usize, d: usize, stateless: bool) -> DataEdge {
    let edge = DataEdge::new(ENTITIES[a], PORTS[b], ENTITIES[c], PORTS[d]);
    if stateless {
        edge
    } else {
        edge.stateful()
    }
}

fn state_edge(a: usize, b: usize, c: usize, d: usize) -> StateEdge {
    StateEdge::new(ENTITIES[a], PORTS[b], ENTITIES[c], PORTS[d])
}

/// Apply one operation. `AddModule` always succeeds.
fn apply(g: &mut Graph, op: &Op) -> Result<(), GraphError> {
    let templates = generic_templates();
    match *op {
        Op::AddSensor(i) => g.add_sensor(generic_sensor(i)),
        Op::AddModule(i) => {
            g.add_module(&templates[i]);
            Ok(())
        }
        Op::Data(a, b, c, d, s) => g.add_data_edge(data_edge(a, b, c, d, s)),
        Op::RemoveData(a, b, c, d, s) => g.remove_data_edge(&data_edge(a, b, c, d, s)),
        Op::State(a, b, c, d) => g.add_state_edge(state_edge(a, b, c, d)),
        Op::RemoveState(a, b, c, d) => g.remove_state_edge(&state_edge(a, b, c, d)),
        Op::Network(a, d) => g.add_network_edge(NetworkEdge::new(ENTITIES[a], DOMAINS[d])),
        Op::RemoveNetwork(a) => g.remove_network_edges(ENTITIES[a]),
        Op::Interval(a, d) => g.set_interval(ENTITIES[a], Some(f64::from(d))),
        Op::ClearInterval(a) => g.set_interval(ENTITIES[a], None),
        Op::RemoveSensor(a) => g.remove_sensor(ENTITIES[a]),
        Op::RemoveModule(a) => g.remove_module(ENTITIES[a]),
    }
}

fn build(ops: &[Op]) -> Graph {
    let mut g = Graph::new();
    for op in ops {
        let _ = apply(&mut g, op);
    }
    g
}

fn mentions(format: &GraphFormat, id: &str) -> bool {
    let e = &format.edges;
    e.data.iter().any(|x| x.out_id == id || x.module_id == id)
        || e.state.iter().any(|x| x.module_id == id || x.sensor_id == id)
        || e.network.iter().any(|x| x.module_id == id)
        || e.interval.iter().any(|x| x.module_id == id)
}

proptest! {
    #[test]
    fn test_round_trip_is_byte_identical(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let g = build(&ops);
        let catalog = common::test_catalog();
        let format = g.to_format();

        let rebuilt = Graph::from_format(&format, &catalog).unwrap();
        prop_assert_eq!(rebuilt.to_format().to_json().unwrap(), format.to_json().unwrap());

        // Through JSON as well
        let parsed = GraphFormat::from_json(&format.to_json().unwrap()).unwrap();
        let rebuilt = Graph::from_format(&parsed, &catalog).unwrap();
        prop_assert_eq!(rebuilt.to_format(), format);
    }

    #[test]
    fn test_failed_mutations_change_nothing(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut g = Graph::new();
        for op in &ops {
            let before = g.to_format();
            if apply(&mut g, op).is_err() {
                prop_assert_eq!(g.to_format(), before, "{:?} failed but mutated the graph", op);
            }
        }
    }

    #[test]
    fn test_removed_entities_leave_no_edges(
        ops in prop::collection::vec(op_strategy(), 0..80),
        victim in 0..ENTITIES.len(),
    ) {
        let mut g = build(&ops);
        let id = ENTITIES[victim];
        let removed = if g.sensor(id).is_some() {
            g.remove_sensor(id).is_ok()
        } else {
            g.remove_module(id).is_ok()
        };

        if removed {
            prop_assert!(!g.contains(id));
            prop_assert_eq!(g.incident_edge_count(id), 0);
            prop_assert!(!mentions(&g.to_format(), id));
        }
    }

    #[test]
    fn test_format_is_canonical(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let format = build(&ops).to_format();
        let mut normalized = format.clone();
        normalized.normalize();
        prop_assert_eq!(normalized, format);
    }
}

// ==================== Identifier allocation ====================

#[test]
fn test_module_ids_never_overwrite() {
    let templates = generic_templates();
    let mut g = Graph::new();
    g.add_sensor(SensorBuilder::new("t0_1").build()).unwrap();

    assert_eq!(g.add_module(&templates[0]), "t0");
    // t0_1 is a sensor, so the next free suffix is 2
    assert_eq!(g.add_module(&templates[0]), "t0_2");
    assert_eq!(g.module("t0").unwrap().global_id, "t0");
    assert_eq!(g.module("t0_2").unwrap().global_id, "t0");
    assert!(g.sensor("t0_1").is_some());
}

#[test]
fn test_add_module_with_id_rejects_collisions() {
    let templates = generic_templates();
    let mut g = Graph::new();
    g.add_sensor(generic_sensor(0)).unwrap();

    let err = g.add_module_with_id("s0", &templates[0]).unwrap_err();
    assert!(matches!(err, GraphError::Duplicate(_)));
    assert_eq!(g.module_count(), 0);
}

// ==================== Rebuilding through a repository ====================

#[test]
fn test_from_format_resolves_global_ids() {
    let mut repo = MockRepo::new();
    repo.expect_lookup_module()
        .times(2)
        .returning(|id: &str| match id {
            "t0" => Some(
                TemplateBuilder::new("t0")
                    .param("p0")
                    .ret("r0")
                    .domain("d0.com")
                    .build(),
            ),
            _ => None,
        });

    let format = GraphFormat {
        module_ids: vec![
            ModuleFormat {
                local: "a".to_string(),
                global: "t0".to_string(),
                params: vec!["stale".to_string()],
                returns: vec![],
            },
            ModuleFormat {
                local: "b".to_string(),
                global: "gone".to_string(),
                params: vec!["p9".to_string()],
                returns: vec!["r9".to_string()],
            },
        ],
        ..Default::default()
    };

    let g = Graph::from_format(&format, &repo).unwrap();
    // Catalog declaration wins over the stored one
    let a = g.module("a").unwrap();
    assert_eq!(a.params, vec!["p0"]);
    assert_eq!(a.network, vec!["d0.com"]);
    // Unknown templates fall back to the stored declaration
    let b = g.module("b").unwrap();
    assert_eq!(b.global_id, "gone");
    assert_eq!(b.params, vec!["p9"]);
    assert!(b.network.is_empty());
}

#[test]
fn test_from_format_surfaces_engine_errors() {
    let catalog = common::test_catalog();
    let mut format = GraphFormat::default();
    format.sensors.push(generic_sensor(0));
    format.module_ids.push(ModuleFormat {
        local: "t0".to_string(),
        global: "t0".to_string(),
        params: vec![],
        returns: vec![],
    });
    format.edges.data.push(DataEdge::new("s0", "r0", "t0", "p0"));
    format.edges.data.push(DataEdge::new("deleted", "r0", "t0", "p1"));
    format.edges.state.push(StateEdge::new("t0", "r0", "s0", "nope"));

    let err = Graph::from_format(&format, &catalog).unwrap_err();
    assert_eq!(
        err,
        GraphError::NotFound {
            kind: Missing::Entity,
            id: "deleted".to_string()
        }
    );

    let (g, skipped) = Graph::from_format_lenient(&format, &catalog);
    assert_eq!(skipped.len(), 2);
    assert!(matches!(skipped[1], GraphError::InvalidReference { .. }));
    assert_eq!(g.to_format().edges.data, vec![DataEdge::new("s0", "r0", "t0", "p0")]);
}

#[test]
fn test_load_format_replaces_contents() {
    let catalog = common::test_catalog();
    let (mut g, rx) = observed_graph();
    g.add_sensor(generic_sensor(1)).unwrap();
    drain(&rx);

    let mut format = GraphFormat::default();
    format.sensors.push(generic_sensor(2));
    g.load_format(&format, &catalog, homeflow::graph::LoadPolicy::Strict)
        .unwrap();

    assert!(g.sensor("s1").is_none());
    assert!(g.sensor("s2").is_some());
    assert_eq!(
        drain(&rx),
        vec![
            GraphEvent::SensorRemoved("s1".to_string()),
            GraphEvent::Reset,
            GraphEvent::SensorAdded("s2".to_string()),
        ]
    );
}

// ==================== Change notifications ====================

#[test]
fn test_reset_of_large_graph_delivers_every_event() {
    let (mut g, rx) = observed_graph();
    for i in 0..1100 {
        g.add_sensor(generic_sensor(i)).unwrap();
    }
    drain(&rx);

    g.reset();
    let events = drain(&rx);
    assert_eq!(events.len(), 1101);
    assert_eq!(events.last(), Some(&GraphEvent::Reset));
}

#[test]
fn test_events_follow_successful_mutations_only() {
    let templates = generic_templates();
    let (mut g, rx) = observed_graph();

    g.add_sensor(generic_sensor(0)).unwrap();
    let t = g.add_module(&templates[0]);
    let edge = DataEdge::new("s0", "r0", &t, "p0");
    g.add_data_edge(edge.clone()).unwrap();
    assert!(g.add_data_edge(edge.clone()).is_err());
    assert!(g.set_interval(&t, Some(-1.0)).is_err());
    g.set_interval(&t, Some(60.0)).unwrap();

    assert_eq!(
        drain(&rx),
        vec![
            GraphEvent::SensorAdded("s0".to_string()),
            GraphEvent::ModuleAdded {
                local_id: "t0".to_string(),
                global_id: "t0".to_string(),
            },
            GraphEvent::DataEdgeAdded(edge),
            GraphEvent::IntervalChanged {
                module_id: "t0".to_string(),
                duration: Some(60.0),
            },
        ]
    );
}
