//! Integration test: rings survive a trip through their persisted form.

use std::collections::HashSet;

use orbit_integration_tests::{ring_with, test_keys};
use orbit_ring::{Blake3, HashAlgorithm, Ring, RingState};

#[test]
fn test_json_round_trip_agrees_on_every_lookup() {
    let mut ring = ring_with(120, &["us-east-1:shard-1", "us-east-1:shard-2", "eu-west-1:shard-1"]);
    ring.add("ap-south-1:shard-9").unwrap();
    ring.remove("us-east-1:shard-2").unwrap();

    let json = serde_json::to_string(&RingState::from(&ring)).unwrap();
    let state: RingState = serde_json::from_str(&json).unwrap();
    let restored = Ring::from_state(state).unwrap();

    let original_nodes: HashSet<_> = ring.nodes().collect();
    let restored_nodes: HashSet<_> = restored.nodes().collect();
    assert_eq!(original_nodes, restored_nodes);
    assert_eq!(restored.len(), ring.len());
    assert_eq!(restored.replicas(), 120);

    for key in test_keys(2000) {
        assert_eq!(restored.get(&key).unwrap(), ring.get(&key).unwrap());
        assert_eq!(restored.get_n(&key, 3).unwrap(), ring.get_n(&key, 3).unwrap());
    }
}

#[test]
fn test_state_shape() {
    let ring = ring_with(7, &["b", "a"]);
    let value = serde_json::to_value(ring.to_state()).unwrap();
    assert_eq!(value, serde_json::json!({ "nodes": ["a", "b"], "replicas": 7 }));
}

#[test]
fn test_node_order_in_state_does_not_matter() {
    let forward = RingState {
        nodes: vec!["n1".into(), "n2".into(), "n3".into()],
        replicas: 50,
    };
    let reversed = RingState {
        nodes: forward.nodes.iter().rev().cloned().collect(),
        replicas: 50,
    };

    let a = Ring::from_state(forward).unwrap();
    let b = Ring::from_state(reversed).unwrap();
    for key in test_keys(1000) {
        assert_eq!(a.get(&key).unwrap(), b.get(&key).unwrap());
    }
}

#[test]
fn test_empty_ring_round_trip() {
    let ring = Ring::new(32).unwrap();
    let restored = Ring::from_state(ring.to_state()).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.replicas(), 32);
    assert_eq!(restored.get("anything").unwrap(), None);
}

#[test]
fn test_round_trip_with_runtime_selected_hasher() {
    let mut ring = Ring::with_hasher(40, HashAlgorithm::Blake3).unwrap();
    for node in ["x", "y", "z"] {
        ring.add(node).unwrap();
    }

    let restored = Ring::from_state_with_hasher(ring.to_state(), HashAlgorithm::Blake3).unwrap();
    let direct = Ring::from_state_with_hasher(ring.to_state(), Blake3).unwrap();
    for key in test_keys(500) {
        let expected = ring.get(&key).unwrap();
        assert_eq!(restored.get(&key).unwrap(), expected);
        assert_eq!(direct.get(&key).unwrap(), expected);
    }
}
