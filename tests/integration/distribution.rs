//! Integration test: key distribution and replica selection.

use std::collections::HashSet;

use orbit_integration_tests::{load_per_node, ring_with, servers, test_keys};
use orbit_ring::{Blake3, DEFAULT_REPLICAS, Ring};

/// 3 equal nodes, 3000 keys: each node gets 1000 ± 20%.
#[test]
fn test_three_nodes_share_keys_evenly() {
    let ring = ring_with(DEFAULT_REPLICAS, &["server-1", "server-2", "server-3"]);
    assert_eq!(ring.position_count(), 450);

    let counts = load_per_node(&ring, &test_keys(3000));
    assert_eq!(counts.len(), 3);
    for (node, count) in &counts {
        assert!(
            (800..=1200).contains(count),
            "{node} received {count} of 3000 keys"
        );
    }
    assert_eq!(counts.values().sum::<usize>(), 3000);
}

/// Every node on a 100-node ring receives a share of 10k keys.
#[test]
fn test_large_ring_routes_to_every_node() {
    let names = servers(100);
    let nodes: Vec<&str> = names.iter().map(String::as_str).collect();
    let ring = ring_with(DEFAULT_REPLICAS, &nodes);
    assert_eq!(ring.position_count(), 15_000);

    let counts = load_per_node(&ring, &test_keys(10_000));
    assert_eq!(counts.len(), 100);
    let min = counts.values().min().copied().unwrap_or_default();
    let max = counts.values().max().copied().unwrap_or_default();
    assert!(min >= 40, "least loaded node got {min} keys");
    assert!(max <= 180, "most loaded node got {max} keys");
}

/// Ownership shares track the observed key distribution.
#[test]
fn test_ownership_matches_observed_load() {
    let ring = ring_with(DEFAULT_REPLICAS, &["server-1", "server-2", "server-3"]);
    let shares = ring.ownership();
    let counts = load_per_node(&ring, &test_keys(3000));

    for (node, share) in shares {
        let observed = counts[node] as f64 / 3000.0;
        assert!(
            (share - observed).abs() < 0.05,
            "{node}: owns {share:.3} of the ring but got {observed:.3} of keys"
        );
    }
}

#[test]
fn test_get_n_returns_distinct_nodes_for_every_key() {
    let ring = ring_with(DEFAULT_REPLICAS, &["a", "b", "c", "d", "e"]);

    for key in test_keys(500) {
        for count in [1, 2, 3, 5, 8] {
            let owners = ring.get_n(&key, count).unwrap();
            let unique: HashSet<_> = owners.iter().collect();
            assert_eq!(unique.len(), owners.len(), "duplicate owner for {key}");
            assert_eq!(owners.len(), count.min(ring.len()));
            assert_eq!(owners[0], ring.get(&key).unwrap().unwrap());
        }
        assert!(ring.get_n(&key, 0).unwrap().is_empty());
    }
}

#[test]
fn test_lookups_are_deterministic_across_instances() {
    let first = ring_with(64, &["server-1", "server-2", "server-3"]);
    let second = ring_with(64, &["server-3", "server-1", "server-2"]);

    for key in test_keys(1000) {
        assert_eq!(first.get(&key).unwrap(), second.get(&key).unwrap());
        assert_eq!(first.get(&key).unwrap(), first.get(&key).unwrap());
        assert_eq!(
            first.get_n(&key, 3).unwrap(),
            second.get_n(&key, 3).unwrap()
        );
    }
}

#[test]
fn test_alternate_hasher_is_pluggable() {
    let mut ring = Ring::with_hasher(DEFAULT_REPLICAS, Blake3).unwrap();
    for node in ["server-1", "server-2", "server-3"] {
        ring.add(node).unwrap();
    }

    let counts = load_per_node(&ring, &test_keys(3000));
    assert_eq!(counts.len(), 3, "every node should own some keys");
    for key in test_keys(100) {
        assert_eq!(
            ring.get_n(&key, 1).unwrap()[0],
            ring.get(&key).unwrap().unwrap()
        );
    }
}
