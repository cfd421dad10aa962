//! Integration test: sharing a ring between threads.
//!
//! A ring does no locking of its own. Readers can share `&Ring` freely;
//! mutation alongside readers goes through an external lock.

use std::sync::{Arc, RwLock};
use std::thread;

use orbit_integration_tests::{owners, ring_with, test_keys};
use orbit_ring::Ring;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_ring_is_send_and_sync() {
    assert_send_sync::<Ring>();
}

#[test]
fn test_concurrent_readers_agree() {
    let ring = ring_with(100, &["server-1", "server-2", "server-3"]);
    let keys = test_keys(2000);
    let expected = owners(&ring, &keys);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                assert_eq!(owners(&ring, &keys), expected);
            });
        }
    });
}

#[test]
fn test_writer_behind_rwlock() {
    let shared = Arc::new(RwLock::new(ring_with(50, &["server-1", "server-2"])));
    let keys = test_keys(500);

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let keys = keys.clone();
            thread::spawn(move || {
                for key in &keys {
                    let ring = shared.read().unwrap();
                    let owner = ring.get(key).unwrap().unwrap();
                    assert!(ring.contains(owner));
                    let replicas = ring.get_n(key, 2).unwrap();
                    assert_eq!(replicas[0], owner);
                }
            })
        })
        .collect();

    for i in 3..8 {
        shared.write().unwrap().add(&format!("server-{i}")).unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }

    let ring = shared.read().unwrap();
    assert_eq!(ring.len(), 7);
    assert_eq!(ring.position_count(), 350);
}
