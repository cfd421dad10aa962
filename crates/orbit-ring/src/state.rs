//! Persisted form of a ring.

use serde::{Deserialize, Serialize};

/// The transmittable representation of a [`Ring`](crate::Ring).
///
/// Only membership and the replica count are captured. Positions are
/// recomputed from these on load, so two processes reconstructing the same
/// state with the same hash strategy agree on every lookup.
///
/// ```json
/// { "nodes": ["cache-a", "cache-b"], "replicas": 150 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingState {
    /// Physical node identifiers. Order carries no meaning.
    pub nodes: Vec<String>,
    /// Virtual nodes per physical node.
    pub replicas: u32,
}
