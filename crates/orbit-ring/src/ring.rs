//! Consistent hashing ring implementation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{IdentifierKind, RingError};
use crate::hash::{Murmur3, RingHasher};
use crate::state::RingState;

/// Virtual nodes per physical node when none is configured.
pub const DEFAULT_REPLICAS: u32 = 150;

/// Longest accepted node identifier or key, in characters.
pub const MAX_IDENTIFIER_LEN: usize = 1000;

/// Number of points on the ring.
const RING_SPAN: u64 = 1 << 32;

/// A key whose placement differs between two ring states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// The key that moved.
    pub key: String,
    /// A node that held the key before the change and no longer does.
    pub from: String,
    /// A node that holds the key after the change and did not before.
    pub to: String,
}

/// Consistent hashing ring mapping string keys to physical nodes.
///
/// Every physical node owns `replicas` positions on a `u32` ring, one per
/// virtual node key `"<node>:<i>"`. Lookups walk clockwise from the key's
/// position to the first virtual node. Replica selection keeps walking until
/// enough distinct physical nodes are found.
///
/// Two distinct virtual nodes hashing to the same position is resolved by
/// last write wins: the later `add` takes the position over.
#[derive(Clone)]
pub struct Ring<H = Murmur3> {
    /// Ring position -> physical node that owns it.
    entries: HashMap<u32, Arc<str>>,
    /// The distinct positions of `entries`, ascending.
    index: Vec<u32>,
    /// Physical node -> number of positions it currently owns.
    members: HashMap<Arc<str>, u32>,
    /// Virtual nodes per physical node.
    replicas: u32,
    hasher: H,
}

impl Ring<Murmur3> {
    /// Create an empty ring hashing with [`Murmur3`].
    pub fn new(replicas: u32) -> Result<Self, RingError> {
        Self::with_hasher(replicas, Murmur3)
    }

    /// Rebuild a ring from its persisted form, hashing with [`Murmur3`].
    pub fn from_state(state: RingState) -> Result<Self, RingError> {
        Self::from_state_with_hasher(state, Murmur3)
    }
}

impl Default for Ring<Murmur3> {
    /// An empty ring with [`DEFAULT_REPLICAS`] virtual nodes per node.
    fn default() -> Self {
        Self::empty(DEFAULT_REPLICAS, Murmur3)
    }
}

impl<H: RingHasher> Ring<H> {
    /// Create an empty ring with an explicit hash strategy.
    ///
    /// A ring with zero virtual nodes per node could never route anything,
    /// so `replicas == 0` is rejected.
    pub fn with_hasher(replicas: u32, hasher: H) -> Result<Self, RingError> {
        if replicas == 0 {
            return Err(RingError::ZeroReplicas);
        }
        Ok(Self::empty(replicas, hasher))
    }

    /// Rebuild a ring from its persisted form.
    ///
    /// Nodes are added in the order they appear in `state.nodes`, which only
    /// matters for the (rare) positions claimed by more than one node.
    pub fn from_state_with_hasher(state: RingState, hasher: H) -> Result<Self, RingError> {
        let mut ring = Self::with_hasher(state.replicas, hasher)?;
        for node in &state.nodes {
            validate(node, IdentifierKind::Node)?;
            ring.insert_node(node);
        }
        ring.rebuild_index();
        debug!(
            nodes = ring.len(),
            positions = ring.position_count(),
            replicas = ring.replicas,
            "restored ring from state"
        );
        Ok(ring)
    }

    /// Add a physical node and all of its virtual nodes.
    ///
    /// Adding a node that is already present recomputes the same positions
    /// and leaves the ring unchanged.
    pub fn add(&mut self, node: &str) -> Result<(), RingError> {
        validate(node, IdentifierKind::Node)?;
        if self.insert_node(node) {
            self.rebuild_index();
        }
        debug!(
            node,
            replicas = self.replicas,
            positions = self.index.len(),
            "added node to ring"
        );
        Ok(())
    }

    /// Remove a physical node by deleting every position computed for it.
    ///
    /// A position is deleted whoever holds it, so a node that took over one
    /// of `node`'s positions through a hash collision loses that position
    /// too. Removing a node that is not on the ring is a no-op.
    pub fn remove(&mut self, node: &str) -> Result<(), RingError> {
        validate(node, IdentifierKind::Node)?;

        let mut changed = false;
        for i in 0..self.replicas {
            let position = self.hasher.hash(&vnode_key(node, i));
            if let Some(owner) = self.entries.remove(&position) {
                if &*owner != node {
                    warn!(
                        position,
                        node,
                        %owner,
                        "removing a position another node took over"
                    );
                }
                self.release(&owner);
                changed = true;
            }
        }

        if changed {
            self.rebuild_index();
            debug!(node, positions = self.index.len(), "removed node from ring");
        }
        Ok(())
    }

    /// Find the node responsible for `key`.
    ///
    /// Returns `Ok(None)` when the ring has no nodes.
    pub fn get(&self, key: &str) -> Result<Option<&str>, RingError> {
        validate(key, IdentifierKind::Key)?;
        let position = self.hasher.hash(key);
        let Some(start) = self.successor(position) else {
            return Ok(None);
        };
        let owner = self.owner_at(start);
        trace!(key, position, owner, "routed key");
        Ok(owner)
    }

    /// Find up to `count` distinct nodes for `key`, in clockwise order.
    ///
    /// The first element is always what [`get`](Self::get) returns. If the
    /// ring has fewer than `count` physical nodes, all of them are returned.
    /// A `count` of zero or an empty ring yields an empty list.
    pub fn get_n(&self, key: &str, count: usize) -> Result<Vec<&str>, RingError> {
        validate(key, IdentifierKind::Key)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let Some(start) = self.successor(self.hasher.hash(key)) else {
            return Ok(Vec::new());
        };

        let wanted = count.min(self.members.len());
        let mut owners = Vec::with_capacity(wanted);
        let mut seen = HashSet::with_capacity(wanted);

        // Walk from the start position to the end, then wrap to the beginning.
        let after = self.index[start..].iter();
        let before = self.index[..start].iter();
        for position in after.chain(before) {
            let Some(owner) = self.entries.get(position) else {
                continue;
            };
            if seen.insert(&**owner) {
                owners.push(&**owner);
                if owners.len() == wanted {
                    break;
                }
            }
        }

        Ok(owners)
    }

    /// Compare placements between two ring states.
    ///
    /// For every key, each node that gained the key in `new` is paired with a
    /// node that lost it, looking at the first `replication` owners. Keys
    /// whose owner sets are unchanged produce nothing.
    pub fn diff<'k, I>(
        old: &Self,
        new: &Self,
        keys: I,
        replication: usize,
    ) -> Result<Vec<Reassignment>, RingError>
    where
        I: IntoIterator<Item = &'k str>,
    {
        let mut reassignments = Vec::new();

        for key in keys {
            let old_owners = old.get_n(key, replication)?;
            let new_owners = new.get_n(key, replication)?;

            let lost = old_owners
                .iter()
                .copied()
                .filter(|n| !new_owners.contains(n));
            let gained = new_owners
                .iter()
                .copied()
                .filter(|n| !old_owners.contains(n));
            for (from, to) in lost.zip(gained) {
                reassignments.push(Reassignment {
                    key: key.to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }

        Ok(reassignments)
    }

    /// Fraction of the keyspace each node owns.
    ///
    /// A position owns the arc ending at it, starting just past the previous
    /// position. The first position's arc wraps around from the last one.
    /// Shares sum to 1.0 on a non-empty ring.
    pub fn ownership(&self) -> BTreeMap<&str, f64> {
        let Some(&last) = self.index.last() else {
            return BTreeMap::new();
        };

        let mut spans: BTreeMap<&str, u64> = BTreeMap::new();
        let mut previous = last;
        for &position in &self.index {
            let span = if self.index.len() == 1 {
                RING_SPAN
            } else {
                u64::from(position.wrapping_sub(previous))
            };
            if let Some(owner) = self.entries.get(&position) {
                *spans.entry(&**owner).or_default() += span;
            }
            previous = position;
        }

        spans
            .into_iter()
            .map(|(node, span)| (node, span as f64 / RING_SPAN as f64))
            .collect()
    }

    /// Snapshot membership for persistence or transmission.
    ///
    /// Nodes are sorted so the same ring always serializes the same way.
    pub fn to_state(&self) -> RingState {
        let mut nodes: Vec<String> = self.nodes().map(str::to_string).collect();
        nodes.sort_unstable();
        RingState {
            nodes,
            replicas: self.replicas,
        }
    }

    /// Write every virtual node of `node` into the entry map.
    ///
    /// Returns whether any position changed owner. Does not touch the index.
    fn insert_node(&mut self, node: &str) -> bool {
        let owner: Arc<str> = match self.members.get_key_value(node) {
            Some((existing, _)) => Arc::clone(existing),
            None => Arc::from(node),
        };

        let mut changed = false;
        for i in 0..self.replicas {
            let position = self.hasher.hash(&vnode_key(node, i));
            match self.entries.insert(position, Arc::clone(&owner)) {
                Some(previous) if previous == owner => {}
                Some(previous) => {
                    warn!(
                        position,
                        node,
                        %previous,
                        "ring position collision, new owner takes over"
                    );
                    self.release(&previous);
                    *self.members.entry(Arc::clone(&owner)).or_insert(0) += 1;
                    changed = true;
                }
                None => {
                    *self.members.entry(Arc::clone(&owner)).or_insert(0) += 1;
                    changed = true;
                }
            }
        }
        changed
    }
}

impl<H> Ring<H> {
    /// Empty ring; callers have already checked `replicas`.
    fn empty(replicas: u32, hasher: H) -> Self {
        Self {
            entries: HashMap::new(),
            index: Vec::new(),
            members: HashMap::new(),
            replicas,
            hasher,
        }
    }

    /// Number of distinct physical nodes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `node` currently owns at least one position.
    pub fn contains(&self, node: &str) -> bool {
        self.members.contains_key(node)
    }

    /// The physical nodes on the ring, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(|node| &**node)
    }

    /// Total number of distinct positions on the ring.
    pub fn position_count(&self) -> usize {
        self.index.len()
    }

    /// Virtual nodes per physical node.
    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    /// Index of the first position `>= position`, wrapping to 0 past the end.
    fn successor(&self, position: u32) -> Option<usize> {
        if self.index.is_empty() {
            return None;
        }
        let i = self.index.partition_point(|&p| p < position);
        Some(if i == self.index.len() { 0 } else { i })
    }

    fn owner_at(&self, i: usize) -> Option<&str> {
        self.entries.get(&self.index[i]).map(|owner| &**owner)
    }

    /// Drop one position from `node`'s count, forgetting it at zero.
    fn release(&mut self, node: &str) {
        if let Some(count) = self.members.get_mut(node) {
            *count -= 1;
            if *count == 0 {
                self.members.remove(node);
            }
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        self.index.extend(self.entries.keys().copied());
        self.index.sort_unstable();
    }
}

impl<H> fmt::Display for Ring<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ring: {} nodes, {} positions, {} replicas per node",
            self.len(),
            self.position_count(),
            self.replicas
        )
    }
}

impl<H> fmt::Debug for Ring<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("nodes", &self.len())
            .field("positions", &self.position_count())
            .field("replicas", &self.replicas)
            .finish()
    }
}

impl<H: RingHasher> From<&Ring<H>> for RingState {
    fn from(ring: &Ring<H>) -> Self {
        ring.to_state()
    }
}

impl TryFrom<RingState> for Ring<Murmur3> {
    type Error = RingError;

    fn try_from(state: RingState) -> Result<Self, Self::Error> {
        Ring::from_state(state)
    }
}

/// Key hashed to place virtual node `index` of `node`.
fn vnode_key(node: &str, index: u32) -> String {
    format!("{node}:{index}")
}

/// Reject empty or overlong identifiers. No trimming or normalization.
fn validate(input: &str, kind: IdentifierKind) -> Result<(), RingError> {
    if input.is_empty() {
        return Err(RingError::EmptyIdentifier(kind));
    }
    // Byte length bounds the character count from above.
    if input.len() > MAX_IDENTIFIER_LEN {
        let len = input.chars().count();
        if len > MAX_IDENTIFIER_LEN {
            return Err(RingError::IdentifierTooLong {
                kind,
                len,
                max: MAX_IDENTIFIER_LEN,
            });
        }
    }
    Ok(())
}
