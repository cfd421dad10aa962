//! Consistent hashing ring for routing string keys to named nodes.
//!
//! Each physical node is placed on a 32-bit ring at `replicas` positions
//! (virtual nodes), each the hash of `"<node>:<i>"`. A key is routed to the
//! owner of the first position at or after the key's own hash, wrapping
//! around past the top of the ring. Adding or removing a node only moves
//! the keys adjacent to that node's positions, roughly `1/N` of the keyspace.
//!
//! The crate provides:
//!
//! - [`Ring`]: membership, lookup ([`Ring::get`]) and replica selection
//!   ([`Ring::get_n`]).
//! - [`RingHasher`]: the injected hash strategy, with [`Murmur3`] (default)
//!   and [`Blake3`] implementations.
//! - [`RingState`]: the `(nodes, replicas)` form used to persist or transmit
//!   a ring.
//!
//! A ring does no internal locking. Share it behind a lock (or confine it to
//! one owner) when it must be mutated while other threads read it.

mod error;
pub mod hash;
mod ring;
mod state;

pub use error::{IdentifierKind, RingError};
pub use hash::{Blake3, HashAlgorithm, Murmur3, RingHasher};
pub use ring::{DEFAULT_REPLICAS, MAX_IDENTIFIER_LEN, Reassignment, Ring};
pub use state::RingState;
