//! Hash strategies that place virtual nodes and keys on the ring.
//!
//! The ring only needs a deterministic `&str -> u32` function. Anything that
//! implements [`RingHasher`] can be injected at construction, including plain
//! closures, which makes it easy to pin positions in tests.
//!
//! Every process that shares a ring must use the same strategy: positions are
//! never transmitted, only recomputed.

use serde::{Deserialize, Serialize};

/// A deterministic 32-bit hash of a string.
pub trait RingHasher: Send + Sync {
    /// Map `input` to a position on the `[0, 2^32)` ring.
    fn hash(&self, input: &str) -> u32;
}

impl<F> RingHasher for F
where
    F: Fn(&str) -> u32 + Send + Sync,
{
    fn hash(&self, input: &str) -> u32 {
        self(input)
    }
}

/// MurmurHash3, x86 32-bit variant, seed 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Murmur3;

impl RingHasher for Murmur3 {
    fn hash(&self, input: &str) -> u32 {
        murmur3::murmur3_32(&mut input.as_bytes(), 0).expect("reading from a slice cannot fail")
    }
}

/// The first four bytes of a BLAKE3 digest, little-endian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3;

impl RingHasher for Blake3 {
    fn hash(&self, input: &str) -> u32 {
        let digest = blake3::hash(input.as_bytes());
        let bytes = digest.as_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// A hash strategy chosen at runtime, e.g. from a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// See [`Murmur3`].
    #[default]
    Murmur3,
    /// See [`Blake3`].
    Blake3,
}

impl RingHasher for HashAlgorithm {
    fn hash(&self, input: &str) -> u32 {
        match self {
            HashAlgorithm::Murmur3 => Murmur3.hash(input),
            HashAlgorithm::Blake3 => Blake3.hash(input),
        }
    }
}
