//! Error types for ring operations.

use std::fmt;

/// Which class of caller input failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// A physical node identifier passed to `add` or `remove`.
    Node,
    /// A routing key passed to `get` or `get_n`.
    Key,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Node => f.write_str("Node identifier"),
            IdentifierKind::Key => f.write_str("Key"),
        }
    }
}

/// Errors returned by [`Ring`](crate::Ring) operations.
///
/// All variants are deterministic caller-input errors: retrying with the
/// same input fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// A node identifier or key was the empty string.
    #[error("{0} must not be empty")]
    EmptyIdentifier(IdentifierKind),

    /// A node identifier or key was longer than the allowed maximum.
    #[error("{kind} is too long: {len} characters (max {max})")]
    IdentifierTooLong {
        /// Which input was rejected.
        kind: IdentifierKind,
        /// Length of the rejected input, in characters.
        len: usize,
        /// The maximum accepted length.
        max: usize,
    },

    /// The ring was configured with zero virtual nodes per physical node.
    #[error("replica count must be at least 1")]
    ZeroReplicas,
}
