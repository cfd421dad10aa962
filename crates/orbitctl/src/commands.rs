//! Subcommand implementations.
//!
//! Each command returns the text to print. Apart from `init`, which creates
//! the state file, commands work on an in-memory ring and leave loading and
//! saving to the caller.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Result, bail};
use orbit_ring::{HashAlgorithm, Ring, RingHasher};
use tracing::info;

use crate::store;

/// A membership change to try out with [`simulate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Add a node that is not yet on the ring.
    Add(String),
    /// Remove a node that is on the ring.
    Remove(String),
}

/// `orbitctl init`
///
/// Writes an empty ring to `path`. An existing file is only replaced when
/// `force` is set.
pub fn init(path: &Path, replicas: u32, hash: HashAlgorithm, force: bool) -> Result<String> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let ring = Ring::with_hasher(replicas, hash)?;
    store::save(path, &ring)?;
    info!(path = %path.display(), replicas, "initialised ring");
    Ok(format!(
        "initialised {} with {replicas} replicas per node\n",
        path.display()
    ))
}

/// `orbitctl add`
pub fn add<H: RingHasher>(ring: &mut Ring<H>, nodes: &[String]) -> Result<String> {
    let mut out = String::new();
    for node in nodes {
        if ring.contains(node) {
            writeln!(out, "{node}: already present")?;
            continue;
        }
        ring.add(node)?;
        info!(node = %node, "node added");
        writeln!(out, "{node}: added")?;
    }
    Ok(out)
}

/// `orbitctl remove`
///
/// Every node is handed to [`Ring::remove`], members or not, so positions a
/// colliding node took over are cleared as well.
pub fn remove<H: RingHasher>(ring: &mut Ring<H>, nodes: &[String]) -> Result<String> {
    let mut out = String::new();
    for node in nodes {
        let present = ring.contains(node);
        ring.remove(node)?;
        if present {
            info!(node = %node, "node removed");
            writeln!(out, "{node}: removed")?;
        } else {
            writeln!(out, "{node}: not present")?;
        }
    }
    Ok(out)
}

/// `orbitctl get`
pub fn get<H: RingHasher>(ring: &Ring<H>, key: &str) -> Result<String> {
    Ok(match ring.get(key)? {
        Some(node) => format!("{node}\n"),
        None => "(ring is empty)\n".to_string(),
    })
}

/// `orbitctl get-n`
pub fn get_n<H: RingHasher>(ring: &Ring<H>, key: &str, count: usize) -> Result<String> {
    let owners = ring.get_n(key, count)?;
    if owners.is_empty() {
        return Ok("(no nodes)\n".to_string());
    }
    let mut out = String::new();
    for (rank, node) in owners.iter().enumerate() {
        writeln!(out, "{}. {node}", rank + 1)?;
    }
    Ok(out)
}

/// `orbitctl status`
pub fn status<H: RingHasher>(ring: &Ring<H>) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "{ring}")?;
    for (node, share) in ring.ownership() {
        writeln!(out, "  {node:<24} {:>6.2}%", share * 100.0)?;
    }
    Ok(out)
}

/// `orbitctl simulate`
///
/// Routes `keys` synthetic keys through the ring before and after `change`
/// and reports how many would move, and where to.
pub fn simulate<H>(ring: &Ring<H>, change: &Change, keys: usize) -> Result<String>
where
    H: RingHasher + Clone,
{
    let mut after = ring.clone();
    match change {
        Change::Add(node) => after.add(node)?,
        Change::Remove(node) => after.remove(node)?,
    }

    let keys: Vec<String> = (0..keys).map(|i| format!("key-{i}")).collect();
    let moves = Ring::diff(ring, &after, keys.iter().map(String::as_str), 1)?;

    let mut flows: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for m in &moves {
        *flows.entry((m.from.as_str(), m.to.as_str())).or_default() += 1;
    }

    let mut out = String::new();
    let pct = if keys.is_empty() {
        0.0
    } else {
        moves.len() as f64 * 100.0 / keys.len() as f64
    };
    writeln!(out, "{} of {} keys move ({pct:.1}%)", moves.len(), keys.len())?;
    for ((from, to), count) in flows {
        writeln!(out, "  {from} -> {to}: {count}")?;
    }
    Ok(out)
}
