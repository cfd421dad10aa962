//! Reading and writing the ring state file.

use std::path::Path;

use anyhow::{Context, Result, bail};
use orbit_ring::{HashAlgorithm, Ring, RingState};
use tracing::debug;

/// Load the ring kept at `path`, placing positions with `hash`.
pub fn load(path: &Path, hash: HashAlgorithm) -> Result<Ring<HashAlgorithm>> {
    if !path.exists() {
        bail!(
            "no ring state at {}; run `orbitctl init` first",
            path.display()
        );
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let state: RingState = serde_json::from_str(&content)
        .with_context(|| format!("malformed ring state in {}", path.display()))?;
    let ring = Ring::from_state_with_hasher(state, hash)
        .with_context(|| format!("invalid ring state in {}", path.display()))?;
    debug!(path = %path.display(), %ring, "loaded ring state");
    Ok(ring)
}

/// Write `ring` to `path`, replacing any previous state.
///
/// The new state is written to a sibling temp file first and renamed into
/// place, so readers never observe a half-written file.
pub fn save(path: &Path, ring: &Ring<HashAlgorithm>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(&ring.to_state())?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    debug!(path = %path.display(), %ring, "saved ring state");
    Ok(())
}
