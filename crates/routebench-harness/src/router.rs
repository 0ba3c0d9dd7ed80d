//! Routing daemon collaborators: config payload generation.
//!
//! Each node receives a JSON payload naming its sync group, its own
//! identity, and its neighbor links by address and neighbor name. The
//! payload is written to `<work_dir>/<node>/cfg-<node>.json` and the
//! protocol's daemon binary is launched pointed at that file. The
//! daemon's internal protocol state is never interpreted, only its
//! liveness.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// One neighbor entry in a router payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NeighborLink {
    /// This node's address on the shared link.
    pub local: String,
    /// The neighbor's address on the shared link.
    pub peer: String,
    /// The neighbor's node name.
    pub peer_name: String,
}

/// Configuration payload handed to a routing daemon.
#[derive(Debug, Clone, Serialize)]
pub struct RouterConfig {
    /// Protocol sync group, e.g. `/dv/sync`.
    pub sync: String,
    /// This node's identity.
    pub name: String,
    pub links: Vec<NeighborLink>,
}

/// Write the payload for one node and return the config path.
pub fn write_router_config(work_dir: &Path, cfg: &RouterConfig) -> Result<PathBuf> {
    let dir = work_dir.join(&cfg.name);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let path = dir.join(format!("cfg-{}.json", cfg.name));
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Log file for a node's routing daemon.
pub fn router_log_path(work_dir: &Path, node: &str) -> PathBuf {
    work_dir.join(node).join("log").join("router.log")
}
