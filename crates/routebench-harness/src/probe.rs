//! Ping collaborators: per-node servers and per-flow probes.
//!
//! A server per node answers on `/<node>`; a probe per flow pings
//! `/<target>/ping` from its source node and appends one `.` or `x` per
//! attempt to the flow's log (its redirected stdout). Only the
//! aggregate symbol counts are ever read back.

use std::path::{Path, PathBuf};

/// Ping prefix served by a node's ping server.
pub fn server_prefix(node: &str) -> String {
    format!("/{node}")
}

/// Ping prefix a probe targets for one flow.
pub fn probe_prefix(target: &str) -> String {
    format!("/{target}/ping")
}

/// Log file a probe appends its outcome symbols to.
pub fn probe_log_path(work_dir: &Path, source: &str, target: &str) -> PathBuf {
    work_dir
        .join(source)
        .join("log")
        .join(format!("ping-{target}.log"))
}

/// Log file for a node's ping server.
pub fn server_log_path(work_dir: &Path, node: &str) -> PathBuf {
    work_dir.join(node).join("log").join("pingserver.log")
}
