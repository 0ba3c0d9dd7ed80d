//! Error taxonomy for experiment setup and sampling.

use thiserror::Error;

/// Invalid experiment configuration.
///
/// Raised before any ticks run; aborts the affected sweep iteration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("link endpoint {0:?} is not a declared node")]
    UnknownNode(String),
    #[error("link connects node {0:?} to itself")]
    SelfLink(String),
    #[error("MTTF must be at least one tick")]
    ZeroMttf,
    #[error("MTTR must be at least one tick")]
    ZeroMttr,
    #[error("unknown protocol {0:?}")]
    UnknownProtocol(String),
    #[error("invalid experiment file: {0}")]
    Invalid(String),
}

/// More distinct flows were requested than the node set can provide.
#[derive(Debug, Error)]
#[error("cannot sample {requested} distinct flows from {nodes} nodes (at most {max})")]
pub struct InsufficientNodesError {
    pub requested: usize,
    pub nodes: usize,
    pub max: usize,
}
