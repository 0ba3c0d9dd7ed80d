//! Fault-injection and connectivity-evaluation engine.
//!
//! Drives repeatable routing-resilience experiments over a network
//! topology: a seeded stochastic process breaks and repairs links, a
//! reachability check decides which monitored flows still work, and the
//! sweep driver aggregates per-tick observations into one JSON summary
//! per (seed, MTTF) combination.
//!
//! The emulation platform, routing daemons, and ping probes are external
//! collaborators consumed behind the [`platform::Platform`] seam; pure
//! in-process simulation needs none of them.

pub mod error;
pub mod fault;
pub mod flows;
pub mod observe;
pub mod platform;
pub mod reach;
pub mod stats;
pub mod sweep;
pub mod topology;
