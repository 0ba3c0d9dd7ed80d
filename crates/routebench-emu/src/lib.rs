//! Network emulation backend for routebench.
//!
//! Mirrors a core [`routebench_core::topology::Topology`] onto Linux
//! network namespaces: one namespace per node, one veth pair per link,
//! and `tc netem` loss applied to both directions of a link. Everything
//! is created through `ip`/`tc` and removed again on drop.

pub mod loss;
pub mod net;
pub mod netns;

pub mod test_util;
