//! Stochastic link failure/repair process.
//!
//! Discrete-time approximation of an exponential failure/repair model:
//! every tick, each healthy link breaks with probability `1/MTTF` and
//! each broken link repairs with probability `1/MTTR`, independently of
//! all other links. This honors MTTF/MTTR in expectation at one-tick
//! granularity; it is not an exact continuous-time Markov chain.

use rand::rngs::StdRng;
use rand::RngExt as _;

use crate::error::ConfigError;
use crate::topology::{LinkId, Topology, REPAIRED_LOSS, SATURATED_LOSS};

/// A single link state change produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    Broke(LinkId),
    Repaired(LinkId),
}

impl LinkTransition {
    pub fn link(&self) -> LinkId {
        match *self {
            LinkTransition::Broke(id) | LinkTransition::Repaired(id) => id,
        }
    }

    /// The loss value the transition leaves on the link.
    pub fn loss_percent(&self) -> f64 {
        match self {
            LinkTransition::Broke(_) => SATURATED_LOSS,
            LinkTransition::Repaired(_) => REPAIRED_LOSS,
        }
    }
}

/// Per-tick failure/repair process with fixed MTTF/MTTR, both in ticks.
#[derive(Debug, Clone, Copy)]
pub struct FaultProcess {
    mttf_ticks: u64,
    mttr_ticks: u64,
    break_p: f64,
    repair_p: f64,
}

impl FaultProcess {
    /// A zero MTTF or MTTR would mean dividing by zero every tick, so it
    /// is rejected here, before the run starts.
    pub fn new(mttf_ticks: u64, mttr_ticks: u64) -> Result<Self, ConfigError> {
        if mttf_ticks == 0 {
            return Err(ConfigError::ZeroMttf);
        }
        if mttr_ticks == 0 {
            return Err(ConfigError::ZeroMttr);
        }
        Ok(Self {
            mttf_ticks,
            mttr_ticks,
            break_p: 1.0 / mttf_ticks as f64,
            repair_p: 1.0 / mttr_ticks as f64,
        })
    }

    pub fn mttf_ticks(&self) -> u64 {
        self.mttf_ticks
    }

    pub fn mttr_ticks(&self) -> u64 {
        self.mttr_ticks
    }

    /// Advance every link by one tick, mutating loss values in place.
    ///
    /// Links are evaluated independently and in index order; transitions
    /// are returned so the caller can mirror them onto the emulation
    /// platform and log them.
    pub fn tick(&self, topo: &mut Topology, rng: &mut StdRng) -> Vec<LinkTransition> {
        let mut transitions = Vec::new();
        for id in 0..topo.link_count() {
            if topo.is_broken(id) {
                if rng.random::<f64>() < self.repair_p {
                    topo.set_link_loss(id, REPAIRED_LOSS);
                    transitions.push(LinkTransition::Repaired(id));
                }
            } else if rng.random::<f64>() < self.break_p {
                topo.set_link_loss(id, SATURATED_LOSS);
                transitions.push(LinkTransition::Broke(id));
            }
        }
        transitions
    }
}
