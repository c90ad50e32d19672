//! Core trait and identifier definitions for the railflow engine
//!
//! This module establishes the typed indices that address the node and link
//! arenas, the error type shared by every flow solver, and the small trait
//! through which solvers describe themselves and report execution metrics.
//!
//! # Key Design Principles
//! - Indices instead of references: a link never borrows its endpoints
//! - One error enum for every query-time failure
//! - Metrics are accumulated per solver instance

use std::fmt::{self, Debug, Display};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Node identifier into a `FlowNetwork` node arena
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Link identifier into a `FlowNetwork` link arena
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LinkId(pub usize);

impl LinkId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// Errors raised by flow queries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Unknown station: {0}")]
    UnknownStation(String),

    #[error("No rail connects {0} to {1}")]
    UnknownLink(String, String),

    #[error("No link with id {0}")]
    InvalidLink(LinkId),

    #[error("Link {0} has no counterpart in the paired network")]
    UnpairedLink(LinkId),

    #[error("Flow on link {0} would leave [0, capacity]")]
    CapacityViolation(LinkId),

    #[error("Negative cycle trace did not close at node {0}")]
    BrokenCycleTrace(NodeId),

    #[error("Total flow does not fit in 64 bits")]
    FlowOverflow,

    #[error("Total cost does not fit in 64 bits")]
    CostOverflow,
}

/// Execution counters accumulated by a solver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowMetrics {
    /// Breadth-first searches run over the residual network
    pub searches: usize,
    /// Augmenting paths pushed
    pub augmentations: usize,
    /// Negative cycles cancelled
    pub cancelled_cycles: usize,
    /// Wall time spent inside top-level queries
    pub execution_time: Duration,
}

impl FlowMetrics {
    /// Folds another solver's counters into this one
    pub fn absorb(&mut self, other: &FlowMetrics) {
        self.searches += other.searches;
        self.augmentations += other.augmentations;
        self.cancelled_cycles += other.cancelled_cycles;
        self.execution_time += other.execution_time;
    }
}

/// Descriptive interface implemented by every flow solver
pub trait FlowAlgorithm: Debug + Send + Sync {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category (e.g., max_flow, min_cost_flow)
    fn category(&self) -> &'static str;

    /// Returns a one-line description with the complexity bound
    fn description(&self) -> &'static str;

    /// Returns the counters accumulated since construction
    fn metrics(&self) -> &FlowMetrics;
}

/// Wall-clock profiler scoped to one top-level query
#[derive(Debug)]
pub struct FlowProfiler {
    start_time: Instant,
}

impl FlowProfiler {
    pub fn start() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Stops the clock and records the elapsed time into `metrics`
    pub fn stop(self, metrics: &mut FlowMetrics) {
        metrics.execution_time += self.start_time.elapsed();
    }
}
