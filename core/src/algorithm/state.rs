//! Search-local scratch state
//!
//! Every search allocates its own `SearchState` instead of writing visited
//! flags, tentative costs and predecessor links onto the shared nodes. A
//! repeated or concurrent query can therefore never observe stale state left
//! behind by an earlier run.

use crate::algorithm::traits::{LinkId, NodeId};
use crate::data_structures::graph::{Capacity, Cost, FlowNetwork};

/// Per-node scratch fields for one search
#[derive(Debug, Clone)]
pub struct SearchState {
    visited: Vec<bool>,
    cost: Vec<Cost>,
    predecessor: Vec<Option<LinkId>>,
}

impl SearchState {
    /// Fresh state for a network of `node_count` nodes
    pub fn new(node_count: usize) -> Self {
        Self {
            visited: vec![false; node_count],
            cost: vec![0; node_count],
            predecessor: vec![None; node_count],
        }
    }

    /// Clears visited flags and predecessors; costs return to zero
    pub fn reset(&mut self) {
        self.visited.fill(false);
        self.cost.fill(0);
        self.predecessor.fill(None);
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    #[inline]
    pub fn is_visited(&self, node: NodeId) -> bool {
        self.visited[node.0]
    }

    #[inline]
    pub fn visit(&mut self, node: NodeId) {
        self.visited[node.0] = true;
    }

    #[inline]
    pub fn cost(&self, node: NodeId) -> Cost {
        self.cost[node.0]
    }

    #[inline]
    pub fn set_cost(&mut self, node: NodeId, cost: Cost) {
        self.cost[node.0] = cost;
    }

    #[inline]
    pub fn predecessor(&self, node: NodeId) -> Option<LinkId> {
        self.predecessor[node.0]
    }

    #[inline]
    pub fn set_predecessor(&mut self, node: NodeId, link: Option<LinkId>) {
        self.predecessor[node.0] = link;
    }

    /// Links on the predecessor chain ending at `target`, target-first
    ///
    /// The walk stops at the first node without a predecessor (a source)
    /// and never takes more steps than there are nodes.
    pub fn path_to(&self, network: &FlowNetwork, target: NodeId) -> Vec<LinkId> {
        let mut path = Vec::new();
        let mut current = target;
        while let Some(link) = self.predecessor(current) {
            path.push(link);
            if path.len() > self.len() {
                break;
            }
            current = network.link(link).origin();
        }
        path
    }
}

/// Minimum capacity among `links`; `Capacity::MAX` for an empty list
pub fn bottleneck(network: &FlowNetwork, links: &[LinkId]) -> Capacity {
    links
        .iter()
        .map(|&link| network.link(link).capacity())
        .min()
        .unwrap_or(Capacity::MAX)
}
