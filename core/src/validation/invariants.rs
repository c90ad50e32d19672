//! Flow-state invariant checks
//!
//! Used by the test suites and available to callers that want to audit a
//! network after a query. Each check returns the first violation found.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{FlowError, LinkId, NodeId};
use crate::data_structures::graph::{Capacity, Flow, FlowNetwork};
use crate::data_structures::rail::RailNetwork;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Link {link} carries {flow} over capacity {capacity}")]
    CapacityExceeded { link: LinkId, flow: Flow, capacity: Capacity },

    #[error("Node {node} receives {inflow} but sends {outflow}")]
    FlowImbalance { node: NodeId, inflow: u128, outflow: u128 },

    #[error("Residual capacity of {link} is {actual}, expected {expected}")]
    ResidualDesync { link: LinkId, actual: Capacity, expected: Capacity },

    #[error(transparent)]
    Query(#[from] FlowError),
}

/// `0 <= flow <= capacity` on every link
pub fn capacity_respected(network: &FlowNetwork) -> Result<(), InvariantViolation> {
    for (link, data) in network.links() {
        if data.flow() > data.capacity() {
            return Err(InvariantViolation::CapacityExceeded {
                link,
                flow: data.flow(),
                capacity: data.capacity(),
            });
        }
    }
    Ok(())
}

/// Inflow equals outflow at every node other than `sources` and `target`
///
/// Sums are taken in 128 bits so maximal capacities cannot wrap.
pub fn flow_conserved(network: &FlowNetwork, sources: &[NodeId], target: NodeId) -> Result<(), InvariantViolation> {
    for (node, data) in network.nodes() {
        if node == target || sources.contains(&node) {
            continue;
        }
        let inflow: u128 = data.incoming().iter().map(|&l| u128::from(network.link(l).flow())).sum();
        let outflow: u128 = data.outgoing().iter().map(|&l| u128::from(network.link(l).flow())).sum();
        if inflow != outflow {
            return Err(InvariantViolation::FlowImbalance { node, inflow, outflow });
        }
    }
    Ok(())
}

/// Every residual capacity matches the regular flow state it mirrors
pub fn residual_in_sync(network: &RailNetwork) -> Result<(), InvariantViolation> {
    let regular = network.regular();
    for (link, data) in regular.links() {
        let counterpart = data.corresponding().ok_or(FlowError::UnpairedLink(link))?;
        let expected = data.spare_capacity().saturating_add(regular.link(data.reverse()).flow());
        let actual = network.residual().link(counterpart).capacity();
        if actual != expected {
            return Err(InvariantViolation::ResidualDesync {
                link: counterpart,
                actual,
                expected,
            });
        }
    }
    Ok(())
}

/// Source side of a cut and the active regular links crossing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinCut {
    pub reachable: Vec<NodeId>,
    pub links: Vec<LinkId>,
    pub capacity: Capacity,
}

/// Cut induced by residual reachability from `sources`
///
/// After a maximum-flow run its capacity equals the flow value. The
/// capacity saturates at `Capacity::MAX`.
pub fn min_cut(network: &RailNetwork, sources: &[NodeId]) -> MinCut {
    let residual = network.residual();
    let mut reached = vec![false; residual.node_count()];
    let mut queue: VecDeque<NodeId> = VecDeque::new();

    for &source in sources {
        if !reached[source.0] {
            reached[source.0] = true;
            queue.push_back(source);
        }
    }
    while let Some(current) = queue.pop_front() {
        for &link in residual.node(current).outgoing() {
            let data = residual.link(link);
            let next = data.destination();
            if data.admits_flow() && !reached[next.0] {
                reached[next.0] = true;
                queue.push_back(next);
            }
        }
    }

    let regular = network.regular();
    let links: Vec<LinkId> = regular
        .links()
        .filter(|(_, data)| {
            data.is_active() && reached[data.origin().0] && !reached[data.destination().0]
        })
        .map(|(id, _)| id)
        .collect();
    let capacity = links
        .iter()
        .fold(0 as Capacity, |total, &l| total.saturating_add(regular.link(l).capacity()));

    MinCut {
        reachable: (0..reached.len()).filter(|&i| reached[i]).map(NodeId).collect(),
        links,
        capacity,
    }
}
