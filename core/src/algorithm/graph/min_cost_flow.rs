//! Minimum-Cost Maximum Flow by Cycle Canceling
//!
//! Phase one saturates the network with Edmonds-Karp; its value is fixed
//! from then on. Phase two builds a disposable signed-cost residual network
//! from the regular flow state and cancels negative-cost cycles until none
//! remain. Pushing flow around a cycle leaves the net flow at every node
//! unchanged, so the maximum-flow value survives while its cost falls.
//!
//! Each cancellation lowers the total cost by at least one unit and the
//! cost is bounded below by zero, so the loop terminates.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::max_flow::MaxFlowSolver;
use crate::algorithm::state::{bottleneck, SearchState};
use crate::algorithm::traits::{FlowAlgorithm, FlowError, FlowMetrics, FlowProfiler, LinkId, NodeId};
use crate::data_structures::graph::{Capacity, Cost, Flow, FlowNetwork};
use crate::data_structures::rail::RailNetwork;

/// Outcome of a minimum-cost maximum-flow query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinCostFlowResult {
    /// Maximum flow value (identical to a plain max-flow run)
    pub flow: Flow,
    /// Sum of cost × flow over every regular link
    pub cost: Cost,
}

/// Signed-cost residual network derived from a regular network's flow
///
/// For every regular link `e` there is a *send* edge carrying `cost(e)`
/// with capacity `capacity(e) - flow(e)` and, as its reverse, an *undo*
/// edge carrying `-cost(e)` with capacity `flow(e)`. Both point back to `e`.
#[derive(Debug, Clone)]
pub struct AuxiliaryNetwork {
    network: FlowNetwork,
}

impl AuxiliaryNetwork {
    pub fn build(regular: &FlowNetwork) -> Self {
        let mut network = FlowNetwork::new();
        for (_, node) in regular.nodes() {
            network.add_node(node.id());
        }

        for (link_id, link) in regular.links() {
            let origin = regular.label(link.origin());
            let destination = regular.label(link.destination());
            let Some((send, undo)) =
                network.add_bidirectional_link(origin, destination, link.capacity(), link.service())
            else {
                continue;
            };

            let send_link = network.link_mut(send);
            send_link.capacity = link.spare_capacity();
            send_link.corresponding = Some(link_id);
            send_link.active = link.is_active();

            let undo_link = network.link_mut(undo);
            undo_link.cost = -link.cost();
            undo_link.capacity = link.flow();
            undo_link.corresponding = Some(link_id);
            undo_link.active = link.is_active();
        }

        Self { network }
    }

    pub fn network(&self) -> &FlowNetwork {
        &self.network
    }

    /// Finds one negative-cost cycle, returned as its links
    ///
    /// Bellman-Ford with every distance starting at zero, which reaches
    /// cycles anywhere in the network. If an edge still relaxes on pass
    /// |V|, predecessors are followed back from the relaxed node until a
    /// node repeats; that node lies on the cycle.
    pub fn find_negative_cycle(&self) -> Result<Option<Vec<LinkId>>, FlowError> {
        let node_count = self.network.node_count();
        if node_count == 0 {
            return Ok(None);
        }

        let mut state = SearchState::new(node_count);
        let mut relaxed = None;

        for _ in 0..node_count {
            relaxed = None;
            for (link_id, link) in self.network.links() {
                if !link.admits_flow() {
                    continue;
                }
                let candidate = state.cost(link.origin()) + link.cost();
                if candidate < state.cost(link.destination()) {
                    state.set_cost(link.destination(), candidate);
                    state.set_predecessor(link.destination(), Some(link_id));
                    relaxed = Some(link.destination());
                }
            }
            if relaxed.is_none() {
                return Ok(None);
            }
        }

        let Some(start) = relaxed else {
            return Ok(None);
        };
        self.trace_cycle(&state, start).map(Some)
    }

    fn trace_cycle(&self, state: &SearchState, start: NodeId) -> Result<Vec<LinkId>, FlowError> {
        let mut seen = vec![false; self.network.node_count()];
        let mut current = start;
        while !seen[current.0] {
            seen[current.0] = true;
            let link = state
                .predecessor(current)
                .ok_or(FlowError::BrokenCycleTrace(current))?;
            current = self.network.link(link).origin();
        }

        let anchor = current;
        let mut cycle = Vec::new();
        loop {
            let link = state
                .predecessor(current)
                .ok_or(FlowError::BrokenCycleTrace(current))?;
            cycle.push(link);
            current = self.network.link(link).origin();
            if current == anchor {
                break;
            }
            if cycle.len() > self.network.node_count() {
                return Err(FlowError::BrokenCycleTrace(anchor));
            }
        }
        cycle.reverse();
        Ok(cycle)
    }

    /// Pushes `amount` around `cycle`, mirroring it onto `regular`
    ///
    /// Undo edges (negative cost) take flow off their regular link; send
    /// edges add flow. Either way the traversed edge loses `amount` of
    /// residual capacity and its partner gains it.
    pub fn cancel(&mut self, cycle: &[LinkId], amount: Capacity, regular: &mut FlowNetwork) -> Result<(), FlowError> {
        for &link_id in cycle {
            let link = self.network.link(link_id);
            let partner = link.reverse();
            let refund = link.cost() < 0;
            let regular_id = link.corresponding().ok_or(FlowError::UnpairedLink(link_id))?;

            let regular_link = regular.link_mut(regular_id);
            let capacity = regular_link.capacity;
            let updated = if refund {
                regular_link.flow.checked_sub(amount)
            } else {
                regular_link.flow.checked_add(amount).filter(|&flow| flow <= capacity)
            };
            regular_link.flow = updated.ok_or(FlowError::CapacityViolation(regular_id))?;

            let traversed = self.network.link_mut(link_id);
            traversed.capacity = traversed
                .capacity
                .checked_sub(amount)
                .ok_or(FlowError::CapacityViolation(link_id))?;
            self.network.link_mut(partner).capacity += amount;
        }
        Ok(())
    }
}

/// Sum of cost × flow over every link of `network`
pub fn total_cost(network: &FlowNetwork) -> Result<Cost, FlowError> {
    network.links().try_fold(0 as Cost, |total, (_, link)| {
        Cost::try_from(link.flow())
            .ok()
            .and_then(|flow| link.cost().checked_mul(flow))
            .and_then(|cost| total.checked_add(cost))
            .ok_or(FlowError::CostOverflow)
    })
}

/// Cycle-canceling minimum-cost maximum-flow solver
#[derive(Debug, Clone, Default)]
pub struct MinCostFlowSolver {
    max_flow: MaxFlowSolver,
    metrics: FlowMetrics,
}

impl MinCostFlowSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cheapest maximum flow from `source` to `target`
    pub fn solve(
        &mut self,
        network: &mut RailNetwork,
        source: NodeId,
        target: NodeId,
    ) -> Result<MinCostFlowResult, FlowError> {
        let profiler = FlowProfiler::start();
        let flow = self.max_flow.solve(network, &[source], target)?;
        let initial_cost = total_cost(network.regular())?;

        let mut auxiliary = AuxiliaryNetwork::build(network.regular());
        while let Some(cycle) = auxiliary.find_negative_cycle()? {
            let amount = bottleneck(auxiliary.network(), &cycle);
            trace!("Cancelling negative cycle of {} links by {} units", cycle.len(), amount);
            auxiliary.cancel(&cycle, amount, network.regular_mut())?;
            self.metrics.cancelled_cycles += 1;
        }
        network.sync_residual()?;

        let cost = total_cost(network.regular())?;
        self.metrics.searches = self.max_flow.metrics().searches;
        self.metrics.augmentations = self.max_flow.metrics().augmentations;
        profiler.stop(&mut self.metrics);

        debug!(
            "Min-cost flow {} -> {}: flow {}, cost {} (from {}, {} cycles cancelled)",
            network.regular().label(source),
            network.regular().label(target),
            flow,
            cost,
            initial_cost,
            self.metrics.cancelled_cycles
        );
        Ok(MinCostFlowResult { flow, cost })
    }
}

impl FlowAlgorithm for MinCostFlowSolver {
    fn name(&self) -> &'static str {
        "Cycle Canceling"
    }

    fn category(&self) -> &'static str {
        "min_cost_flow"
    }

    fn description(&self) -> &'static str {
        "Edmonds-Karp maximum flow followed by Bellman-Ford negative cycle cancellation on the signed-cost residual network."
    }

    fn metrics(&self) -> &FlowMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::ServiceTier;

    fn network(rails: &[(&str, &str, u64, ServiceTier)]) -> RailNetwork {
        let mut network = RailNetwork::new();
        for &(from, to, capacity, service) in rails {
            network.add_station(from);
            network.add_station(to);
            network.add_rail(from, to, capacity, service).unwrap();
        }
        network
    }

    fn solve(network: &mut RailNetwork, source: &str, target: &str) -> MinCostFlowResult {
        let source = network.find_station(source).unwrap();
        let target = network.find_station(target).unwrap();
        MinCostFlowSolver::new().solve(network, source, target).unwrap()
    }

    #[test]
    fn test_cost_overflow_is_reported() {
        let mut network = network(&[("s", "t", u64::MAX, ServiceTier::Standard)]);
        let source = network.find_station("s").unwrap();
        let target = network.find_station("t").unwrap();

        assert_eq!(
            MinCostFlowSolver::new().solve(&mut network, source, target),
            Err(FlowError::CostOverflow)
        );
    }

    #[test]
    fn test_expensive_route_is_replaced() {
        use ServiceTier::*;
        // The express branch is declared first, so Edmonds-Karp routes
        // everything over it and cancellation must move it to the cheap one.
        let mut network = network(&[
            ("s", "b", 2, Express),
            ("b", "x", 2, Express),
            ("s", "a", 2, Standard),
            ("a", "x", 2, Standard),
            ("x", "t", 2, Standard),
        ]);

        let result = solve(&mut network, "s", "t");

        assert_eq!(result, MinCostFlowResult { flow: 2, cost: 12 });
        let express = network.find_rail("s", "b").unwrap();
        assert_eq!(network.regular().link(express).flow(), 0);
    }

    #[test]
    fn test_unique_flow_keeps_its_cost() {
        use ServiceTier::Standard;
        let mut network = network(&[
            ("A", "B", 5, Standard),
            ("A", "C", 3, Standard),
            ("B", "D", 2, Standard),
            ("C", "D", 4, Standard),
        ]);

        assert_eq!(solve(&mut network, "A", "D"), MinCostFlowResult { flow: 5, cost: 20 });
    }

    #[test]
    fn test_disconnected_query_costs_nothing() {
        let mut network = network(&[("A", "B", 5, ServiceTier::Premium)]);
        network.add_station("C");

        assert_eq!(solve(&mut network, "A", "C"), MinCostFlowResult { flow: 0, cost: 0 });
    }

    #[test]
    fn test_auxiliary_network_shape() {
        let mut network = network(&[("A", "B", 5, ServiceTier::Premium)]);
        let a = network.find_station("A").unwrap();
        let b = network.find_station("B").unwrap();
        MaxFlowSolver::new().solve(&mut network, &[a], b).unwrap();

        let auxiliary = AuxiliaryNetwork::build(network.regular());
        let aux = auxiliary.network();
        let forward = network.find_rail("A", "B").unwrap();

        // two edges per regular link
        assert_eq!(aux.link_count(), 2 * network.regular().link_count());
        let send = aux.find_link("A", "B").unwrap();
        let undo = aux.link(send).reverse();
        assert_eq!(aux.link(send).cost(), 4);
        assert_eq!(aux.link(send).capacity(), 0);
        assert_eq!(aux.link(undo).cost(), -4);
        assert_eq!(aux.link(undo).capacity(), 5);
        assert_eq!(aux.link(send).corresponding(), Some(forward));
        assert_eq!(aux.link(undo).corresponding(), Some(forward));
    }

    #[test]
    fn test_no_negative_cycle_in_empty_flow() {
        let network = network(&[("A", "B", 5, ServiceTier::Standard), ("B", "C", 1, ServiceTier::Express)]);
        let auxiliary = AuxiliaryNetwork::build(network.regular());

        assert_eq!(auxiliary.find_negative_cycle().unwrap(), None);
    }
}
