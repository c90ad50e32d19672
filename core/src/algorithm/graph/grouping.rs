//! Incoming-capacity analysis over station groups
//!
//! A station's *incoming flow* is the maximum flow it can receive from its
//! super-source: every end-of-line station (exactly one outgoing link) in
//! its connected component except itself. Groups of stations (districts,
//! municipalities, townships) are ranked by the mean incoming flow of their
//! members.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::max_flow::MaxFlowSolver;
use crate::algorithm::traits::{FlowAlgorithm, FlowError, FlowMetrics, NodeId};
use crate::data_structures::graph::{Flow, FlowNetwork};
use crate::data_structures::rail::RailNetwork;

/// Average incoming flow of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRanking {
    pub group: String,
    pub stations: usize,
    /// `None` when the group has no member stations
    pub average: Option<f64>,
}

/// Station pairs sharing the largest pairwise maximum flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllPairsMaxFlow {
    pub pairs: Vec<(String, String)>,
    pub flow: Flow,
}

/// End-of-line stations in `station`'s component, excluding `station`
///
/// Breadth-first over the physical topology; the active flag is ignored
/// so the super-source stays the same while rails are deactivated.
pub fn super_source(network: &FlowNetwork, station: NodeId) -> Vec<NodeId> {
    let mut visited = vec![false; network.node_count()];
    let mut queue = VecDeque::new();
    let mut endpoints = Vec::new();

    visited[station.0] = true;
    queue.push_back(station);

    while let Some(current) = queue.pop_front() {
        let node = network.node(current);
        if node.degree() == 1 && current != station {
            endpoints.push(current);
        }
        for &link in node.outgoing() {
            let next = network.link(link).destination();
            if !visited[next.0] {
                visited[next.0] = true;
                queue.push_back(next);
            }
        }
    }

    endpoints
}

/// Marks every station reachable from `origin`, using an explicit stack
pub fn reachable_from(network: &FlowNetwork, origin: NodeId) -> Vec<bool> {
    let mut reached = vec![false; network.node_count()];
    let mut stack = vec![origin];
    reached[origin.0] = true;

    while let Some(current) = stack.pop() {
        for &link in network.node(current).outgoing() {
            let next = network.link(link).destination();
            if !reached[next.0] {
                reached[next.0] = true;
                stack.push(next);
            }
        }
    }

    reached
}

/// Super-source based capacity analysis
#[derive(Debug, Clone, Default)]
pub struct GroupingAnalyzer {
    solver: MaxFlowSolver,
    parallel: bool,
}

impl GroupingAnalyzer {
    /// `parallel` spreads all-pairs queries over the rayon pool
    pub fn new(parallel: bool) -> Self {
        Self {
            solver: MaxFlowSolver::new(),
            parallel,
        }
    }

    pub fn metrics(&self) -> &FlowMetrics {
        self.solver.metrics()
    }

    /// Maximum flow that can arrive at `station` from its super-source
    pub fn incoming_flow(&mut self, network: &mut RailNetwork, station: NodeId) -> Result<Flow, FlowError> {
        let sources = super_source(network.regular(), station);
        self.solver.solve(network, &sources, station)
    }

    /// Mean incoming flow over `members`; `None` for an empty group
    pub fn average_incoming_flow(
        &mut self,
        network: &mut RailNetwork,
        members: &[NodeId],
    ) -> Result<Option<f64>, FlowError> {
        if members.is_empty() {
            return Ok(None);
        }
        let mut sum = 0.0;
        for &station in members {
            sum += self.incoming_flow(network, station)? as f64;
        }
        Ok(Some(sum / members.len() as f64))
    }

    /// Ranks groups by descending average incoming flow
    ///
    /// Groups without members come last; equal averages are ordered by
    /// group name so the ranking is deterministic.
    pub fn rank_groups(
        &mut self,
        network: &mut RailNetwork,
        groups: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<GroupRanking>, FlowError> {
        let mut ranking = Vec::with_capacity(groups.len());

        for (group, members) in groups {
            let stations = members
                .iter()
                .map(|member| network.require_station(member))
                .collect::<Result<Vec<_>, _>>()?;
            let average = self.average_incoming_flow(network, &stations)?;
            debug!("Group {} averages {:?} over {} stations", group, average, stations.len());
            ranking.push(GroupRanking {
                group: group.clone(),
                stations: stations.len(),
                average,
            });
        }

        ranking.sort_by(|a, b| compare_averages(a.average, b.average).then_with(|| a.group.cmp(&b.group)));
        Ok(ranking)
    }

    /// Pairs of mutually reachable stations with the largest max flow
    pub fn all_pairs_max_flow(&mut self, network: &mut RailNetwork) -> Result<AllPairsMaxFlow, FlowError> {
        let station_count = network.station_count();

        let partials: Vec<(Flow, Vec<(NodeId, NodeId)>)> = if self.parallel {
            let template: &RailNetwork = network;
            (0..station_count)
                .into_par_iter()
                .map_init(
                    || (template.clone(), MaxFlowSolver::new()),
                    |(local, solver), origin| best_pairs_from(solver, local, NodeId(origin)),
                )
                .collect::<Result<Vec<_>, _>>()?
        } else {
            (0..station_count)
                .map(|origin| best_pairs_from(&mut self.solver, network, NodeId(origin)))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut best: Flow = 0;
        let mut pairs = Vec::new();
        for (flow, found) in partials {
            match flow.cmp(&best) {
                Ordering::Greater => {
                    best = flow;
                    pairs = found;
                }
                Ordering::Equal => pairs.extend(found),
                Ordering::Less => {}
            }
        }

        info!("Largest pairwise max flow is {} across {} pairs", best, pairs.len());
        let regular = network.regular();
        Ok(AllPairsMaxFlow {
            pairs: pairs
                .into_iter()
                .map(|(a, b)| (regular.label(a).to_owned(), regular.label(b).to_owned()))
                .collect(),
            flow: best,
        })
    }
}

/// Best max flow from `origin` to every later, reachable station
fn best_pairs_from(
    solver: &mut MaxFlowSolver,
    network: &mut RailNetwork,
    origin: NodeId,
) -> Result<(Flow, Vec<(NodeId, NodeId)>), FlowError> {
    let reached = reachable_from(network.regular(), origin);
    let mut best: Flow = 0;
    let mut pairs = Vec::new();

    for other in (origin.0 + 1)..network.station_count() {
        if !reached[other] {
            continue;
        }
        let target = NodeId(other);
        let flow = solver.solve(network, &[origin], target)?;
        match flow.cmp(&best) {
            Ordering::Greater => {
                best = flow;
                pairs.clear();
                pairs.push((origin, target));
            }
            Ordering::Equal => pairs.push((origin, target)),
            Ordering::Less => {}
        }
    }

    Ok((best, pairs))
}

/// Descending order with "no data" last
fn compare_averages(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::ServiceTier;

    /// Two lines crossing at Hub, plus an isolated station
    fn crossing() -> RailNetwork {
        let mut network = RailNetwork::new();
        for station in ["North", "South", "East", "West", "Hub", "Island"] {
            network.add_station(station);
        }
        for (from, to, capacity) in [
            ("North", "Hub", 4),
            ("Hub", "South", 6),
            ("East", "Hub", 3),
            ("Hub", "West", 2),
        ] {
            network.add_rail(from, to, capacity, ServiceTier::Standard).unwrap();
        }
        network
    }

    fn id(network: &RailNetwork, name: &str) -> NodeId {
        network.find_station(name).unwrap()
    }

    #[test]
    fn test_super_source_collects_line_ends() {
        let network = crossing();

        let mut ends: Vec<&str> = super_source(network.regular(), id(&network, "Hub"))
            .into_iter()
            .map(|n| network.regular().label(n))
            .collect();
        ends.sort();
        assert_eq!(ends, vec!["East", "North", "South", "West"]);

        let from_north = super_source(network.regular(), id(&network, "North"));
        assert_eq!(from_north.len(), 3);
        assert!(!from_north.contains(&id(&network, "North")));

        assert!(super_source(network.regular(), id(&network, "Island")).is_empty());
    }

    #[test]
    fn test_incoming_flow() {
        let mut network = crossing();
        let mut analyzer = GroupingAnalyzer::new(false);

        let hub = id(&network, "Hub");
        assert_eq!(analyzer.incoming_flow(&mut network, hub).unwrap(), 15);

        // North receives from South, East and West through Hub, capped by North-Hub
        let north = id(&network, "North");
        assert_eq!(analyzer.incoming_flow(&mut network, north).unwrap(), 4);

        let island = id(&network, "Island");
        assert_eq!(analyzer.incoming_flow(&mut network, island).unwrap(), 0);
    }

    #[test]
    fn test_average_of_empty_group_is_no_data() {
        let mut network = crossing();
        let mut analyzer = GroupingAnalyzer::new(false);

        assert_eq!(analyzer.average_incoming_flow(&mut network, &[]).unwrap(), None);

        let members = [id(&network, "North"), id(&network, "West")];
        // North 4, West 2
        assert_eq!(analyzer.average_incoming_flow(&mut network, &members).unwrap(), Some(3.0));
    }

    #[test]
    fn test_average_of_maximal_flows() {
        let mut network = RailNetwork::new();
        network.add_station("Faro");
        network.add_station("Tavira");
        network.add_rail("Faro", "Tavira", u64::MAX, ServiceTier::Standard).unwrap();
        let mut analyzer = GroupingAnalyzer::new(false);

        let members = [id(&network, "Faro"), id(&network, "Tavira")];
        assert_eq!(
            analyzer.average_incoming_flow(&mut network, &members).unwrap(),
            Some(u64::MAX as f64)
        );
    }

    #[test]
    fn test_rank_groups() {
        let mut network = crossing();
        let mut analyzer = GroupingAnalyzer::new(false);
        let groups: HashMap<String, Vec<String>> = [
            ("Coast", vec!["North", "West"]),
            ("Centre", vec!["Hub"]),
            ("Nowhere", vec![]),
            ("Remote", vec!["Island"]),
        ]
        .into_iter()
        .map(|(g, m)| (g.to_string(), m.into_iter().map(String::from).collect()))
        .collect();

        let ranking = analyzer.rank_groups(&mut network, &groups).unwrap();
        let order: Vec<&str> = ranking.iter().map(|r| r.group.as_str()).collect();

        assert_eq!(order, vec!["Centre", "Coast", "Remote", "Nowhere"]);
        assert_eq!(ranking[0].average, Some(15.0));
        assert_eq!(ranking[2].average, Some(0.0));
        assert_eq!(ranking[3].average, None);
        assert_eq!(ranking[3].stations, 0);
    }

    #[test]
    fn test_rank_groups_rejects_unknown_member() {
        let mut network = crossing();
        let mut analyzer = GroupingAnalyzer::new(false);
        let groups = HashMap::from([("Ghost".to_string(), vec!["Atlantis".to_string()])]);

        assert_eq!(
            analyzer.rank_groups(&mut network, &groups),
            Err(FlowError::UnknownStation("Atlantis".to_string()))
        );
    }

    #[test]
    fn test_all_pairs_sequential_and_parallel_agree() {
        let mut network = crossing();

        let sequential = GroupingAnalyzer::new(false).all_pairs_max_flow(&mut network).unwrap();
        let parallel = GroupingAnalyzer::new(true).all_pairs_max_flow(&mut network).unwrap();

        assert_eq!(sequential.flow, 6);
        assert_eq!(sequential.pairs, vec![("South".to_string(), "Hub".to_string())]);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_reachability_is_component_bound() {
        let network = crossing();
        let reached = reachable_from(network.regular(), id(&network, "North"));

        assert!(reached[id(&network, "West").0]);
        assert!(!reached[id(&network, "Island").0]);
    }
}
