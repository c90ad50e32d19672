//! Rail failure simulation
//!
//! Failures are modelled by clearing the active flag on a rail (all four of
//! its links), recomputing maximum flow and restoring the flag. Links are
//! never removed, so ids stay stable across a simulation.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::grouping::super_source;
use crate::algorithm::graph::max_flow::MaxFlowSolver;
use crate::algorithm::traits::{FlowAlgorithm, FlowError, FlowMetrics, LinkId, NodeId};
use crate::data_structures::graph::Flow;
use crate::data_structures::rail::RailNetwork;

/// Percentage of `baseline` lost when only `degraded` remains
///
/// A zero baseline reports no reduction.
pub fn reduction_percent(baseline: Flow, degraded: Flow) -> f64 {
    if baseline == 0 {
        return 0.0;
    }
    100.0 * (1.0 - degraded as f64 / baseline as f64)
}

/// Max flow with all rails active and with the failed rails removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureImpact {
    pub baseline: Flow,
    pub degraded: Flow,
}

impl FailureImpact {
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.baseline, self.degraded)
    }
}

/// Incoming-flow loss of one station under a failure set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationDegradation {
    pub station: String,
    pub baseline: Flow,
    pub degraded: Flow,
    pub reduction_percent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FailureAnalyzer {
    solver: MaxFlowSolver,
}

impl FailureAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> &FlowMetrics {
        self.solver.metrics()
    }

    /// Takes every rail behind `links` out of service
    pub fn deactivate_links(network: &mut RailNetwork, links: &[LinkId]) -> Result<(), FlowError> {
        for &link in links {
            network.set_rail_active(link, false)?;
        }
        Ok(())
    }

    /// Returns every rail behind `links` to service
    pub fn activate_links(network: &mut RailNetwork, links: &[LinkId]) -> Result<(), FlowError> {
        for &link in links {
            network.set_rail_active(link, true)?;
        }
        Ok(())
    }

    /// Max flow from `sources` to `target` before and during the failure
    ///
    /// The failed rails are active again when this returns, including on
    /// error.
    pub fn max_flow_under_failure(
        &mut self,
        network: &mut RailNetwork,
        links: &[LinkId],
        sources: &[NodeId],
        target: NodeId,
    ) -> Result<FailureImpact, FlowError> {
        let baseline = self.solver.solve(network, sources, target)?;

        Self::deactivate_links(network, links)?;
        let degraded = self.solver.solve(network, sources, target);
        Self::activate_links(network, links)?;
        let degraded = degraded?;

        debug!(
            "Failure of {} rails into {}: {} -> {}",
            links.len(),
            network.regular().label(target),
            baseline,
            degraded
        );
        Ok(FailureImpact { baseline, degraded })
    }

    /// Every station's incoming flow before and during the failure
    ///
    /// Ordered by descending reduction; stations with equal reduction keep
    /// their declaration order.
    pub fn rank_stations_by_degradation(
        &mut self,
        network: &mut RailNetwork,
        links: &[LinkId],
    ) -> Result<Vec<StationDegradation>, FlowError> {
        let stations: Vec<(NodeId, Vec<NodeId>)> = (0..network.station_count())
            .map(NodeId)
            .map(|station| (station, super_source(network.regular(), station)))
            .collect();

        let mut baselines = Vec::with_capacity(stations.len());
        for (station, sources) in &stations {
            baselines.push(self.solver.solve(network, sources, *station)?);
        }

        Self::deactivate_links(network, links)?;
        let degraded = self.incoming_flows(network, &stations);
        Self::activate_links(network, links)?;
        let degraded = degraded?;

        let regular = network.regular();
        let mut ranking: Vec<StationDegradation> = stations
            .iter()
            .zip(baselines.into_iter().zip(degraded))
            .map(|((station, _), (baseline, degraded))| StationDegradation {
                station: regular.label(*station).to_owned(),
                baseline,
                degraded,
                reduction_percent: reduction_percent(baseline, degraded),
            })
            .collect();

        ranking.sort_by(|a, b| b.reduction_percent.total_cmp(&a.reduction_percent));
        Ok(ranking)
    }

    fn incoming_flows(
        &mut self,
        network: &mut RailNetwork,
        stations: &[(NodeId, Vec<NodeId>)],
    ) -> Result<Vec<Flow>, FlowError> {
        stations
            .iter()
            .map(|(station, sources)| self.solver.solve(network, sources, *station))
            .collect()
    }
}

/// Up to `count` distinct active rails, chosen uniformly from `seed`
///
/// Each rail is reported by its forward (lower id) regular link.
pub fn select_random_links(network: &RailNetwork, count: usize, seed: u64) -> Vec<LinkId> {
    let regular = network.regular();
    let mut candidates: Vec<LinkId> = regular
        .links()
        .filter(|(id, link)| link.is_active() && *id < link.reverse())
        .map(|(id, _)| id)
        .collect();

    if count > candidates.len() {
        warn!(
            "Requested {} failing rails but only {} are active",
            count,
            candidates.len()
        );
    }

    let mut rng = StdRng::seed_from_u64(seed);
    candidates.shuffle(&mut rng);
    candidates.truncate(count);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::ServiceTier;

    fn network(stations: &[&str], rails: &[(&str, &str, u64)]) -> RailNetwork {
        let mut network = RailNetwork::new();
        for station in stations {
            network.add_station(station);
        }
        for &(from, to, capacity) in rails {
            network.add_rail(from, to, capacity, ServiceTier::Standard).unwrap();
        }
        network
    }

    fn diamond() -> RailNetwork {
        network(
            &["A", "B", "C", "D"],
            &[("A", "B", 5), ("A", "C", 3), ("B", "D", 2), ("C", "D", 4)],
        )
    }

    #[test]
    fn test_reduction_percent() {
        assert_eq!(reduction_percent(0, 0), 0.0);
        assert_eq!(reduction_percent(4, 4), 0.0);
        assert_eq!(reduction_percent(4, 1), 75.0);
        assert_eq!(reduction_percent(4, 0), 100.0);
    }

    #[test]
    fn test_failure_impact_restores_rails() {
        let mut network = diamond();
        let failed = vec![network.find_rail("B", "D").unwrap()];
        let a = network.find_station("A").unwrap();
        let d = network.find_station("D").unwrap();
        let mut analyzer = FailureAnalyzer::new();

        let impact = analyzer.max_flow_under_failure(&mut network, &failed, &[a], d).unwrap();

        assert_eq!(impact, FailureImpact { baseline: 5, degraded: 3 });
        assert_eq!(impact.reduction_percent(), 40.0);
        assert!(network.regular().link(failed[0]).is_active());
        assert_eq!(MaxFlowSolver::new().solve(&mut network, &[a], d).unwrap(), 5);
    }

    #[test]
    fn test_failure_of_unknown_link() {
        let mut network = diamond();
        let a = network.find_station("A").unwrap();
        let d = network.find_station("D").unwrap();

        let result = FailureAnalyzer::new().max_flow_under_failure(&mut network, &[LinkId(99)], &[a], d);

        assert_eq!(result, Err(FlowError::InvalidLink(LinkId(99))));
    }

    #[test]
    fn test_rank_stations_by_degradation() {
        let mut network = network(&["A", "B", "C", "Lonely"], &[("A", "B", 4), ("B", "C", 3)]);
        let failed = vec![network.find_rail("B", "C").unwrap()];

        let ranking = FailureAnalyzer::new()
            .rank_stations_by_degradation(&mut network, &failed)
            .unwrap();
        let order: Vec<&str> = ranking.iter().map(|r| r.station.as_str()).collect();

        // A and C both lose everything and keep declaration order
        assert_eq!(order, vec!["A", "C", "B", "Lonely"]);
        assert_eq!((ranking[0].baseline, ranking[0].degraded), (3, 0));
        assert_eq!((ranking[2].baseline, ranking[2].degraded), (7, 4));
        assert_eq!(ranking[3].baseline, 0);
        assert_eq!(ranking[3].reduction_percent, 0.0);
        assert!(network.regular().link(failed[0]).is_active());
    }

    #[test]
    fn test_random_selection_is_seeded_and_capped() {
        let mut network = diamond();

        let first = select_random_links(&network, 2, 7);
        let second = select_random_links(&network, 2, 7);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_ne!(first[0], first[1]);
        for link in &first {
            assert!(*link < network.regular().link(*link).reverse());
        }

        assert_eq!(select_random_links(&network, 10, 7).len(), 4);

        let rail = network.find_rail("A", "B").unwrap();
        network.set_rail_active(rail, false).unwrap();
        let remaining = select_random_links(&network, 10, 7);
        assert_eq!(remaining.len(), 3);
        assert!(!remaining.contains(&rail));
    }
}
