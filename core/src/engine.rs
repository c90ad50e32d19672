//! Identifier-level query facade
//!
//! `FlowEngine` resolves station names before any flow state is touched,
//! so an unknown identifier fails fast with `FlowError::UnknownStation`
//! and never leaves a half-computed flow behind.

use std::collections::HashMap;

use log::info;

use crate::algorithm::graph::failure::{select_random_links, FailureAnalyzer, FailureImpact, StationDegradation};
use crate::algorithm::graph::grouping::{AllPairsMaxFlow, GroupRanking, GroupingAnalyzer};
use crate::algorithm::graph::max_flow::MaxFlowSolver;
use crate::algorithm::graph::min_cost_flow::{MinCostFlowResult, MinCostFlowSolver};
use crate::algorithm::traits::{FlowAlgorithm, FlowError, FlowMetrics, LinkId, NodeId};
use crate::config::EngineConfig;
use crate::data_structures::graph::Flow;
use crate::data_structures::rail::RailNetwork;

#[derive(Debug, Clone)]
pub struct FlowEngine {
    network: RailNetwork,
    config: EngineConfig,
    metrics: FlowMetrics,
}

impl FlowEngine {
    pub fn new(network: RailNetwork, config: EngineConfig) -> Self {
        Self {
            network,
            config,
            metrics: FlowMetrics::default(),
        }
    }

    /// Solver counters summed over every query run so far
    pub fn metrics(&self) -> &FlowMetrics {
        &self.metrics
    }

    pub fn network(&self) -> &RailNetwork {
        &self.network
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn stations(&self, ids: &[&str]) -> Result<Vec<NodeId>, FlowError> {
        ids.iter().map(|id| self.network.require_station(id)).collect()
    }

    /// Maximum flow from the `sources` set into `target`
    pub fn max_flow(&mut self, sources: &[&str], target: &str) -> Result<Flow, FlowError> {
        let sources = self.stations(sources)?;
        let target = self.network.require_station(target)?;
        let mut solver = MaxFlowSolver::new();
        let flow = solver.solve(&mut self.network, &sources, target);
        self.metrics.absorb(solver.metrics());
        flow
    }

    /// Cheapest way to carry the maximum flow from `source` to `target`
    pub fn min_cost_max_flow(&mut self, source: &str, target: &str) -> Result<MinCostFlowResult, FlowError> {
        let source = self.network.require_station(source)?;
        let target = self.network.require_station(target)?;
        let mut solver = MinCostFlowSolver::new();
        let result = solver.solve(&mut self.network, source, target);
        self.metrics.absorb(solver.metrics());
        result
    }

    /// Flow `station` can receive from every end-of-line station around it
    pub fn incoming_flow(&mut self, station: &str) -> Result<Flow, FlowError> {
        let station = self.network.require_station(station)?;
        let mut analyzer = GroupingAnalyzer::new(false);
        let flow = analyzer.incoming_flow(&mut self.network, station);
        self.metrics.absorb(analyzer.metrics());
        flow
    }

    /// Only this query follows `EngineConfig::parallel_all_pairs`
    pub fn all_pairs_max_flow(&mut self) -> Result<AllPairsMaxFlow, FlowError> {
        let mut analyzer = GroupingAnalyzer::new(self.config.parallel_all_pairs);
        let result = analyzer.all_pairs_max_flow(&mut self.network);
        self.metrics.absorb(analyzer.metrics());
        result
    }

    /// Max flow before and while the rails behind `links` are out of service
    pub fn failure_impact(
        &mut self,
        links: &[LinkId],
        sources: &[&str],
        target: &str,
    ) -> Result<FailureImpact, FlowError> {
        let sources = self.stations(sources)?;
        let target = self.network.require_station(target)?;
        let mut analyzer = FailureAnalyzer::new();
        let impact = analyzer.max_flow_under_failure(&mut self.network, links, &sources, target);
        self.metrics.absorb(analyzer.metrics());
        impact
    }

    pub fn rank_groups_by_average_incoming_flow(
        &mut self,
        groups: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<GroupRanking>, FlowError> {
        let mut analyzer = GroupingAnalyzer::new(false);
        let ranking = analyzer.rank_groups(&mut self.network, groups);
        self.metrics.absorb(analyzer.metrics());
        ranking
    }

    pub fn rank_stations_by_degradation(&mut self, links: &[LinkId]) -> Result<Vec<StationDegradation>, FlowError> {
        let mut analyzer = FailureAnalyzer::new();
        let ranking = analyzer.rank_stations_by_degradation(&mut self.network, links);
        self.metrics.absorb(analyzer.metrics());
        ranking
    }

    /// Regular-network links for `(from, to)` station pairs
    pub fn resolve_links(&self, pairs: &[(&str, &str)]) -> Result<Vec<LinkId>, FlowError> {
        pairs
            .iter()
            .map(|&(from, to)| {
                self.network.require_station(from)?;
                self.network.require_station(to)?;
                self.network
                    .find_rail(from, to)
                    .ok_or_else(|| FlowError::UnknownLink(from.to_owned(), to.to_owned()))
            })
            .collect()
    }

    /// `count` distinct active rails drawn with the configured seed
    pub fn random_links(&self, count: usize) -> Vec<LinkId> {
        let links = select_random_links(&self.network, count, self.config.failure_seed);
        info!("Selected {} rails to fail (seed {})", links.len(), self.config.failure_seed);
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::graph::ServiceTier;

    fn engine() -> FlowEngine {
        let mut network = RailNetwork::new();
        for station in ["A", "B", "C", "D"] {
            network.add_station(station);
        }
        for (from, to, capacity) in [("A", "B", 5), ("A", "C", 3), ("B", "D", 2), ("C", "D", 4)] {
            network.add_rail(from, to, capacity, ServiceTier::Standard).unwrap();
        }
        FlowEngine::new(network, EngineConfig::default())
    }

    #[test]
    fn test_queries_by_name() {
        let mut engine = engine();

        assert_eq!(engine.max_flow(&["A"], "D").unwrap(), 5);
        assert_eq!(
            engine.min_cost_max_flow("A", "D").unwrap(),
            MinCostFlowResult { flow: 5, cost: 20 }
        );
        // the diamond is a ring: no station is an end of line
        assert_eq!(engine.incoming_flow("B").unwrap(), 0);
        assert!(engine.metrics().augmentations >= 4);
        assert_eq!(engine.metrics().cancelled_cycles, 0);
    }

    #[test]
    fn test_unknown_station_fails_fast() {
        let mut engine = engine();

        assert_eq!(
            engine.max_flow(&["A", "Z"], "D"),
            Err(FlowError::UnknownStation("Z".to_string()))
        );
        assert_eq!(
            engine.min_cost_max_flow("A", "Q"),
            Err(FlowError::UnknownStation("Q".to_string()))
        );
        assert_eq!(engine.incoming_flow("Q"), Err(FlowError::UnknownStation("Q".to_string())));
    }

    #[test]
    fn test_parallel_flag_only_changes_all_pairs() {
        let mut sequential = engine();
        let mut parallel = FlowEngine::new(
            sequential.network().clone(),
            EngineConfig {
                parallel_all_pairs: true,
                ..EngineConfig::default()
            },
        );
        let groups: HashMap<String, Vec<String>> = [
            ("north".to_string(), vec!["A".to_string(), "B".to_string()]),
            ("south".to_string(), vec!["C".to_string(), "D".to_string()]),
        ]
        .into_iter()
        .collect();

        assert_eq!(parallel.incoming_flow("C"), sequential.incoming_flow("C"));
        assert_eq!(
            parallel.rank_groups_by_average_incoming_flow(&groups),
            sequential.rank_groups_by_average_incoming_flow(&groups)
        );
        assert_eq!(parallel.all_pairs_max_flow(), sequential.all_pairs_max_flow());
    }

    #[test]
    fn test_resolve_links() {
        let engine = engine();

        let links = engine.resolve_links(&[("A", "B"), ("D", "C")]).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(engine.network().regular().link(links[1]).capacity(), 4);

        assert_eq!(
            engine.resolve_links(&[("A", "D")]),
            Err(FlowError::UnknownLink("A".to_string(), "D".to_string()))
        );
        assert_eq!(
            engine.resolve_links(&[("A", "X")]),
            Err(FlowError::UnknownStation("X".to_string()))
        );
    }

    #[test]
    fn test_failure_impact_by_name() {
        let mut engine = engine();
        let links = engine.resolve_links(&[("B", "D")]).unwrap();

        let impact = engine.failure_impact(&links, &["A"], "D").unwrap();
        assert_eq!(impact, FailureImpact { baseline: 5, degraded: 3 });

        let ranking = engine.rank_stations_by_degradation(&links).unwrap();
        assert_eq!(ranking.len(), 4);
        assert!(ranking[0].reduction_percent >= ranking[3].reduction_percent);
    }

    #[test]
    fn test_random_links_follow_config_seed() {
        let engine = engine();
        let same_seed = FlowEngine::new(engine.network().clone(), EngineConfig::default());

        assert_eq!(engine.random_links(3), same_seed.random_links(3));
        assert_eq!(engine.random_links(3).len(), 3);
    }
}
