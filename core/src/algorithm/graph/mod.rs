//! Graph flow solvers and analyzers

pub mod max_flow;
pub mod min_cost_flow;
pub mod failure;
pub mod grouping;

pub use self::max_flow::{AugmentingPathSearch, MaxFlowSolver};
pub use self::min_cost_flow::{AuxiliaryNetwork, MinCostFlowResult, MinCostFlowSolver};
pub use self::failure::{FailureAnalyzer, FailureImpact, StationDegradation};
pub use self::grouping::{AllPairsMaxFlow, GroupRanking, GroupingAnalyzer};
