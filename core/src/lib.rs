//! Railway flow-network analysis
//!
//! Models a railway as paired regular/residual flow networks and answers
//! capacity questions over it: maximum flow between stations, the cheapest
//! way to carry that flow, how much capacity stations lose when rails fail,
//! and which districts, municipalities or townships receive the most
//! incoming capacity.
//!
//! ```
//! use railflow_core::{EngineConfig, FlowEngine, RailNetwork, ServiceTier};
//!
//! let mut network = RailNetwork::new();
//! for station in ["Lisboa", "Coimbra", "Porto"] {
//!     network.add_station(station);
//! }
//! network.add_rail("Lisboa", "Coimbra", 6, ServiceTier::Standard).unwrap();
//! network.add_rail("Coimbra", "Porto", 4, ServiceTier::Premium).unwrap();
//!
//! let mut engine = FlowEngine::new(network, EngineConfig::default());
//! assert_eq!(engine.max_flow(&["Lisboa"], "Porto").unwrap(), 4);
//! ```

pub mod algorithm;
pub mod config;
pub mod data_structures;
pub mod dataset;
pub mod engine;
pub mod validation;

pub use algorithm::graph::{
    AllPairsMaxFlow, FailureImpact, GroupRanking, MinCostFlowResult, StationDegradation,
};
pub use algorithm::traits::{FlowError, LinkId, NodeId};
pub use config::{ConfigError, EngineConfig};
pub use data_structures::{Capacity, Cost, Flow, RailNetwork, ServiceTier};
pub use dataset::{Dataset, DatasetError, GroupKind, Station, StationDirectory};
pub use engine::FlowEngine;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
