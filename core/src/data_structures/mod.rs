//! Network representation: the node/link arena and its regular/residual pairing

pub mod graph;
pub mod rail;

pub use self::graph::{Capacity, Cost, Flow, FlowNetwork, Link, Node, ServiceTier};
pub use self::rail::{RailLinks, RailNetwork};
