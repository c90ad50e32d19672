//! Arena-backed flow network representation
//!
//! Nodes and links are stored in flat vectors and refer to one another
//! through `NodeId` / `LinkId` indices, giving O(1) traversal without
//! borrowed back-references. Links are only ever created in anti-parallel
//! pairs: every link knows its reverse, and a link pair is never split.
//!
//! # Residual Interpretation
//! The same structure backs three roles. In the *regular* network a link's
//! `capacity` is its physical capacity and `flow` is the flow it carries. In
//! the *residual* network `capacity` holds the capacity still available in
//! that direction. In the auxiliary min-cost network `capacity` is the
//! residual capacity and `cost` may be negative.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{LinkId, NodeId};

/// Flow capacity type (exact integer capacities)
pub type Capacity = u64;

/// Flow value type
pub type Flow = u64;

/// Signed per-unit cost; negative in the auxiliary min-cost network
pub type Cost = i64;

/// Service tier of a rail connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceTier {
    Standard,
    Premium,
    Express,
}

impl ServiceTier {
    /// Cost of moving one unit of flow over a link of this tier
    #[inline]
    pub fn cost_per_unit(self) -> Cost {
        match self {
            ServiceTier::Standard => 2,
            ServiceTier::Premium => 4,
            ServiceTier::Express => 6,
        }
    }
}

/// Named vertex with ordered adjacency
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    outgoing: Vec<LinkId>,
    incoming: Vec<LinkId>,
}

impl Node {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Outgoing links in insertion order
    pub fn outgoing(&self) -> &[LinkId] {
        &self.outgoing
    }

    /// Incoming links in insertion order
    pub fn incoming(&self) -> &[LinkId] {
        &self.incoming
    }

    /// Number of outgoing links; 1 marks an end-of-line station
    pub fn degree(&self) -> usize {
        self.outgoing.len()
    }
}

/// Directed capacitated link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub(crate) origin: NodeId,
    pub(crate) destination: NodeId,
    pub(crate) capacity: Capacity,
    pub(crate) flow: Flow,
    pub(crate) service: ServiceTier,
    pub(crate) cost: Cost,
    pub(crate) active: bool,
    pub(crate) reverse: LinkId,
    pub(crate) corresponding: Option<LinkId>,
}

impl Link {
    fn new(origin: NodeId, destination: NodeId, capacity: Capacity, service: ServiceTier, reverse: LinkId) -> Self {
        Self {
            origin,
            destination,
            capacity,
            flow: 0,
            service,
            cost: service.cost_per_unit(),
            active: true,
            reverse,
            corresponding: None,
        }
    }

    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn service(&self) -> ServiceTier {
        self.service
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The anti-parallel link created alongside this one
    pub fn reverse(&self) -> LinkId {
        self.reverse
    }

    /// The paired link in the other network instance, once wired
    pub fn corresponding(&self) -> Option<LinkId> {
        self.corresponding
    }

    /// Capacity not yet used by flow
    #[inline]
    pub fn spare_capacity(&self) -> Capacity {
        self.capacity.saturating_sub(self.flow)
    }

    /// A link may carry more flow when it is active and has spare capacity
    #[inline]
    pub fn admits_flow(&self) -> bool {
        self.active && self.capacity > 0
    }
}

/// Flow network: node arena, link arena and identifier index
#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: HashMap<String, NodeId>,
    link_pairs: usize,
}

impl FlowNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a node; returns false if the identifier is already present
    pub fn add_node(&mut self, id: &str) -> bool {
        if self.index.contains_key(id) {
            return false;
        }
        let node_id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(id));
        self.index.insert(id.to_owned(), node_id);
        true
    }

    /// Looks up a node by identifier
    pub fn find_node(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Adds a link and its reverse, both with `capacity` and `service`
    ///
    /// Returns `None`, creating nothing, when either endpoint is absent.
    /// The link-pair counter grows by exactly one per successful call.
    pub fn add_bidirectional_link(
        &mut self,
        source: &str,
        destination: &str,
        capacity: Capacity,
        service: ServiceTier,
    ) -> Option<(LinkId, LinkId)> {
        let from = self.find_node(source)?;
        let to = self.find_node(destination)?;

        let forward = LinkId(self.links.len());
        let backward = LinkId(forward.0 + 1);

        self.links.push(Link::new(from, to, capacity, service, backward));
        self.links.push(Link::new(to, from, capacity, service, forward));

        self.nodes[from.0].outgoing.push(forward);
        self.nodes[to.0].incoming.push(forward);
        self.nodes[to.0].outgoing.push(backward);
        self.nodes[from.0].incoming.push(backward);

        self.link_pairs += 1;
        Some((forward, backward))
    }

    /// First outgoing link of `source` that ends at `destination`
    pub fn find_link(&self, source: &str, destination: &str) -> Option<LinkId> {
        let from = self.find_node(source)?;
        let to = self.find_node(destination)?;
        self.nodes[from.0]
            .outgoing
            .iter()
            .copied()
            .find(|&link| self.links[link.0].destination == to)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    #[inline]
    pub(crate) fn link_mut(&mut self, id: LinkId) -> &mut Link {
        &mut self.links[id.0]
    }

    /// Nodes with their ids, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Links with their ids, in creation order
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        self.links.iter().enumerate().map(|(i, link)| (LinkId(i), link))
    }

    /// Identifier of the node at `id`
    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.0].id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of successful `add_bidirectional_link` calls
    pub fn link_pair_count(&self) -> usize {
        self.link_pairs
    }
}
