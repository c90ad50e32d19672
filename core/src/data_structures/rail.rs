//! Paired regular/residual flow networks
//!
//! A `RailNetwork` owns two `FlowNetwork` instances built in lockstep. Every
//! station is declared in both, and every rail produces four links (forward
//! and reverse in each network) whose corresponding references are wired in
//! a single call. There is no way to add a link to only one side.

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{FlowError, LinkId, NodeId};
use crate::data_structures::graph::{Capacity, FlowNetwork, ServiceTier};

/// Regular-network ids of a freshly declared rail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailLinks {
    pub forward: LinkId,
    pub reverse: LinkId,
}

/// Regular network (capacities, real flow) paired with its residual network
#[derive(Debug, Clone, Default)]
pub struct RailNetwork {
    regular: FlowNetwork,
    residual: FlowNetwork,
}

impl RailNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a station in both networks; false if it already exists
    pub fn add_station(&mut self, id: &str) -> bool {
        if !self.regular.add_node(id) {
            return false;
        }
        self.residual.add_node(id);
        true
    }

    /// Declares a bidirectional rail and wires the four links together
    ///
    /// Returns `None` when either endpoint is unknown; nothing is created.
    pub fn add_rail(
        &mut self,
        source: &str,
        destination: &str,
        capacity: Capacity,
        service: ServiceTier,
    ) -> Option<RailLinks> {
        if self.regular.find_node(source).is_none() || self.regular.find_node(destination).is_none() {
            return None;
        }
        let (forward, reverse) = self
            .regular
            .add_bidirectional_link(source, destination, capacity, service)?;
        let (residual_forward, residual_reverse) = self
            .residual
            .add_bidirectional_link(source, destination, capacity, service)?;

        self.regular.link_mut(forward).corresponding = Some(residual_forward);
        self.regular.link_mut(reverse).corresponding = Some(residual_reverse);
        self.residual.link_mut(residual_forward).corresponding = Some(forward);
        self.residual.link_mut(residual_reverse).corresponding = Some(reverse);

        Some(RailLinks { forward, reverse })
    }

    pub fn regular(&self) -> &FlowNetwork {
        &self.regular
    }

    pub fn residual(&self) -> &FlowNetwork {
        &self.residual
    }

    pub(crate) fn regular_mut(&mut self) -> &mut FlowNetwork {
        &mut self.regular
    }

    pub fn find_station(&self, id: &str) -> Option<NodeId> {
        self.regular.find_node(id)
    }

    /// Resolves a station identifier or reports it as unknown
    pub fn require_station(&self, id: &str) -> Result<NodeId, FlowError> {
        self.find_station(id)
            .ok_or_else(|| FlowError::UnknownStation(id.to_owned()))
    }

    /// Regular-network link from `source` to `destination`
    pub fn find_rail(&self, source: &str, destination: &str) -> Option<LinkId> {
        self.regular.find_link(source, destination)
    }

    /// Counterpart of a regular link in the residual network
    pub(crate) fn residual_of(&self, regular: LinkId) -> Result<LinkId, FlowError> {
        self.regular
            .link(regular)
            .corresponding()
            .ok_or(FlowError::UnpairedLink(regular))
    }

    /// Counterpart of a residual link in the regular network
    pub(crate) fn regular_of(&self, residual: LinkId) -> Result<LinkId, FlowError> {
        self.residual
            .link(residual)
            .corresponding()
            .ok_or(FlowError::UnpairedLink(residual))
    }

    pub fn station_count(&self) -> usize {
        self.regular.node_count()
    }

    pub fn rail_count(&self) -> usize {
        self.regular.link_pair_count()
    }

    /// Clears every regular flow and restores full residual capacity
    pub(crate) fn reset_flow(&mut self) -> Result<(), FlowError> {
        for index in 0..self.regular.link_count() {
            self.regular.link_mut(LinkId(index)).flow = 0;
        }
        self.sync_residual()
    }

    /// Recomputes every residual capacity from the regular flow state
    ///
    /// Residual capacity of `u -> v` is the unused capacity of `u -> v`
    /// plus the flow on `v -> u` that can be cancelled.
    pub(crate) fn sync_residual(&mut self) -> Result<(), FlowError> {
        for index in 0..self.regular.link_count() {
            self.sync_link(LinkId(index))?;
        }
        Ok(())
    }

    /// Saturates at `Capacity::MAX`; pushes never exceed the true residual
    fn sync_link(&mut self, link_id: LinkId) -> Result<(), FlowError> {
        let link = self.regular.link(link_id);
        let opposing = self.regular.link(link.reverse()).flow();
        let available = link.spare_capacity().saturating_add(opposing);
        let counterpart = self.residual_of(link_id)?;
        self.residual.link_mut(counterpart).capacity = available;
        Ok(())
    }

    /// Pushes `amount` along the regular link behind residual link `residual`
    ///
    /// Flow is clamped at capacity; the excess cancels flow travelling the
    /// other way on the reverse regular link. Both residual directions are
    /// then recomputed from the regular state.
    pub(crate) fn push_flow(&mut self, residual: LinkId, amount: Capacity) -> Result<(), FlowError> {
        let regular = self.regular_of(residual)?;
        let reverse_regular = self.regular.link(regular).reverse();

        let link = self.regular.link(regular);
        let (capacity, spare) = (link.capacity(), link.spare_capacity());
        if amount > spare {
            let excess = amount - spare;
            let reverse_flow = self.regular.link(reverse_regular).flow();
            let cancelled = reverse_flow
                .checked_sub(excess)
                .ok_or(FlowError::CapacityViolation(reverse_regular))?;
            self.regular.link_mut(regular).flow = capacity;
            self.regular.link_mut(reverse_regular).flow = cancelled;
        } else {
            self.regular.link_mut(regular).flow += amount;
        }

        self.sync_link(regular)?;
        self.sync_link(reverse_regular)
    }

    /// Sets the active flag on the rail behind `link` in both networks
    pub(crate) fn set_rail_active(&mut self, link: LinkId, active: bool) -> Result<(), FlowError> {
        if link.0 >= self.regular.link_count() {
            return Err(FlowError::InvalidLink(link));
        }
        let reverse = self.regular.link(link).reverse();
        let residual = self.residual_of(link)?;
        let residual_reverse = self.residual_of(reverse)?;

        self.regular.link_mut(link).active = active;
        self.regular.link_mut(reverse).active = active;
        self.residual.link_mut(residual).active = active;
        self.residual.link_mut(residual_reverse).active = active;
        Ok(())
    }
}
