//! Read-only lookup of charging opportunities.
//!
//! Built once from the infrastructure specification and shared between
//! routing threads.  Opportunities are keyed by stop node and by link, and an
//! R-tree over their positions serves the off-path fallback.
//!
//! # Choosing a charger
//!
//! Given a path that becomes infeasible on link `k`:
//!
//! 1. Walk back over the nodes the vehicle actually reached, `k, k-1, …`,
//!    stopping at the most recent charging stop already on the path.  The
//!    first node with a charger open at the vehicle's arrival time wins;
//!    among several chargers there, the most powerful.
//! 2. Otherwise take the `max_candidates` chargers nearest to the start of
//!    link `k`, rank them by detour `d(a, c) + d(c, b) − d(a, b)` where
//!    `a → b` is link `k`, and return the first one the caller confirms
//!    reachable.  The arrival time at an off-path charger is only known once
//!    the leg to it is searched, so its opening hours are left to the
//!    caller's check.
//! 3. Otherwise fail with [`ChargingError::NoChargingOptionAvailable`].
//!
//! Chargers listed in [`Shortfall::used`] are never offered.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use ev_core::{ChargerId, LinkId, NodeId, VehicleId};
use ev_network::{PathCandidate, TransitNetwork};

use crate::charger::{ChargerSpec, ChargingOpportunity};
use crate::{ChargingError, ChargingResult};

/// Default number of spatial candidates offered to the reachability check.
pub const DEFAULT_MAX_CANDIDATES: usize = 8;

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct ChargerEntry {
    point: [f32; 2], // [lat, lon]
    slot:  usize,
}

impl RTreeObject for ChargerEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for ChargerEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── Query & result ────────────────────────────────────────────────────────────

/// Where and how a path ran out of charge.
#[derive(Copy, Clone, Debug)]
pub struct Shortfall<'a> {
    pub vehicle:       VehicleId,
    pub path:          &'a PathCandidate,
    /// Charge on arrival at each reached node of `path`.
    pub trace:         &'a [f64],
    /// Index of the first link the vehicle cannot complete.
    pub infeasible_at: usize,
    pub floor_kwh:     f64,
    /// Chargers the route already stops at.
    pub used:          &'a [ChargerId],
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Placement {
    /// The charger's node is `path.nodes[path_index]`.
    OnPath { path_index: usize },
    /// The charger is off the path; `detour_m` is the extra great-circle
    /// distance of visiting it.
    OffPath { detour_m: f64 },
}

#[derive(Copy, Clone, Debug)]
pub struct OpportunityMatch<'a> {
    pub opportunity: &'a ChargingOpportunity,
    pub placement:   Placement,
}

// ── ChargingInfrastructureIndex ───────────────────────────────────────────────

pub struct ChargingInfrastructureIndex {
    opportunities:  Vec<ChargingOpportunity>,
    by_id:          FxHashMap<ChargerId, usize>,
    by_node:        FxHashMap<NodeId, Vec<usize>>,
    by_link:        FxHashMap<LinkId, Vec<usize>>,
    spatial:        RTree<ChargerEntry>,
    max_candidates: usize,
}

impl ChargingInfrastructureIndex {
    /// Resolve `specs` against `network` and index them.
    ///
    /// Fails on unknown links, non-positive power, or repeated ids.
    pub fn build(
        network: &TransitNetwork,
        specs:   impl IntoIterator<Item = ChargerSpec>,
    ) -> ChargingResult<Self> {
        let mut opportunities = Vec::new();
        let mut by_id: FxHashMap<ChargerId, usize> = FxHashMap::default();
        let mut by_node: FxHashMap<NodeId, Vec<usize>> = FxHashMap::default();
        let mut by_link: FxHashMap<LinkId, Vec<usize>> = FxHashMap::default();

        for spec in specs {
            if spec.link.index() >= network.link_count() {
                return Err(ChargingError::UnknownLink { charger: spec.id, link: spec.link });
            }
            if !(spec.power_kw.is_finite() && spec.power_kw > 0.0) {
                return Err(ChargingError::InvalidCharger {
                    charger: spec.id,
                    reason:  format!("power must be positive, got {} kW", spec.power_kw),
                });
            }
            let slot = opportunities.len();
            if by_id.insert(spec.id, slot).is_some() {
                return Err(ChargingError::DuplicateCharger(spec.id));
            }

            let node = network.link_to[spec.link.index()];
            by_node.entry(node).or_default().push(slot);
            by_link.entry(spec.link).or_default().push(slot);
            opportunities.push(ChargingOpportunity {
                id:           spec.id,
                link:         spec.link,
                node,
                pos:          network.node_pos[node.index()],
                power_kw:     spec.power_kw,
                availability: spec.availability,
            });
        }

        let entries = opportunities
            .iter()
            .enumerate()
            .map(|(slot, o)| ChargerEntry { point: o.pos.as_array(), slot })
            .collect();

        log::debug!("indexed {} charging opportunities at {} nodes", opportunities.len(), by_node.len());

        Ok(Self {
            opportunities,
            by_id,
            by_node,
            by_link,
            spatial: RTree::bulk_load(entries),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        })
    }

    /// Limit the spatial fallback to the `n` nearest unused chargers.
    pub fn with_max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = n.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }

    pub fn get(&self, id: ChargerId) -> Option<&ChargingOpportunity> {
        self.by_id.get(&id).map(|&slot| &self.opportunities[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChargingOpportunity> {
        self.opportunities.iter()
    }

    /// Chargers whose stop node is `node`.
    pub fn at_node(&self, node: NodeId) -> impl Iterator<Item = &ChargingOpportunity> {
        self.slots(self.by_node.get(&node))
    }

    /// Chargers attached to `link`.
    pub fn on_link(&self, link: LinkId) -> impl Iterator<Item = &ChargingOpportunity> {
        self.slots(self.by_link.get(&link))
    }

    fn slots<'a>(&'a self, slots: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a ChargingOpportunity> {
        slots
            .into_iter()
            .flatten()
            .map(move |&slot| &self.opportunities[slot])
    }

    /// Pick a charger for a path that runs out of charge.  See the module
    /// docs for the search order.
    pub fn nearest_opportunity<F>(
        &self,
        network:          &TransitNetwork,
        shortfall:        &Shortfall<'_>,
        mut is_reachable: F,
    ) -> ChargingResult<OpportunityMatch<'_>>
    where
        F: FnMut(&ChargingOpportunity) -> bool,
    {
        let Shortfall { vehicle, path, trace, infeasible_at, floor_kwh, used } = *shortfall;
        let unused = |o: &&ChargingOpportunity| !used.contains(&o.id);
        let at_link = path.links.get(infeasible_at).copied().unwrap_or(LinkId::INVALID);
        let unavailable = ChargingError::NoChargingOptionAvailable { vehicle, at_link };
        if infeasible_at >= path.links.len() {
            return Err(unavailable);
        }

        // ── 1. on-path, scanning back from the failing link ───────────────
        let last_stop = path
            .charging_stops
            .iter()
            .map(|s| s.path_index)
            .filter(|&i| i <= infeasible_at)
            .max();
        let lowest = last_stop.map_or(0, |i| i + 1);

        for i in (lowest..=infeasible_at).rev() {
            let charge = trace.get(i).copied().unwrap_or(f64::NEG_INFINITY);
            if charge < floor_kwh {
                continue;
            }
            let arrival = path.node_times[i];
            let best = self
                .at_node(path.nodes[i])
                .filter(unused)
                .filter(|o| o.is_available_at(arrival))
                .max_by(|a, b| a.power_kw.total_cmp(&b.power_kw).then_with(|| b.id.cmp(&a.id)));
            if let Some(opportunity) = best {
                log::debug!("{vehicle}: on-path charger {} at path node {i}", opportunity.id);
                return Ok(OpportunityMatch { opportunity, placement: Placement::OnPath { path_index: i } });
            }
        }

        // ── 2. spatial fallback around the failing link ───────────────────
        let a = network.node_pos[path.nodes[infeasible_at].index()];
        let b = network.node_pos[path.nodes[infeasible_at + 1].index()];

        let mut candidates: Vec<(f64, &ChargingOpportunity)> = self
            .spatial
            .nearest_neighbor_iter(&a.as_array())
            .map(|e| &self.opportunities[e.slot])
            .filter(unused)
            .take(self.max_candidates)
            .map(|o| (a.detour_m(o.pos, b), o))
            .collect();
        candidates.sort_by(|x, y| x.0.total_cmp(&y.0).then_with(|| x.1.id.cmp(&y.1.id)));

        for (detour_m, opportunity) in candidates {
            if is_reachable(opportunity) {
                log::debug!("{vehicle}: off-path charger {} with {detour_m:.0} m detour", opportunity.id);
                return Ok(OpportunityMatch { opportunity, placement: Placement::OffPath { detour_m } });
            }
        }

        log::debug!("{vehicle}: no charging option before {at_link}");
        Err(unavailable)
    }
}

