//! Least-cost path search over a mode sub-network.
//!
//! # Pluggability
//!
//! The router talks to the search only through [`PathSearch`] and supplies
//! edge weights through [`CostFunction`], so a contraction hierarchy or a
//! landmark search can replace the defaults without touching the router.
//!
//! # Time dependence
//!
//! Costs may depend on the time a link is entered.  Each search label
//! carries the arrival time at its node, and a link is costed at that time
//! (label-setting time-dependent Dijkstra).
//!
//! # Heuristic
//!
//! [`AStarSearch`] derives an admissible, consistent heuristic from
//! [`CostFunction::link_minimum_cost`]:
//!
//! ```text
//! rate  = min over links (minimum_cost(link) / great_circle(from, to))
//! h(n)  = rate × great_circle(n, target)
//! ```
//!
//! Any path from `n` to the target costs at least the sum of its links'
//! minimum costs, which is at least `rate` times the sum of their
//! great-circle spans, which by the triangle inequality is at least
//! `rate × great_circle(n, target)`.  This holds whatever the stored link
//! lengths are.
//!
//! Finding `rate` scans every link of the mode, so cost functions that serve
//! one network may cache it by overriding [`CostFunction::heuristic_rate`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ev_core::{CoreResult, LinkId, NodeId, Vehicle};

use crate::mode_cache::ModeView;
use crate::network::Link;
use crate::path::PathCandidate;
use crate::{SearchError, SearchResult};

// ── CostFunction ──────────────────────────────────────────────────────────────

/// Edge-weight oracle for the search.
///
/// # Contract
///
/// - `link_cost` is non-negative and finite for traversable links.
/// - `link_minimum_cost(link) ≤ link_cost(link, t, v)` for every `t`, `v`.
pub trait CostFunction: Send + Sync {
    /// Seconds to traverse `link` when entering it at `time`.
    fn link_travel_time(&self, link: &Link, time: f64, vehicle: &Vehicle) -> f64;

    /// Disutility of traversing `link` when entering it at `time`.
    fn link_cost(&self, link: &Link, time: f64, vehicle: &Vehicle) -> CoreResult<f64>;

    /// Admissible lower bound of [`link_cost`](Self::link_cost) over all
    /// times and vehicles.
    fn link_minimum_cost(&self, link: &Link) -> f64;

    /// Disutility of stopping for `dwell_s` seconds at a waypoint.
    fn dwell_cost(&self, _dwell_s: f64) -> f64 {
        0.0
    }

    /// Cost per metre of great-circle distance that no path on `graph` can
    /// undercut.  Recomputed on every call unless overridden.
    fn heuristic_rate(&self, graph: &ModeView<'_>) -> f64 {
        minimum_cost_rate(graph, self)
    }
}

// ── PathSearch ────────────────────────────────────────────────────────────────

/// Pluggable least-cost path engine.
///
/// Implementations must be `Send + Sync`: one instance is shared by every
/// routing thread.
pub trait PathSearch: Send + Sync {
    /// Minimum-cost path from `from` to `to` departing at `departure_time`.
    ///
    /// `from == to` yields a trivial path.  A disconnected pair yields
    /// [`SearchError::NoRoute`].
    fn search(
        &self,
        graph:          &ModeView<'_>,
        from:           NodeId,
        to:             NodeId,
        departure_time: f64,
        vehicle:        &Vehicle,
        cost:           &dyn CostFunction,
    ) -> SearchResult<PathCandidate>;
}

/// Plain time-dependent Dijkstra.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraSearch;

impl PathSearch for DijkstraSearch {
    fn search(
        &self,
        graph:          &ModeView<'_>,
        from:           NodeId,
        to:             NodeId,
        departure_time: f64,
        vehicle:        &Vehicle,
        cost:           &dyn CostFunction,
    ) -> SearchResult<PathCandidate> {
        least_cost_path(graph, from, to, departure_time, vehicle, cost, |_| 0.0)
    }
}

/// A* guided by the great-circle lower bound described in the module docs.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarSearch;

impl PathSearch for AStarSearch {
    fn search(
        &self,
        graph:          &ModeView<'_>,
        from:           NodeId,
        to:             NodeId,
        departure_time: f64,
        vehicle:        &Vehicle,
        cost:           &dyn CostFunction,
    ) -> SearchResult<PathCandidate> {
        let network = graph.network;
        if !network.contains_node(to) {
            return Err(SearchError::NodeNotFound(to));
        }
        let rate   = cost.heuristic_rate(graph);
        let target = network.node_pos[to.index()];
        least_cost_path(graph, from, to, departure_time, vehicle, cost, |n: NodeId| {
            rate * network.node_pos[n.index()].distance_m(target)
        })
    }
}

/// Smallest ratio of minimum link cost to great-circle span over the graph.
///
/// Shrunk by a relative epsilon so rounding in the haversine can never make
/// the heuristic overestimate.
pub fn minimum_cost_rate<C: CostFunction + ?Sized>(graph: &ModeView<'_>, cost: &C) -> f64 {
    let network = graph.network;
    let rate = graph
        .links()
        .filter_map(|id| {
            let link = network.link(id);
            let span = network.node_pos[link.from.index()].distance_m(network.node_pos[link.to.index()]);
            (span > 1e-3).then(|| cost.link_minimum_cost(&link) / span)
        })
        .filter(|r| r.is_finite())
        .fold(f64::INFINITY, f64::min);

    if rate.is_finite() { (rate * (1.0 - 1e-9)).max(0.0) } else { 0.0 }
}

// ── Search internals ──────────────────────────────────────────────────────────

/// Heap entry ordered so that `BinaryHeap` pops the smallest priority first;
/// ties break on the smaller `NodeId` for deterministic output.
#[derive(Copy, Clone, Debug)]
struct QueueEntry {
    priority: f64,
    cost:     f64,
    node:     NodeId,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.node.cmp(&self.node))
    }
}

fn least_cost_path(
    graph:          &ModeView<'_>,
    from:           NodeId,
    to:             NodeId,
    departure_time: f64,
    vehicle:        &Vehicle,
    cost:           &dyn CostFunction,
    heuristic:      impl Fn(NodeId) -> f64,
) -> SearchResult<PathCandidate> {
    let network = graph.network;
    for node in [from, to] {
        if !network.contains_node(node) {
            return Err(SearchError::NodeNotFound(node));
        }
    }
    if from == to {
        return Ok(PathCandidate::trivial(from, departure_time));
    }

    let n = network.node_count();
    // best[v] = least known cost to reach v; time[v] = arrival time on that label.
    let mut best      = vec![f64::INFINITY; n];
    let mut time      = vec![departure_time; n];
    let mut prev_link = vec![LinkId::INVALID; n];

    best[from.index()] = 0.0;
    let mut heap = BinaryHeap::new();
    heap.push(QueueEntry { priority: heuristic(from), cost: 0.0, node: from });

    while let Some(QueueEntry { cost: reached, node, .. }) = heap.pop() {
        if node == to {
            return Ok(reconstruct(graph, &prev_link, &time, from, to, reached));
        }
        // Stale entry.
        if reached > best[node.index()] {
            continue;
        }

        let now = time[node.index()];
        for id in graph.out_links(node) {
            let link = network.link(id);
            let next = link.to.index();
            let new_cost = reached + cost.link_cost(&link, now, vehicle)?;

            if new_cost < best[next] {
                best[next]      = new_cost;
                time[next]      = now + cost.link_travel_time(&link, now, vehicle);
                prev_link[next] = id;
                heap.push(QueueEntry {
                    priority: new_cost + heuristic(link.to),
                    cost:     new_cost,
                    node:     link.to,
                });
            }
        }
    }

    Err(SearchError::NoRoute { from, to, mode: graph.mode })
}

fn reconstruct(
    graph:     &ModeView<'_>,
    prev_link: &[LinkId],
    time:      &[f64],
    from:      NodeId,
    to:        NodeId,
    total:     f64,
) -> PathCandidate {
    let network = graph.network;
    let mut links = Vec::new();
    let mut cur = to;
    while cur != from {
        let id = prev_link[cur.index()];
        links.push(id);
        cur = network.link_from[id.index()];
    }
    links.reverse();

    let mut nodes = Vec::with_capacity(links.len() + 1);
    nodes.push(from);
    nodes.extend(links.iter().map(|l| network.link_to[l.index()]));

    let node_times: Vec<f64> = nodes.iter().map(|n| time[n.index()]).collect();
    let link_times: Vec<f64> = node_times.windows(2).map(|w| w[1] - w[0]).collect();

    PathCandidate {
        links,
        nodes,
        node_times,
        link_times,
        cost: total,
        energy_kwh: 0.0,
        charging_stops: Vec::new(),
    }
}
