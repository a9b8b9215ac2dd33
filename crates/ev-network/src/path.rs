//! Candidate paths produced by the search and stitched by the router.

use ev_core::{ChargerId, LinkId, NodeId};

/// A charging stop inserted into a path at a waypoint.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargingStop {
    pub charger:           ChargerId,
    pub node:              NodeId,
    /// Index into [`PathCandidate::nodes`] where the stop happens.
    pub path_index:        usize,
    /// Arrival time at the charger, seconds since midnight.
    pub arrival_time:      f64,
    pub dwell_s:           f64,
    pub charge_before_kwh: f64,
    pub charge_after_kwh:  f64,
}

/// An ordered sequence of links with per-link timing and accumulated totals.
///
/// `nodes` has one more entry than `links`; `nodes[i]` is the start of
/// `links[i]`.  `node_times[i]` is the arrival time at `nodes[i]` (for a
/// charging waypoint, the time before the dwell starts).  `link_times[i]` is
/// the traversal time of `links[i]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathCandidate {
    pub links:          Vec<LinkId>,
    pub nodes:          Vec<NodeId>,
    pub node_times:     Vec<f64>,
    pub link_times:     Vec<f64>,
    /// Total disutility, including charging-stop costs.
    pub cost:           f64,
    /// Energy drawn from the battery along the whole path (kWh).  Filled in
    /// by feasibility validation; zero for a freshly searched path.
    pub energy_kwh:     f64,
    pub charging_stops: Vec<ChargingStop>,
}

impl PathCandidate {
    /// The empty path of a trip whose origin is its destination.
    pub fn trivial(node: NodeId, departure_time: f64) -> Self {
        Self {
            links:          Vec::new(),
            nodes:          vec![node],
            node_times:     vec![departure_time],
            link_times:     Vec::new(),
            cost:           0.0,
            energy_kwh:     0.0,
            charging_stops: Vec::new(),
        }
    }

    pub fn is_trivial(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn origin(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn destination(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn departure_time(&self) -> f64 {
        self.node_times[0]
    }

    /// Arrival time at the destination, including any charging dwell.
    pub fn arrival_time(&self) -> f64 {
        let dwell: f64 = self.charging_stops.iter().map(|s| s.dwell_s).sum();
        self.departure_time() + self.link_times.iter().sum::<f64>() + dwell
    }

    /// Door-to-door travel time in seconds, including charging dwell.
    pub fn travel_time_s(&self) -> f64 {
        self.arrival_time() - self.departure_time()
    }

    /// Join two legs at a charging waypoint.
    ///
    /// `second` must start at `first`'s destination, which is `stop.node`.
    /// `stop_cost` is the disutility of the stop itself (penalty + dwell).
    pub fn stitch(first: PathCandidate, mut stop: ChargingStop, stop_cost: f64, second: PathCandidate) -> Self {
        debug_assert_eq!(first.destination(), stop.node);

        stop.path_index = first.links.len();
        let mut first = first;
        first.cost += stop_cost;
        first.charging_stops.push(stop);
        Self::join(first, second)
    }

    /// Append `second`, which must start at `first`'s destination, with no
    /// stop in between.
    pub fn join(first: PathCandidate, second: PathCandidate) -> Self {
        debug_assert_eq!(first.destination(), second.origin());

        let offset = first.links.len();
        let mut out = first;
        out.links.extend_from_slice(&second.links);
        out.nodes.extend_from_slice(&second.nodes[1..]);
        out.node_times.extend_from_slice(&second.node_times[1..]);
        out.link_times.extend_from_slice(&second.link_times);
        out.cost += second.cost;
        out.energy_kwh += second.energy_kwh;
        out.charging_stops.extend(second.charging_stops.into_iter().map(|mut s| {
            s.path_index += offset;
            s
        }));
        out
    }
}
