//! Transit network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing links.
//! Given a `NodeId n`, its outgoing links occupy the `LinkId` range:
//!
//! ```text
//! node_out_start[n] .. node_out_start[n+1]
//! ```
//!
//! All link arrays are sorted by source node and indexed by `LinkId`, so the
//! search inner loop is a contiguous scan.  The network is immutable once
//! built and is shared between routing threads behind an `Arc`.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest `NodeId`, used
//! to snap stop and charger coordinates onto the graph.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use ev_core::{GeoPoint, LinkId, ModeSet, NodeId};

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f32; 2], // [lat, lon]
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space; adequate for snapping
    /// within a single metropolitan area.
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── Link ──────────────────────────────────────────────────────────────────────

/// Read-only view of one directed link, assembled from the CSR arrays.
///
/// This is the unit cost functions and energy models work on.  It is `Copy`
/// and holds no references, so it can be passed freely across the search.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Link {
    pub id:             LinkId,
    pub from:           NodeId,
    pub to:             NodeId,
    /// Physical length in metres.
    pub length_m:       f64,
    /// Free-flow (maximum) speed in m/s.
    pub free_speed_mps: f64,
    /// Rise over run; positive is uphill in the direction of travel.
    pub grade:          f64,
    pub modes:          ModeSet,
}

impl Link {
    /// Traversal time at free-flow speed.  The lower bound on any travel
    /// time a provider may report for this link.
    #[inline]
    pub fn free_flow_time_s(&self) -> f64 {
        if self.free_speed_mps > 0.0 {
            self.length_m / self.free_speed_mps
        } else {
            f64::INFINITY
        }
    }
}

/// Attributes of a link supplied to the builder.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkSpec {
    pub length_m:       f32,
    pub free_speed_mps: f32,
    pub grade:          f32,
    pub modes:          ModeSet,
}

impl LinkSpec {
    /// A flat link open to every mode.
    pub fn new(length_m: f32, free_speed_mps: f32) -> Self {
        Self { length_m, free_speed_mps, grade: 0.0, modes: ModeSet::ALL }
    }

    #[must_use]
    pub fn grade(mut self, grade: f32) -> Self {
        self.grade = grade;
        self
    }

    #[must_use]
    pub fn modes(mut self, modes: impl Into<ModeSet>) -> Self {
        self.modes = modes.into();
        self
    }

    /// The same link traversed in the opposite direction.
    fn reversed(self) -> Self {
        Self { grade: -self.grade, ..self }
    }
}

// ── TransitNetwork ────────────────────────────────────────────────────────────

/// Directed transit graph in CSR format plus a spatial index for snapping.
///
/// Fields are `pub` for direct indexed access on hot paths.  Construct with
/// [`TransitNetworkBuilder`].
pub struct TransitNetwork {
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// CSR row pointer, length `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Link data (indexed by LinkId) ─────────────────────────────────────
    pub link_from:           Vec<NodeId>,
    pub link_to:             Vec<NodeId>,
    pub link_length_m:       Vec<f32>,
    pub link_free_speed_mps: Vec<f32>,
    pub link_grade:          Vec<f32>,
    pub link_modes:          Vec<ModeSet>,

    spatial_idx: RTree<NodeEntry>,
}

impl TransitNetwork {
    pub fn empty() -> Self {
        TransitNetworkBuilder::new().build()
    }

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn link_count(&self) -> usize {
        self.link_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    /// Assemble the [`Link`] view for `id`.
    ///
    /// # Panics
    /// Panics if `id` is not a link of this network.
    #[inline]
    pub fn link(&self, id: LinkId) -> Link {
        let i = id.index();
        Link {
            id,
            from:           self.link_from[i],
            to:             self.link_to[i],
            length_m:       self.link_length_m[i] as f64,
            free_speed_mps: self.link_free_speed_mps[i] as f64,
            grade:          self.link_grade[i] as f64,
            modes:          self.link_modes[i],
        }
    }

    /// Iterator over the `LinkId`s of all outgoing links from `node`.
    #[inline]
    pub fn out_links(&self, node: NodeId) -> impl Iterator<Item = LinkId> + '_ {
        let start = self.node_out_start[node.index()];
        let end   = self.node_out_start[node.index() + 1];
        (start..end).map(LinkId)
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        (self.node_out_start[node.index() + 1] - self.node_out_start[node.index()]) as usize
    }

    /// First link from `from` to `to`, if any.  Used to attach chargers and
    /// fixtures to links by their endpoints.
    pub fn find_link(&self, from: NodeId, to: NodeId) -> Option<LinkId> {
        if !self.contains_node(from) {
            return None;
        }
        self.out_links(from).find(|l| self.link_to[l.index()] == to)
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Nearest node to `pos`; `None` only for an empty network.
    pub fn snap_to_node(&self, pos: GeoPoint) -> Option<NodeId> {
        self.spatial_idx
            .nearest_neighbor(&pos.as_array())
            .map(|e| e.id)
    }

    /// Up to `k` nearest nodes to `pos`, by ascending distance.
    pub fn k_nearest_nodes(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&pos.as_array())
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}

// ── TransitNetworkBuilder ─────────────────────────────────────────────────────

/// Construct a [`TransitNetwork`] incrementally, then call [`build`](Self::build).
///
/// Links may be added in any order.  `build()` sorts them by source node
/// (stable, so insertion order is kept among a node's links), assigns
/// `LinkId`s, constructs the CSR arrays and bulk-loads the R-tree.
///
/// # Example
///
/// ```
/// use ev_core::GeoPoint;
/// use ev_network::{LinkSpec, TransitNetworkBuilder};
///
/// let mut b = TransitNetworkBuilder::new();
/// let a = b.add_node(GeoPoint::new(43.54, -96.73));
/// let c = b.add_node(GeoPoint::new(43.55, -96.72));
/// b.add_road(a, c, LinkSpec::new(1_200.0, 13.4).grade(0.02));
/// let net = b.build();
/// assert_eq!(net.link_count(), 2); // bidirectional
/// ```
pub struct TransitNetworkBuilder {
    nodes:     Vec<GeoPoint>,
    raw_links: Vec<(NodeId, NodeId, LinkSpec)>,
}

impl TransitNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_links: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_links: Vec::with_capacity(links),
        }
    }

    /// Add a node and return its `NodeId` (sequential from 0).
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** link from `from` to `to`.
    pub fn add_link(&mut self, from: NodeId, to: NodeId, spec: LinkSpec) {
        self.raw_links.push((from, to, spec));
    }

    /// Add links in both directions; the return link gets the opposite grade.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, spec: LinkSpec) {
        self.add_link(a, b, spec);
        self.add_link(b, a, spec.reversed());
    }

    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn link_count(&self) -> usize { self.raw_links.len() }

    /// Consume the builder and produce a [`TransitNetwork`].
    ///
    /// O(E log E) for the link sort + O(N log N) for the R-tree bulk load.
    pub fn build(self) -> TransitNetwork {
        let node_count = self.nodes.len();

        let mut raw = self.raw_links;
        raw.sort_by_key(|(from, _, _)| from.0);

        let link_from:           Vec<NodeId>  = raw.iter().map(|l| l.0).collect();
        let link_to:             Vec<NodeId>  = raw.iter().map(|l| l.1).collect();
        let link_length_m:       Vec<f32>     = raw.iter().map(|l| l.2.length_m).collect();
        let link_free_speed_mps: Vec<f32>     = raw.iter().map(|l| l.2.free_speed_mps).collect();
        let link_grade:          Vec<f32>     = raw.iter().map(|l| l.2.grade).collect();
        let link_modes:          Vec<ModeSet> = raw.iter().map(|l| l.2.modes).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for (from, _, _) in &raw {
            node_out_start[from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry { point: pos.as_array(), id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        TransitNetwork {
            node_pos: self.nodes,
            node_out_start,
            link_from,
            link_to,
            link_length_m,
            link_free_speed_mps,
            link_grade,
            link_modes,
            spatial_idx,
        }
    }
}

impl Default for TransitNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
