//! Per-mode filtered sub-networks.
//!
//! Filtering the network down to the links a mode may use is expensive and
//! mode-invariant, so each mode's filtered adjacency is computed once and
//! shared.  The cache is a fixed array of [`OnceLock`], one slot per
//! [`TransportMode`]: the first caller for a mode runs the filter while any
//! concurrent caller for the same mode blocks on that slot, and every later
//! read is a lock-free load.
//!
//! The filtered graph keeps the parent network's `NodeId`s and `LinkId`s; it
//! only stores a CSR adjacency of the permitted links, so paths found on a
//! sub-network need no id translation.

use std::sync::{Arc, OnceLock};

use ev_core::{LinkId, NodeId, TransportMode};

use crate::network::TransitNetwork;

/// CSR adjacency restricted to the links one mode may traverse.
#[derive(Debug)]
pub struct ModeGraph {
    out_start: Vec<u32>,
    out_links: Vec<LinkId>,
}

impl ModeGraph {
    fn filter(network: &TransitNetwork, mode: TransportMode) -> Self {
        let n = network.node_count();
        let mut out_start = Vec::with_capacity(n + 1);
        let mut out_links = Vec::new();
        out_start.push(0u32);

        for node in 0..n as u32 {
            out_links.extend(
                network
                    .out_links(NodeId(node))
                    .filter(|l| network.link_modes[l.index()].contains(mode)),
            );
            out_start.push(out_links.len() as u32);
        }

        log::debug!(
            "filtered {mode} sub-network: {} of {} links",
            out_links.len(),
            network.link_count()
        );
        Self { out_start, out_links }
    }
}

// ── ModeNetworkCache ──────────────────────────────────────────────────────────

/// Shared network plus lazily built per-mode sub-networks.
///
/// `Send + Sync`; wrap in an `Arc` and hand one to every routing thread.
pub struct ModeNetworkCache {
    network: Arc<TransitNetwork>,
    slots:   [OnceLock<ModeGraph>; TransportMode::COUNT],
}

impl ModeNetworkCache {
    pub fn new(network: Arc<TransitNetwork>) -> Self {
        Self {
            network,
            slots: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    pub fn network(&self) -> &TransitNetwork {
        &self.network
    }

    pub fn shared_network(&self) -> Arc<TransitNetwork> {
        Arc::clone(&self.network)
    }

    /// Sub-network for `mode`, filtering it on first access.
    pub fn view(&self, mode: TransportMode) -> ModeView<'_> {
        let graph = self.slots[mode.index()].get_or_init(|| ModeGraph::filter(&self.network, mode));
        ModeView { network: &self.network, graph, mode }
    }

    /// `true` once the sub-network for `mode` has been built.
    pub fn is_cached(&self, mode: TransportMode) -> bool {
        self.slots[mode.index()].get().is_some()
    }
}

// ── ModeView ──────────────────────────────────────────────────────────────────

/// A borrowed view of the network as seen by one transport mode.
#[derive(Copy, Clone)]
pub struct ModeView<'a> {
    pub network: &'a TransitNetwork,
    pub mode:    TransportMode,
    graph:       &'a ModeGraph,
}

impl<'a> ModeView<'a> {
    pub fn node_count(&self) -> usize {
        self.network.node_count()
    }

    /// Number of links usable by this mode.
    pub fn link_count(&self) -> usize {
        self.graph.out_links.len()
    }

    /// Outgoing links of `node` that this mode may traverse.
    #[inline]
    pub fn out_links(&self, node: NodeId) -> impl Iterator<Item = LinkId> + 'a {
        let graph = self.graph;
        let start = graph.out_start[node.index()] as usize;
        let end   = graph.out_start[node.index() + 1] as usize;
        graph.out_links[start..end].iter().copied()
    }

    /// All links usable by this mode.
    pub fn links(&self) -> impl Iterator<Item = LinkId> + 'a {
        let graph = self.graph;
        graph.out_links.iter().copied()
    }
}
