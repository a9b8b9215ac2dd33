//! Unit tests for ev-network.
//!
//! All tests use hand-crafted networks and a time-only cost function.

#[cfg(test)]
mod helpers {
    use ev_core::{CoreResult, GeoPoint, ModeSet, NodeId, ProfileId, TransportMode, Vehicle, VehicleId};

    use crate::{CostFunction, Link, LinkSpec, TransitNetwork, TransitNetworkBuilder};

    /// Cost = free-flow travel time in seconds.
    pub struct FreeFlowCost;

    impl CostFunction for FreeFlowCost {
        fn link_travel_time(&self, link: &Link, _time: f64, _vehicle: &Vehicle) -> f64 {
            link.free_flow_time_s()
        }
        fn link_cost(&self, link: &Link, time: f64, vehicle: &Vehicle) -> CoreResult<f64> {
            Ok(self.link_travel_time(link, time, vehicle))
        }
        fn link_minimum_cost(&self, link: &Link) -> f64 {
            link.free_flow_time_s()
        }
    }

    /// Free-flow time doubled during the morning peak (07:00–09:00).
    pub struct PeakCost;

    impl CostFunction for PeakCost {
        fn link_travel_time(&self, link: &Link, time: f64, _vehicle: &Vehicle) -> f64 {
            let factor = if (25_200.0..32_400.0).contains(&time) { 2.0 } else { 1.0 };
            link.free_flow_time_s() * factor
        }
        fn link_cost(&self, link: &Link, time: f64, vehicle: &Vehicle) -> CoreResult<f64> {
            Ok(self.link_travel_time(link, time, vehicle))
        }
        fn link_minimum_cost(&self, link: &Link) -> f64 {
            link.free_flow_time_s()
        }
    }

    pub fn bus() -> Vehicle {
        Vehicle::new(VehicleId(1), ProfileId(0), 300.0, 300.0).unwrap()
    }

    /// Small grid, speeds 10 m/s everywhere.
    ///
    /// ```text
    ///   0 ── 1 ── 2
    ///   │         │
    ///   3 ─────── 4
    /// ```
    ///
    /// 0→1→2→4 = 300 m (30 s); 0→3→4 = 600 m (60 s).  Link 0-3 is rail-only.
    pub fn grid_network() -> (TransitNetwork, [NodeId; 5]) {
        let mut b = TransitNetworkBuilder::new();
        let n0 = b.add_node(GeoPoint::new(0.000, 0.000));
        let n1 = b.add_node(GeoPoint::new(0.000, 0.0009));
        let n2 = b.add_node(GeoPoint::new(0.000, 0.0018));
        let n3 = b.add_node(GeoPoint::new(0.0009, 0.000));
        let n4 = b.add_node(GeoPoint::new(0.0009, 0.0018));

        let bus = ModeSet::of(&[TransportMode::Bus, TransportMode::Car]);
        b.add_road(n0, n1, LinkSpec::new(100.0, 10.0).modes(bus));
        b.add_road(n1, n2, LinkSpec::new(100.0, 10.0).modes(bus));
        b.add_road(n2, n4, LinkSpec::new(100.0, 10.0).modes(bus));
        b.add_road(n0, n3, LinkSpec::new(500.0, 10.0).modes(TransportMode::Rail));
        b.add_road(n3, n4, LinkSpec::new(100.0, 10.0));

        (b.build(), [n0, n1, n2, n3, n4])
    }
}

// ── Builder & network structure ────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use ev_core::{GeoPoint, TransportMode};

    use crate::{LinkSpec, TransitNetworkBuilder};

    #[test]
    fn empty_build() {
        let net = TransitNetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.link_count(), 0);
        assert!(net.is_empty());
    }

    #[test]
    fn road_adds_reverse_link_with_opposite_grade() {
        let mut b = TransitNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(43.50, -96.70));
        let c = b.add_node(GeoPoint::new(43.51, -96.70));
        b.add_road(a, c, LinkSpec::new(1_000.0, 12.0).grade(0.03));
        let net = b.build();

        let up   = net.link(net.find_link(a, c).unwrap());
        let down = net.link(net.find_link(c, a).unwrap());
        assert!((up.grade - 0.03).abs() < 1e-6);
        assert!((down.grade + 0.03).abs() < 1e-6);
        assert_eq!(up.length_m, 1_000.0);
    }

    #[test]
    fn csr_out_links() {
        let (net, [n0, n1, n2, n3, n4]) = super::helpers::grid_network();
        assert_eq!(net.out_degree(n0), 2);
        assert_eq!(net.out_degree(n1), 2);
        assert_eq!(net.out_degree(n2), 2);
        assert_eq!(net.out_degree(n3), 2);
        assert_eq!(net.out_degree(n4), 2);
        for l in net.out_links(n0) {
            assert_eq!(net.link_from[l.index()], n0);
        }
    }

    #[test]
    fn link_view_carries_modes() {
        let (net, [n0, _, _, n3, _]) = super::helpers::grid_network();
        let rail = net.link(net.find_link(n0, n3).unwrap());
        assert!(rail.modes.contains(TransportMode::Rail));
        assert!(!rail.modes.contains(TransportMode::Bus));
        assert!((rail.free_flow_time_s() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn find_link_absent() {
        let (net, [n0, _, n2, ..]) = super::helpers::grid_network();
        assert!(net.find_link(n0, n2).is_none());
    }

    #[test]
    fn directed_only_link() {
        let mut b = TransitNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_link(a, c, LinkSpec::new(100.0, 10.0));
        let net = b.build();
        assert_eq!(net.link_count(), 1);
        assert_eq!(net.out_degree(c), 0);
    }
}

// ── Spatial snap ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use ev_core::GeoPoint;

    use crate::TransitNetworkBuilder;

    #[test]
    fn snap_nearest() {
        let (net, [n0, n1, ..]) = super::helpers::grid_network();
        assert_eq!(net.snap_to_node(GeoPoint::new(0.0, 0.0002)).unwrap(), n0);
        assert_eq!(net.snap_to_node(GeoPoint::new(0.0, 0.0007)).unwrap(), n1);
    }

    #[test]
    fn empty_network_returns_none() {
        let net = TransitNetworkBuilder::new().build();
        assert!(net.snap_to_node(GeoPoint::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn k_nearest_starts_with_exact_match() {
        let (net, nodes) = super::helpers::grid_network();
        let nearest = net.k_nearest_nodes(GeoPoint::new(0.0, 0.0), 2);
        assert_eq!(nearest[0], nodes[0]);
        assert!(nearest[1] == nodes[1] || nearest[1] == nodes[3]);
    }
}

// ── Per-mode cache ────────────────────────────────────────────────────────────

#[cfg(test)]
mod mode_cache {
    use std::sync::Arc;

    use ev_core::TransportMode;

    use crate::ModeNetworkCache;

    #[test]
    fn filters_links_by_mode() {
        let (net, [n0, ..]) = super::helpers::grid_network();
        let total = net.link_count();
        let cache = ModeNetworkCache::new(Arc::new(net));

        let bus = cache.view(TransportMode::Bus);
        // rail-only pair 0↔3 is excluded
        assert_eq!(bus.link_count(), total - 2);
        assert_eq!(bus.out_links(n0).count(), 1);

        let rail = cache.view(TransportMode::Rail);
        // 0↔3 rail-only plus 3↔4 open to all
        assert_eq!(rail.link_count(), 4);
    }

    #[test]
    fn slots_fill_lazily() {
        let (net, _) = super::helpers::grid_network();
        let cache = ModeNetworkCache::new(Arc::new(net));
        assert!(!cache.is_cached(TransportMode::Bus));
        let _ = cache.view(TransportMode::Bus);
        assert!(cache.is_cached(TransportMode::Bus));
        assert!(!cache.is_cached(TransportMode::Tram));
    }

    #[test]
    fn concurrent_first_access_sees_one_graph() {
        let (net, _) = super::helpers::grid_network();
        let cache = Arc::new(ModeNetworkCache::new(Arc::new(net)));

        let counts: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let cache = Arc::clone(&cache);
                    s.spawn(move || cache.view(TransportMode::Bus).link_count())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(counts.windows(2).all(|w| w[0] == w[1]));
    }
}

// ── Path search ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod search {
    use std::sync::Arc;

    use ev_core::{GeoPoint, NodeId, TransportMode};

    use super::helpers::{bus, grid_network, FreeFlowCost, PeakCost};
    use crate::{
        AStarSearch, DijkstraSearch, LinkSpec, ModeNetworkCache, PathSearch, SearchError,
        TransitNetworkBuilder,
    };

    #[test]
    fn trivial_same_node() {
        let (net, [n0, ..]) = grid_network();
        let cache = ModeNetworkCache::new(Arc::new(net));
        let p = DijkstraSearch
            .search(&cache.view(TransportMode::Bus), n0, n0, 100.0, &bus(), &FreeFlowCost)
            .unwrap();
        assert!(p.is_trivial());
        assert_eq!(p.cost, 0.0);
        assert_eq!(p.arrival_time(), 100.0);
    }

    #[test]
    fn shortest_path_correct() {
        let (net, [n0, n1, n2, _, n4]) = grid_network();
        let cache = ModeNetworkCache::new(Arc::new(net));
        let p = DijkstraSearch
            .search(&cache.view(TransportMode::Bus), n0, n4, 0.0, &bus(), &FreeFlowCost)
            .unwrap();

        assert!((p.cost - 30.0).abs() < 1e-9);
        assert_eq!(p.nodes, vec![n0, n1, n2, n4]);
        assert_eq!(p.links.len(), 3);
        assert_eq!(p.node_times, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(p.link_times, vec![10.0, 10.0, 10.0]);
        assert!((p.travel_time_s() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn mode_filter_changes_route() {
        let (net, [n0, _, _, n3, n4]) = grid_network();
        let cache = ModeNetworkCache::new(Arc::new(net));
        // Rail can only use 0→3→4.
        let p = DijkstraSearch
            .search(&cache.view(TransportMode::Rail), n0, n4, 0.0, &bus(), &FreeFlowCost)
            .unwrap();
        assert_eq!(p.nodes, vec![n0, n3, n4]);
        // Tram has only 3↔4.
        let err = DijkstraSearch
            .search(&cache.view(TransportMode::Tram), n0, n4, 0.0, &bus(), &FreeFlowCost)
            .unwrap_err();
        assert!(matches!(err, SearchError::NoRoute { mode: TransportMode::Tram, .. }));
    }

    #[test]
    fn unknown_node_rejected() {
        let (net, [n0, ..]) = grid_network();
        let cache = ModeNetworkCache::new(Arc::new(net));
        let err = DijkstraSearch
            .search(&cache.view(TransportMode::Bus), n0, NodeId(99), 0.0, &bus(), &FreeFlowCost)
            .unwrap_err();
        assert_eq!(err, SearchError::NodeNotFound(NodeId(99)));
    }

    #[test]
    fn directed_one_way_blocks_return() {
        let mut b = TransitNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 0.001));
        b.add_link(a, c, LinkSpec::new(100.0, 10.0));
        let cache = ModeNetworkCache::new(Arc::new(b.build()));
        let view = cache.view(TransportMode::Bus);
        assert!(DijkstraSearch.search(&view, a, c, 0.0, &bus(), &FreeFlowCost).is_ok());
        assert!(DijkstraSearch.search(&view, c, a, 0.0, &bus(), &FreeFlowCost).is_err());
    }

    #[test]
    fn astar_matches_dijkstra() {
        let (net, nodes) = grid_network();
        let cache = ModeNetworkCache::new(Arc::new(net));
        for mode in [TransportMode::Bus, TransportMode::Rail] {
            let view = cache.view(mode);
            for &from in &nodes {
                for &to in &nodes {
                    let d = DijkstraSearch.search(&view, from, to, 0.0, &bus(), &FreeFlowCost);
                    let a = AStarSearch.search(&view, from, to, 0.0, &bus(), &FreeFlowCost);
                    match (d, a) {
                        (Ok(d), Ok(a)) => assert!((d.cost - a.cost).abs() < 1e-9, "{from}->{to}"),
                        (Err(_), Err(_)) => {}
                        (d, a) => panic!("{from}->{to}: dijkstra {d:?} vs astar {a:?}"),
                    }
                }
            }
        }
    }

    #[test]
    fn departure_time_shapes_cost() {
        let (net, [n0, _, _, _, n4]) = grid_network();
        let cache = ModeNetworkCache::new(Arc::new(net));
        let view = cache.view(TransportMode::Bus);
        let off_peak = DijkstraSearch.search(&view, n0, n4, 3_600.0, &bus(), &PeakCost).unwrap();
        let peak     = DijkstraSearch.search(&view, n0, n4, 27_000.0, &bus(), &PeakCost).unwrap();
        assert!((off_peak.cost - 30.0).abs() < 1e-9);
        assert!((peak.cost - 60.0).abs() < 1e-9);
        assert!((peak.arrival_time() - 27_060.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_search_is_identical() {
        let (net, [n0, _, _, _, n4]) = grid_network();
        let cache = ModeNetworkCache::new(Arc::new(net));
        let view = cache.view(TransportMode::Bus);
        let first  = AStarSearch.search(&view, n0, n4, 0.0, &bus(), &FreeFlowCost).unwrap();
        let second = AStarSearch.search(&view, n0, n4, 0.0, &bus(), &FreeFlowCost).unwrap();
        assert_eq!(first, second);
    }
}

// ── Path stitching ────────────────────────────────────────────────────────────

#[cfg(test)]
mod path {
    use ev_core::{ChargerId, LinkId, NodeId};

    use crate::{ChargingStop, PathCandidate};

    fn leg(nodes: &[u32], start: f64, step: f64) -> PathCandidate {
        let nodes: Vec<NodeId> = nodes.iter().map(|&n| NodeId(n)).collect();
        let links: Vec<LinkId> = (0..nodes.len() as u32 - 1).map(LinkId).collect();
        let node_times = (0..nodes.len()).map(|i| start + i as f64 * step).collect();
        PathCandidate {
            link_times: vec![step; links.len()],
            cost: step * links.len() as f64,
            energy_kwh: 1.0,
            charging_stops: Vec::new(),
            links,
            nodes,
            node_times,
        }
    }

    #[test]
    fn stitch_joins_legs_at_waypoint() {
        let first  = leg(&[0, 1, 2], 0.0, 10.0);
        let second = leg(&[2, 3], 620.0, 10.0);
        let stop = ChargingStop {
            charger:           ChargerId(7),
            node:              NodeId(2),
            path_index:        0,
            arrival_time:      20.0,
            dwell_s:           600.0,
            charge_before_kwh: 1.0,
            charge_after_kwh:  9.0,
        };
        let p = PathCandidate::stitch(first, stop, 5.0, second);

        assert_eq!(p.nodes, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(p.links.len(), 3);
        assert_eq!(p.charging_stops[0].path_index, 2);
        assert!((p.cost - (20.0 + 5.0 + 10.0)).abs() < 1e-9);
        assert!((p.energy_kwh - 2.0).abs() < 1e-9);
        assert!((p.arrival_time() - 630.0).abs() < 1e-9);
    }

    #[test]
    fn join_adds_no_stop_or_penalty() {
        let first  = leg(&[0, 1, 2], 0.0, 10.0);
        let second = leg(&[2, 3], 20.0, 10.0);
        let p = PathCandidate::join(first, second);

        assert_eq!(p.nodes, vec![NodeId(0), NodeId(1), NodeId(2), NodeId(3)]);
        assert!(p.charging_stops.is_empty());
        assert!((p.cost - 30.0).abs() < 1e-9);
        assert!((p.arrival_time() - 30.0).abs() < 1e-9);
    }
}
