//! Synthetic riverside corridor.
//!
//! Seven stops along a bus trunk with a hill between Westgate and Hillcrest,
//! a short tram shuttle between Midtown and Harbor, and a depot yard on a
//! spur off Midtown.

use ev_charging::{AvailabilityWindow, ChargerSpec};
use ev_core::{ChargerId, GeoPoint, ModeSet, NodeId, TransportMode};
use ev_network::{LinkSpec, TransitNetwork, TransitNetworkBuilder};

/// Named stops, in `add_node` order.
pub struct Stops {
    pub depot:     NodeId,
    pub westgate:  NodeId,
    pub hillcrest: NodeId,
    pub midtown:   NodeId,
    pub harbor:    NodeId,
    pub airport:   NodeId,
    pub yard:      NodeId,
}

const BUS_SPEED_MPS:  f32 = 12.5; // 45 km/h
const TRAM_SPEED_MPS: f32 = 11.0;

pub fn build_network() -> (TransitNetwork, Stops) {
    let mut b = TransitNetworkBuilder::with_capacity(7, 18);

    let stops = Stops {
        depot:     b.add_node(GeoPoint::new(30.640, -88.100)),
        westgate:  b.add_node(GeoPoint::new(30.660, -88.085)),
        hillcrest: b.add_node(GeoPoint::new(30.685, -88.070)),
        midtown:   b.add_node(GeoPoint::new(30.695, -88.050)),
        harbor:    b.add_node(GeoPoint::new(30.690, -88.030)),
        airport:   b.add_node(GeoPoint::new(30.720, -88.010)),
        yard:      b.add_node(GeoPoint::new(30.702, -88.042)),
    };

    let road_modes = ModeSet::of(&[TransportMode::Bus, TransportMode::Car]);
    let road = |len: f32| LinkSpec::new(len, BUS_SPEED_MPS).modes(road_modes);

    b.add_road(stops.depot,     stops.westgate,  road(2_600.0));
    b.add_road(stops.westgate,  stops.hillcrest, road(3_200.0).grade(0.03));
    b.add_road(stops.hillcrest, stops.midtown,   road(2_300.0).grade(-0.01));
    b.add_road(stops.midtown,   stops.harbor,    road(2_000.0));
    b.add_road(stops.harbor,    stops.airport,   road(4_600.0));
    b.add_road(stops.midtown,   stops.yard,      road(1_100.0));
    b.add_road(stops.yard,      stops.harbor,    road(1_300.0));

    b.add_road(
        stops.midtown,
        stops.harbor,
        LinkSpec::new(1_900.0, TRAM_SPEED_MPS).modes(TransportMode::Tram),
    );

    (b.build(), stops)
}

/// Default chargers: a fast charger at the yard (reached from Midtown) and a
/// night-only depot charger.
pub fn default_chargers(network: &TransitNetwork, stops: &Stops) -> anyhow::Result<Vec<ChargerSpec>> {
    let link = |from: NodeId, to: NodeId| {
        network
            .find_link(from, to)
            .ok_or_else(|| anyhow::anyhow!("no link {from} → {to}"))
    };

    Ok(vec![
        ChargerSpec::new(ChargerId(1), link(stops.midtown, stops.yard)?, 150.0),
        ChargerSpec::new(ChargerId(2), link(stops.westgate, stops.depot)?, 50.0)
            .available(AvailabilityWindow::new(79_200.0, 21_600.0)),
    ])
}
