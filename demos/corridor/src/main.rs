//! corridor: energy-aware routing on a small synthetic transit corridor.
//!
//! Routes a handful of bus, tram and car trips, some of them on buses that
//! leave the depot with too little charge to finish without a detour.
//!
//! ```text
//! corridor [settings.toml] [chargers.csv]
//! ```
//!
//! Set `RUST_LOG=debug` to watch the detour decisions.

mod network;

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use ev_charging::load_chargers_csv;
use ev_core::{ModeSet, ProfileId, TransportMode, Vehicle, VehicleId};
use ev_energy::{
    Climate, CostWeights, DistanceFare, MarginalUtilities, TimeOfDayTravelTime, load_fleet_reader,
};
use ev_router::{ModeRoutingConfig, RouteError, RouteRequest, RoutingRegistry, RoutingSettings};

use network::{build_network, default_chargers};

// ── Fleet CSV ─────────────────────────────────────────────────────────────────

// Profile 0 = 12 m electric bus, 1 = electric feeder car.
const PROFILES_CSV: &str = "\
profile_id,mass_kg,drag_coef,frontal_area_m2,rolling_resistance,drivetrain_efficiency,regen_efficiency,aux_base_kw,hvac_kw_per_deg_c\n\
0,15000,0.7,8.0,0.008,0.85,0.6,3.0,0.6\n\
1,1800,0.28,2.3,0.009,0.9,0.65,0.3,0.1\n\
";

const VEHICLES_CSV: &str = "\
vehicle_id,profile_id,battery_capacity_kwh\n\
100,0,150\n\
101,0,150\n\
102,0,150\n\
200,1,60\n\
";

/// A diesel shuttle: not in the electric fleet.
const DIESEL_SHUTTLE: VehicleId = VehicleId(900);

// ── Time-of-day congestion ────────────────────────────────────────────────────

const HOURLY_CONGESTION: [f64; 24] = [
    1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.1, 1.4, 1.5, 1.2, 1.1, 1.1, // 00–11
    1.2, 1.1, 1.1, 1.2, 1.4, 1.5, 1.3, 1.1, 1.0, 1.0, 1.0, 1.0, // 12–23
];

const HOUR: f64 = 3600.0;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let settings = match args.get(1) {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            toml::from_str::<RoutingSettings>(&text).with_context(|| format!("parsing {path}"))?
        }
        None => RoutingSettings::default(),
    };

    // 1. Network and stops.
    let (network, stops) = build_network();
    println!("=== corridor — energy-aware transit routing ===");
    println!("Network: {} nodes, {} links", network.node_count(), network.link_count());

    // 2. Fleet and chargers.
    let fleet = load_fleet_reader(Cursor::new(PROFILES_CSV), Cursor::new(VEHICLES_CSV))?;
    println!("Fleet: {} profiles, {} electric vehicles", fleet.profile_count(), fleet.vehicle_count());

    let chargers = match args.get(2) {
        Some(path) => load_chargers_csv(Path::new(path))?,
        None => default_chargers(&network, &stops)?,
    };
    println!("Chargers: {}", chargers.len());
    println!(
        "Settings: max_detours={}  reserve={:.0}%  charge to {:.0}%",
        settings.max_detours,
        settings.reserve_fraction * 100.0,
        settings.charging.target_soc_fraction * 100.0
    );
    println!();

    // 3. Per-mode bindings.
    let bus_weights = CostWeights::from_marginal_utilities(MarginalUtilities {
        travel_time_per_s: -6.0 / HOUR,
        energy_per_kwh:    -0.25,
        money:             1.0,
        waiting_per_s:     -3.0 / HOUR,
        transfer:          -0.5,
    })?;
    let bus = ModeRoutingConfig::new(Arc::new(TimeOfDayTravelTime::hourly(HOURLY_CONGESTION)?), bus_weights)
        .with_fare(Arc::new(DistanceFare::flat(0.12).with_peak(1.5, vec![(7.0 * HOUR, 9.0 * HOUR)])));
    let tram = ModeRoutingConfig::free_flow(CostWeights::default());
    let car = ModeRoutingConfig::new(
        Arc::new(TimeOfDayTravelTime::hourly(HOURLY_CONGESTION)?),
        CostWeights { energy_per_kwh: 0.3, ..CostWeights::default() },
    );

    let registry = RoutingRegistry::builder(Arc::new(network), Arc::new(fleet.clone()))
        .settings(settings)
        .climate(Climate { ambient_temp_c: 4.0, comfort_temp_c: 20.0 })
        .mode(TransportMode::Bus, bus)
        .mode(TransportMode::Tram, tram)
        .mode(TransportMode::Car, car)
        .chargers(chargers)
        .require(ModeSet::of(&[TransportMode::Bus, TransportMode::Tram, TransportMode::Car]))
        .build()?;

    // 4. Trips.
    let shuttle = Vehicle::new(DIESEL_SHUTTLE, ProfileId(0), 0.0, 0.0)?;
    let request = |mode, origin, destination, hour: f64, vehicle| RouteRequest {
        mode,
        origin,
        destination,
        departure_time: hour * HOUR,
        vehicle,
    };
    let requests = vec![
        request(TransportMode::Bus, stops.depot, stops.airport, 6.5, fleet.vehicle(VehicleId(100), 120.0)?),
        request(TransportMode::Bus, stops.depot, stops.airport, 8.0, fleet.vehicle(VehicleId(101), 12.0)?),
        request(TransportMode::Bus, stops.airport, stops.depot, 17.0, fleet.vehicle(VehicleId(102), 4.0)?),
        request(TransportMode::Tram, stops.midtown, stops.harbor, 8.0, shuttle.clone()),
        request(TransportMode::Car, stops.hillcrest, stops.airport, 8.0, fleet.vehicle(VehicleId(200), 30.0)?),
        request(TransportMode::Car, stops.depot, stops.harbor, 12.0, shuttle),
    ];

    let t0 = Instant::now();
    let results = registry.route_all(&requests);
    let elapsed = t0.elapsed();

    // 5. Summary.
    println!(
        "{:<8} {:<6} {:<10} {:>8} {:>6} {:>10} {:>9}",
        "Vehicle", "Mode", "O → D", "Depart", "Stops", "Energy", "Arrive"
    );
    println!("{}", "-".repeat(64));
    for (req, result) in requests.iter().zip(&results) {
        let od = format!("{}→{}", req.origin.0, req.destination.0);
        match result {
            Ok(path) => println!(
                "{:<8} {:<6} {:<10} {:>8} {:>6} {:>7.2} kWh {:>9}",
                req.vehicle.id.0,
                req.mode,
                od,
                clock(req.departure_time),
                path.charging_stops.len(),
                path.energy_kwh,
                clock(path.arrival_time()),
            ),
            Err(RouteError::RouteInfeasible { infeasible_at, .. }) => println!(
                "{:<8} {:<6} {:<10} {:>8}  infeasible at link index {infeasible_at}",
                req.vehicle.id.0,
                req.mode,
                od,
                clock(req.departure_time),
            ),
            Err(e) => println!(
                "{:<8} {:<6} {:<10} {:>8}  {e}",
                req.vehicle.id.0,
                req.mode,
                od,
                clock(req.departure_time),
            ),
        }
    }
    println!();
    println!("Routed {} trips in {:.3} ms", requests.len(), elapsed.as_secs_f64() * 1e3);

    for (req, path) in requests.iter().zip(&results).filter_map(|(r, p)| p.as_ref().ok().map(|p| (r, p))) {
        for stop in &path.charging_stops {
            log::info!(
                "vehicle {}: charger {} at node {} {} for {:.0} s, {:.1} → {:.1} kWh",
                req.vehicle.id,
                stop.charger,
                stop.node,
                clock(stop.arrival_time),
                stop.dwell_s,
                stop.charge_before_kwh,
                stop.charge_after_kwh,
            );
        }
    }

    Ok(())
}

/// `HH:MM` for seconds since midnight.
fn clock(t: f64) -> String {
    let minutes = (t / 60.0).round() as i64;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
