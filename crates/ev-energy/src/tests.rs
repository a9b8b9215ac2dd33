//! Unit tests for ev-energy.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use ev_core::{CoreResult, LinkId, ModeSet, NodeId, ProfileId, Vehicle, VehicleId};
    use ev_network::Link;

    use crate::{ElectricVehicleSpec, EnergyConsumption, FleetSpecification, LinkEnergy, PowertrainProfile};

    pub const BUS: VehicleId = VehicleId(1);
    pub const DIESEL: VehicleId = VehicleId(99);

    /// One bus profile, one electric bus with a 350 kWh pack.
    pub fn fleet() -> Arc<FleetSpecification> {
        let mut fleet = FleetSpecification::new();
        fleet.add_profile(ProfileId(0), PowertrainProfile::electric_bus()).unwrap();
        fleet
            .add_vehicle(ElectricVehicleSpec { id: BUS, profile: ProfileId(0), battery_capacity_kwh: 350.0 })
            .unwrap();
        Arc::new(fleet)
    }

    pub fn electric_bus(soc_kwh: f64) -> Vehicle {
        Vehicle::new(BUS, ProfileId(0), 350.0, soc_kwh).unwrap()
    }

    /// A vehicle outside the electric fleet.
    pub fn diesel_bus() -> Vehicle {
        Vehicle::new(DIESEL, ProfileId(0), 0.0, 0.0).unwrap()
    }

    pub fn link(length_m: f64, free_speed_mps: f64, grade: f64) -> Link {
        Link {
            id: LinkId(0),
            from: NodeId(0),
            to: NodeId(1),
            length_m,
            free_speed_mps,
            grade,
            modes: ModeSet::ALL,
        }
    }

    /// Linear model: a fixed number of kWh per kilometre, no auxiliary load.
    pub struct PerKmEnergy(pub f64);

    impl EnergyConsumption for PerKmEnergy {
        fn consumption(&self, link: &Link, _t: f64, _v: &Vehicle) -> CoreResult<LinkEnergy> {
            Ok(LinkEnergy { drive_kwh: self.0 * link.length_m / 1000.0, aux_kwh: 0.0 })
        }
    }
}

// ── Consumption model ─────────────────────────────────────────────────────────

#[cfg(test)]
mod consumption {
    use ev_core::{CoreError, ProfileId, Vehicle};

    use super::helpers::{electric_bus, fleet, link, BUS};
    use crate::{Climate, EnergyConsumption, PhysicsConsumptionModel};

    #[test]
    fn flat_link_matches_road_load() {
        let model = PhysicsConsumptionModel::new(fleet());
        let e = model.consumption(&link(1000.0, 10.0, 0.0), 100.0, &electric_bus(300.0)).unwrap();

        // drag 336 N + rolling 1177.2 N over 1 km, through 85 % drivetrain.
        let expected_drive = (336.0 + 1177.2) * 1000.0 / 3.6e6 / 0.85;
        assert!((e.drive_kwh - expected_drive).abs() < 1e-9, "drive {}", e.drive_kwh);
        assert!((e.aux_kwh - 3.0 * 100.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn uphill_costs_more_than_flat() {
        let model = PhysicsConsumptionModel::new(fleet());
        let bus = electric_bus(300.0);
        let flat = model.consumption(&link(1000.0, 10.0, 0.0), 100.0, &bus).unwrap();
        let up   = model.consumption(&link(1000.0, 10.0, 0.05), 100.0, &bus).unwrap();
        assert!(up.drive_kwh > flat.drive_kwh);
    }

    #[test]
    fn steep_descent_never_goes_negative() {
        let model = PhysicsConsumptionModel::new(fleet());
        let e = model.consumption(&link(1000.0, 10.0, -0.1), 100.0, &electric_bus(300.0)).unwrap();
        assert_eq!(e.drive_kwh, 0.0);
        assert!(e.aux_kwh > 0.0);
    }

    #[test]
    fn hvac_adds_to_aux_load() {
        let mild = PhysicsConsumptionModel::new(fleet());
        let cold = PhysicsConsumptionModel::new(fleet())
            .with_climate(Climate { ambient_temp_c: -5.0, comfort_temp_c: 20.0 });
        let bus = electric_bus(300.0);
        let l = link(1000.0, 10.0, 0.0);

        let a = mild.consumption(&l, 100.0, &bus).unwrap();
        let b = cold.consumption(&l, 100.0, &bus).unwrap();
        assert_eq!(a.drive_kwh, b.drive_kwh);
        // 25 °C × 0.6 kW/°C for 100 s on top of the base load.
        assert!((b.aux_kwh - a.aux_kwh - 15.0 * 100.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn zero_time_falls_back_to_free_speed() {
        let model = PhysicsConsumptionModel::new(fleet());
        let e = model.consumption(&link(1000.0, 10.0, 0.0), 0.0, &electric_bus(300.0)).unwrap();
        assert!(e.drive_kwh > 0.0 && e.drive_kwh.is_finite());
        assert_eq!(e.aux_kwh, 0.0);
    }

    #[test]
    fn unknown_profile_is_reported_with_vehicle() {
        let model = PhysicsConsumptionModel::new(fleet());
        let stray = Vehicle::new(BUS, ProfileId(7), 350.0, 100.0).unwrap();
        let err = model.consumption(&link(100.0, 10.0, 0.0), 10.0, &stray).unwrap_err();
        assert_eq!(err, CoreError::UnknownVehicleProfile { vehicle: BUS, profile: ProfileId(7) });
    }

    #[test]
    fn deterministic() {
        let model = PhysicsConsumptionModel::new(fleet());
        let bus = electric_bus(300.0);
        let l = link(750.0, 12.0, 0.02);
        assert_eq!(model.consumption(&l, 70.0, &bus).unwrap(), model.consumption(&l, 70.0, &bus).unwrap());
    }
}

// ── Travel time & fares ───────────────────────────────────────────────────────

#[cfg(test)]
mod providers {
    use super::helpers::{diesel_bus, link};
    use crate::{DistanceFare, FareModel, FreeSpeedTravelTime, TimeOfDayTravelTime, TravelTime};

    #[test]
    fn free_speed_is_length_over_speed() {
        let tt = FreeSpeedTravelTime.link_travel_time(&link(300.0, 10.0, 0.0), 0.0, &diesel_bus());
        assert_eq!(tt, 30.0);
    }

    #[test]
    fn time_of_day_factors_clamp_and_wrap() {
        let mut hourly = [1.0; 24];
        hourly[8] = 1.5;
        hourly[3] = 0.5; // below free flow; clamped
        let tod = TimeOfDayTravelTime::hourly(hourly).unwrap();
        let l = link(300.0, 10.0, 0.0);
        let v = diesel_bus();

        assert_eq!(tod.link_travel_time(&l, 8.0 * 3600.0 + 10.0, &v), 45.0);
        assert_eq!(tod.link_travel_time(&l, 3.0 * 3600.0, &v), 30.0);
        // 32:00 wraps to 08:00.
        assert_eq!(tod.link_travel_time(&l, 32.0 * 3600.0, &v), 45.0);
    }

    #[test]
    fn time_of_day_rejects_bad_bins() {
        assert!(TimeOfDayTravelTime::new(0.0, vec![1.0]).is_err());
        assert!(TimeOfDayTravelTime::new(3600.0, Vec::new()).is_err());
        assert!(TimeOfDayTravelTime::new(3600.0, vec![f64::NAN]).is_err());
    }

    #[test]
    fn peak_fare_and_its_lower_bound() {
        let fare = DistanceFare::flat(2.0).with_peak(1.5, vec![(25_200.0, 32_400.0)]);
        let l = link(2000.0, 10.0, 0.0);
        assert_eq!(fare.fare(&l, 0.0), 4.0);
        assert_eq!(fare.fare(&l, 28_000.0), 6.0);
        assert_eq!(fare.minimum_fare(&l), 4.0);

        let discount = DistanceFare::flat(2.0).with_peak(0.5, vec![(0.0, 3600.0)]);
        assert_eq!(discount.minimum_fare(&l), 2.0);
        assert!(discount.minimum_fare(&l) <= discount.fare(&l, 100.0));
    }
}

// ── Cost function ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod cost {
    use std::sync::Arc;

    use ev_core::{CoreError, ProfileId, Vehicle};
    use ev_network::CostFunction;

    use super::helpers::{diesel_bus, electric_bus, fleet, link, BUS};
    use crate::{
        CostWeights, EnergyError, FreeSpeedTravelTime, LinkCostFunction, MarginalUtilities,
        PhysicsConsumptionModel, TimeOfDayTravelTime, TravelTime,
    };

    fn weights() -> CostWeights {
        CostWeights {
            travel_time_per_s: 0.002,
            energy_per_kwh:    0.5,
            fare_per_unit:     0.0,
            waiting_per_s:     0.001,
            transfer_penalty:  2.0,
        }
    }

    fn cost_fn(travel_time: Arc<dyn TravelTime>) -> LinkCostFunction {
        let fleet = fleet();
        let energy = Arc::new(PhysicsConsumptionModel::new(Arc::clone(&fleet)));
        LinkCostFunction::new(weights(), travel_time, energy, fleet).unwrap()
    }

    #[test]
    fn non_electric_pays_time_only() {
        let mut hourly = [1.0; 24];
        hourly[7] = 1.8;
        let tt: Arc<dyn TravelTime> = Arc::new(TimeOfDayTravelTime::hourly(hourly).unwrap());
        let f = cost_fn(Arc::clone(&tt));
        let v = diesel_bus();

        for (len, speed) in [(100.0, 10.0), (2500.0, 13.9), (40.0, 5.0)] {
            let l = link(len, speed, 0.0);
            for t in [0.0, 7.5 * 3600.0, 20.0 * 3600.0] {
                let expected = weights().travel_time_per_s * tt.link_travel_time(&l, t, &v);
                assert_eq!(f.link_cost(&l, t, &v).unwrap(), expected);
            }
        }
    }

    #[test]
    fn electric_pays_energy_on_top() {
        let f = cost_fn(Arc::new(FreeSpeedTravelTime));
        let l = link(1000.0, 10.0, 0.0);
        let electric = f.link_cost(&l, 0.0, &electric_bus(300.0)).unwrap();
        let diesel   = f.link_cost(&l, 0.0, &diesel_bus()).unwrap();
        assert!(electric > diesel);
        assert_eq!(f.estimate_disutility(&l, 0.0, &electric_bus(300.0)).unwrap(), electric);
    }

    #[test]
    fn electric_with_unknown_profile_fails() {
        let f = cost_fn(Arc::new(FreeSpeedTravelTime));
        let stray = Vehicle::new(BUS, ProfileId(9), 350.0, 100.0).unwrap();
        let err = f.link_cost(&link(100.0, 10.0, 0.0), 0.0, &stray).unwrap_err();
        assert_eq!(err, CoreError::UnknownVehicleProfile { vehicle: BUS, profile: ProfileId(9) });
    }

    #[test]
    fn dwell_cost_is_penalty_plus_waiting() {
        let f = cost_fn(Arc::new(FreeSpeedTravelTime));
        assert_eq!(f.dwell_cost(0.0), 2.0);
        assert!((f.dwell_cost(600.0) - 2.6).abs() < 1e-12);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let mut w = weights();
        w.travel_time_per_s = -1.0;
        assert!(matches!(w.validate(), Err(EnergyError::InvalidWeights(_))));
        w.travel_time_per_s = f64::NAN;
        assert!(w.validate().is_err());
    }

    #[test]
    fn marginal_utilities_are_negated() {
        let w = CostWeights::from_marginal_utilities(MarginalUtilities {
            travel_time_per_s: -0.002,
            energy_per_kwh:    -0.5,
            money:             1.0,
            waiting_per_s:     -0.001,
            transfer:          -2.0,
        })
        .unwrap();
        assert_eq!(w.travel_time_per_s, 0.002);
        assert_eq!(w.energy_per_kwh, 0.5);
        assert_eq!(w.fare_per_unit, 1.0);
        assert_eq!(w.transfer_penalty, 2.0);

        let positive_time = MarginalUtilities {
            travel_time_per_s: 0.1,
            energy_per_kwh: 0.0,
            money: 0.0,
            waiting_per_s: 0.0,
            transfer: 0.0,
        };
        assert!(CostWeights::from_marginal_utilities(positive_time).is_err());
    }
}

// ── Admissibility (property) ──────────────────────────────────────────────────

#[cfg(test)]
mod admissibility {
    use std::sync::Arc;

    use ev_network::CostFunction;
    use proptest::prelude::*;

    use super::helpers::{diesel_bus, electric_bus, fleet, link};
    use crate::{CostWeights, DistanceFare, LinkCostFunction, PhysicsConsumptionModel, TimeOfDayTravelTime};

    proptest! {
        #[test]
        fn minimum_cost_never_exceeds_cost(
            length   in 1.0f64..5_000.0,
            speed    in 1.0f64..40.0,
            grade    in -0.12f64..0.12,
            time     in 0.0f64..172_800.0,
            factors  in proptest::collection::vec(0.5f64..3.0, 24),
            w_time   in 0.0f64..0.01,
            w_energy in 0.0f64..2.0,
            w_fare   in 0.0f64..1.0,
            peak     in 0.3f64..2.5,
            soc      in 0.0f64..350.0,
        ) {
            let fleet = fleet();
            let weights = CostWeights {
                travel_time_per_s: w_time,
                energy_per_kwh:    w_energy,
                fare_per_unit:     w_fare,
                waiting_per_s:     0.0,
                transfer_penalty:  0.0,
            };
            let f = LinkCostFunction::new(
                weights,
                Arc::new(TimeOfDayTravelTime::new(3600.0, factors).unwrap()),
                Arc::new(PhysicsConsumptionModel::new(Arc::clone(&fleet))),
                fleet,
            )
            .unwrap()
            .with_fare(Arc::new(DistanceFare::flat(1.2).with_peak(peak, vec![(25_200.0, 32_400.0)])));

            let l = link(length, speed, grade);
            let min = f.link_minimum_cost(&l);
            for v in [electric_bus(soc), diesel_bus()] {
                let c = f.link_cost(&l, time, &v).unwrap();
                prop_assert!(min <= c + 1e-9 * c.abs().max(1.0), "min {min} > cost {c}");
            }
        }
    }
}

// ── State-of-charge tracking ──────────────────────────────────────────────────

#[cfg(test)]
mod soc {
    use std::sync::Arc;

    use ev_core::{ChargerId, GeoPoint};
    use ev_network::{ChargingStop, LinkSpec, PathCandidate, TransitNetwork, TransitNetworkBuilder};

    use super::helpers::{diesel_bus, electric_bus, fleet, PerKmEnergy};
    use crate::{EnergyFeasibilityChecker, FeasibilityChecker, LinkEnergy, SocState, StateOfChargeTracker};

    fn draw(kwh: f64) -> LinkEnergy {
        LinkEnergy { drive_kwh: kwh, aux_kwh: 0.0 }
    }

    #[test]
    fn infeasible_at_first_index_over_capacity() {
        let mut t = StateOfChargeTracker::new(6.0, 0.0);
        assert_eq!(t.append(draw(1.0)), SocState::Accumulating);
        assert_eq!(t.append(draw(2.5)), SocState::Accumulating);
        // cumulative 7.5 > 6 here
        assert_eq!(t.append(draw(4.0)), SocState::Infeasible { at_link: 2 });
        // later links are ignored
        assert_eq!(t.append(draw(0.0)), SocState::Infeasible { at_link: 2 });

        let report = t.finish();
        assert_eq!(report.infeasible_at(), Some(2));
        assert_eq!(report.trace, vec![6.0, 5.0, 2.5]);
        assert_eq!(report.drawn_kwh, 3.5);
    }

    #[test]
    fn draining_exactly_to_zero_is_feasible() {
        let mut t = StateOfChargeTracker::new(6.0, 0.0);
        t.append(draw(2.0));
        t.append(LinkEnergy { drive_kwh: 3.0, aux_kwh: 1.0 });
        let report = t.finish();
        assert!(report.is_feasible());
        assert_eq!(report.final_kwh, 0.0);
        assert_eq!(report.trace.len(), 3);
    }

    #[test]
    fn reserve_floor_tightens_feasibility() {
        let v = electric_bus(100.0);
        // 10 % of 350 kWh held back.
        let mut t = StateOfChargeTracker::for_vehicle(&v, 0.1);
        assert_eq!(t.floor_kwh(), 35.0);
        assert_eq!(t.append(draw(60.0)), SocState::Accumulating);
        assert_eq!(t.append(draw(10.0)), SocState::Infeasible { at_link: 1 });
        assert_eq!(v.soc_kwh, 100.0);
    }

    #[test]
    fn empty_path_is_feasible() {
        let report = StateOfChargeTracker::new(0.0, 0.0).finish();
        assert_eq!(report.state, SocState::Feasible);
        assert_eq!(report.trace, vec![0.0]);
    }

    /// a ─9 km─▶ x ─3 km─▶ d, 1 kWh/km.
    fn corridor() -> TransitNetwork {
        let mut b = TransitNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let x = b.add_node(GeoPoint::new(0.0, 0.081));
        let d = b.add_node(GeoPoint::new(0.0, 0.108));
        b.add_link(a, x, LinkSpec::new(9000.0, 10.0));
        b.add_link(x, d, LinkSpec::new(3000.0, 10.0));
        b.build()
    }

    fn whole_corridor(net: &TransitNetwork) -> PathCandidate {
        let nodes: Vec<_> = (0..3).map(ev_core::NodeId).collect();
        let links: Vec<_> = nodes.windows(2).filter_map(|w| net.find_link(w[0], w[1])).collect();
        PathCandidate {
            node_times: vec![0.0, 900.0, 1200.0],
            link_times: vec![900.0, 300.0],
            links,
            nodes,
            cost: 1200.0,
            energy_kwh: 0.0,
            charging_stops: Vec::new(),
        }
    }

    #[test]
    fn ten_kwh_vehicle_runs_out_after_x() {
        let net = corridor();
        let path = whole_corridor(&net);
        let checker = EnergyFeasibilityChecker::new(Arc::new(PerKmEnergy(1.0)), fleet());
        let v = ev_core::Vehicle::new(super::helpers::BUS, ev_core::ProfileId(0), 10.0, 10.0).unwrap();

        let report = checker.check(&net, &path, &v, v.soc_kwh).unwrap();
        assert_eq!(report.infeasible_at(), Some(1));
        assert_eq!(report.trace, vec![10.0, 1.0]);
    }

    #[test]
    fn charging_stop_resets_the_counter() {
        let net = corridor();
        let mut path = whole_corridor(&net);
        path.charging_stops.push(ChargingStop {
            charger:           ChargerId(0),
            node:              ev_core::NodeId(1),
            path_index:        1,
            arrival_time:      900.0,
            dwell_s:           1200.0,
            charge_before_kwh: 1.0,
            charge_after_kwh:  10.0,
        });
        let checker = EnergyFeasibilityChecker::new(Arc::new(PerKmEnergy(1.0)), fleet());
        let v = ev_core::Vehicle::new(super::helpers::BUS, ev_core::ProfileId(0), 10.0, 10.0).unwrap();

        let report = checker.check(&net, &path, &v, v.soc_kwh).unwrap();
        assert!(report.is_feasible());
        assert_eq!(report.trace, vec![10.0, 1.0, 7.0]);
        assert_eq!(report.drawn_kwh, 12.0);
    }

    #[test]
    fn non_electric_is_always_feasible() {
        let net = corridor();
        let path = whole_corridor(&net);
        let checker = EnergyFeasibilityChecker::new(Arc::new(PerKmEnergy(100.0)), fleet());
        let report = checker.check(&net, &path, &diesel_bus(), 0.0).unwrap();
        assert!(report.is_feasible());
        assert_eq!(report.drawn_kwh, 0.0);
        assert!(!checker.is_constrained(&diesel_bus()));
    }
}

// ── Fleet & loader ────────────────────────────────────────────────────────────

#[cfg(test)]
mod fleet {
    use std::io::{Cursor, Write};

    use ev_core::{CoreError, ProfileId, VehicleId};

    use crate::{load_fleet_csv, load_fleet_reader, EnergyError, FleetSpecification, PowertrainProfile};

    const PROFILES: &str = "\
profile_id,mass_kg,drag_coef,frontal_area_m2,rolling_resistance,drivetrain_efficiency,regen_efficiency,aux_base_kw,hvac_kw_per_deg_c
0,15000,0.7,8.0,0.008,0.85,0.6,3.0,0.6
1,1800,0.28,2.3,0.009,0.9,0.65,0.3,0.1
";

    const VEHICLES: &str = "\
vehicle_id,profile_id,battery_capacity_kwh
10,0,350
11,0,350
20,1,60
";

    #[test]
    fn loads_profiles_and_vehicles() {
        let fleet = load_fleet_reader(Cursor::new(PROFILES), Cursor::new(VEHICLES)).unwrap();
        assert_eq!(fleet.profile_count(), 2);
        assert_eq!(fleet.vehicle_count(), 3);
        assert!(fleet.is_electric(VehicleId(20)));
        assert!(!fleet.is_electric(VehicleId(12)));
        assert_eq!(fleet.spec(VehicleId(20)).unwrap().battery_capacity_kwh, 60.0);

        let v = fleet.vehicle(VehicleId(10), 175.0).unwrap();
        assert_eq!(v.profile, ProfileId(0));
        assert_eq!(v.soc_fraction(), 0.5);
    }

    #[test]
    fn vehicle_with_unknown_profile_is_rejected() {
        let vehicles = "vehicle_id,profile_id,battery_capacity_kwh\n5,3,100\n";
        let err = load_fleet_reader(Cursor::new(PROFILES), Cursor::new(vehicles)).unwrap_err();
        assert!(matches!(
            err,
            EnergyError::Core(CoreError::UnknownVehicleProfile { vehicle: VehicleId(5), profile: ProfileId(3) })
        ));
    }

    #[test]
    fn malformed_rows_are_parse_errors() {
        let vehicles = "vehicle_id,profile_id,battery_capacity_kwh\nten,0,100\n";
        let err = load_fleet_reader(Cursor::new(PROFILES), Cursor::new(vehicles)).unwrap_err();
        assert!(matches!(err, EnergyError::Parse(_)));
    }

    #[test]
    fn implausible_profile_is_rejected() {
        let mut p = PowertrainProfile::electric_bus();
        p.drivetrain_efficiency = 1.4;
        let mut fleet = FleetSpecification::new();
        assert!(matches!(
            fleet.add_profile(ProfileId(0), p),
            Err(EnergyError::InvalidProfile { profile: ProfileId(0), .. })
        ));
    }

    #[test]
    fn soc_above_capacity_is_rejected() {
        let fleet = load_fleet_reader(Cursor::new(PROFILES), Cursor::new(VEHICLES)).unwrap();
        assert!(fleet.vehicle(VehicleId(20), 61.0).is_err());
        assert!(matches!(fleet.vehicle(VehicleId(99), 1.0), Err(EnergyError::UnknownVehicle(VehicleId(99)))));
    }

    #[test]
    fn loads_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = dir.path().join("profiles.csv");
        let vehicles = dir.path().join("vehicles.csv");
        std::fs::File::create(&profiles).unwrap().write_all(PROFILES.as_bytes()).unwrap();
        std::fs::File::create(&vehicles).unwrap().write_all(VEHICLES.as_bytes()).unwrap();

        let fleet = load_fleet_csv(&profiles, &vehicles).unwrap();
        assert_eq!(fleet.vehicle_count(), 3);

        let missing = dir.path().join("nope.csv");
        assert!(matches!(load_fleet_csv(&missing, &vehicles), Err(EnergyError::Io(_))));
    }
}
