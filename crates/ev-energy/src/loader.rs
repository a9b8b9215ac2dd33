//! CSV fleet loader.
//!
//! # CSV format
//!
//! Two files.  Profiles, one row per vehicle class:
//!
//! ```csv
//! profile_id,mass_kg,drag_coef,frontal_area_m2,rolling_resistance,drivetrain_efficiency,regen_efficiency,aux_base_kw,hvac_kw_per_deg_c
//! 0,15000,0.7,8.0,0.008,0.85,0.6,3.0,0.6
//! ```
//!
//! Electric vehicles, one row each:
//!
//! ```csv
//! vehicle_id,profile_id,battery_capacity_kwh
//! 0,0,350
//! 1,0,350
//! ```
//!
//! Vehicles absent from the second file are non-electric and never pay an
//! energy term.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use ev_core::{ProfileId, VehicleId};

use crate::fleet::{ElectricVehicleSpec, FleetSpecification, PowertrainProfile};
use crate::{EnergyError, EnergyResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ProfileRecord {
    profile_id:            u16,
    mass_kg:               f64,
    drag_coef:             f64,
    frontal_area_m2:       f64,
    rolling_resistance:    f64,
    drivetrain_efficiency: f64,
    regen_efficiency:      f64,
    aux_base_kw:           f64,
    hvac_kw_per_deg_c:     f64,
}

impl ProfileRecord {
    fn into_profile(self) -> (ProfileId, PowertrainProfile) {
        let profile = PowertrainProfile {
            mass_kg:               self.mass_kg,
            drag_coef:             self.drag_coef,
            frontal_area_m2:       self.frontal_area_m2,
            rolling_resistance:    self.rolling_resistance,
            drivetrain_efficiency: self.drivetrain_efficiency,
            regen_efficiency:      self.regen_efficiency,
            aux_base_kw:           self.aux_base_kw,
            hvac_kw_per_deg_c:     self.hvac_kw_per_deg_c,
        };
        (ProfileId(self.profile_id), profile)
    }
}

#[derive(Deserialize)]
struct VehicleRecord {
    vehicle_id:           u32,
    profile_id:           u16,
    battery_capacity_kwh: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`FleetSpecification`] from a profiles CSV and a vehicles CSV.
pub fn load_fleet_csv(profiles: &Path, vehicles: &Path) -> EnergyResult<FleetSpecification> {
    let profiles = std::fs::File::open(profiles).map_err(EnergyError::Io)?;
    let vehicles = std::fs::File::open(vehicles).map_err(EnergyError::Io)?;
    load_fleet_reader(profiles, vehicles)
}

/// Like [`load_fleet_csv`] but accepts any `Read` sources.
pub fn load_fleet_reader<P: Read, V: Read>(profiles: P, vehicles: V) -> EnergyResult<FleetSpecification> {
    let mut fleet = FleetSpecification::new();

    let mut reader = csv::Reader::from_reader(profiles);
    for result in reader.deserialize::<ProfileRecord>() {
        let row = result.map_err(|e| EnergyError::Parse(e.to_string()))?;
        let (id, profile) = row.into_profile();
        fleet.add_profile(id, profile)?;
    }

    let mut reader = csv::Reader::from_reader(vehicles);
    for result in reader.deserialize::<VehicleRecord>() {
        let row = result.map_err(|e| EnergyError::Parse(e.to_string()))?;
        fleet.add_vehicle(ElectricVehicleSpec {
            id:                   VehicleId(row.vehicle_id),
            profile:              ProfileId(row.profile_id),
            battery_capacity_kwh: row.battery_capacity_kwh,
        })?;
    }

    log::info!(
        "loaded fleet: {} profiles, {} electric vehicles",
        fleet.profile_count(),
        fleet.vehicle_count()
    );
    Ok(fleet)
}
