//! Fleet specification: which vehicles are electric, and the powertrain
//! coefficients of each vehicle class.

use rustc_hash::FxHashMap;
use ev_core::{CoreError, CoreResult, ProfileId, Vehicle, VehicleId};

use crate::{EnergyError, EnergyResult};

// ── PowertrainProfile ─────────────────────────────────────────────────────────

/// Road-load and auxiliary-load coefficients of one vehicle class.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowertrainProfile {
    /// Loaded vehicle mass.
    pub mass_kg:               f64,
    pub drag_coef:             f64,
    pub frontal_area_m2:       f64,
    /// Rolling resistance coefficient (dimensionless).
    pub rolling_resistance:    f64,
    /// Battery-to-wheel efficiency when driving, in (0, 1].
    pub drivetrain_efficiency: f64,
    /// Wheel-to-battery efficiency when braking/descending, in [0, 1].
    pub regen_efficiency:      f64,
    /// Constant auxiliary draw (lights, doors, electronics).
    pub aux_base_kw:           f64,
    /// Additional HVAC draw per °C between ambient and cabin comfort temperature.
    pub hvac_kw_per_deg_c:     f64,
}

impl PowertrainProfile {
    /// A 12 m battery-electric city bus.
    pub fn electric_bus() -> Self {
        Self {
            mass_kg:               15_000.0,
            drag_coef:             0.7,
            frontal_area_m2:       8.0,
            rolling_resistance:    0.008,
            drivetrain_efficiency: 0.85,
            regen_efficiency:      0.6,
            aux_base_kw:           3.0,
            hvac_kw_per_deg_c:     0.6,
        }
    }

    /// A battery-electric passenger car used as a transfer/feeder vehicle.
    pub fn electric_car() -> Self {
        Self {
            mass_kg:               1_800.0,
            drag_coef:             0.28,
            frontal_area_m2:       2.3,
            rolling_resistance:    0.009,
            drivetrain_efficiency: 0.9,
            regen_efficiency:      0.65,
            aux_base_kw:           0.3,
            hvac_kw_per_deg_c:     0.1,
        }
    }

    /// Check physical plausibility of every coefficient.
    pub fn validate(&self, id: ProfileId) -> EnergyResult<()> {
        let invalid = |reason: &str| {
            Err(EnergyError::InvalidProfile { profile: id, reason: reason.to_string() })
        };
        let values = [
            self.mass_kg,
            self.drag_coef,
            self.frontal_area_m2,
            self.rolling_resistance,
            self.drivetrain_efficiency,
            self.regen_efficiency,
            self.aux_base_kw,
            self.hvac_kw_per_deg_c,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return invalid("coefficients must be finite and non-negative");
        }
        if self.mass_kg == 0.0 {
            return invalid("mass must be positive");
        }
        if self.drivetrain_efficiency == 0.0 || self.drivetrain_efficiency > 1.0 {
            return invalid("drivetrain efficiency must be in (0, 1]");
        }
        if self.regen_efficiency > 1.0 {
            return invalid("regen efficiency must be in [0, 1]");
        }
        Ok(())
    }
}

// ── ElectricVehicleSpec ───────────────────────────────────────────────────────

/// Fleet entry for one electric vehicle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElectricVehicleSpec {
    pub id:                   VehicleId,
    pub profile:              ProfileId,
    pub battery_capacity_kwh: f64,
}

// ── FleetSpecification ────────────────────────────────────────────────────────

/// Read-only registry of powertrain profiles and electric vehicles.
///
/// Membership in [`electric`](Self::is_electric) is the capability check the
/// cost function uses to decide whether a vehicle pays an energy term.
#[derive(Clone, Debug, Default)]
pub struct FleetSpecification {
    profiles: FxHashMap<ProfileId, PowertrainProfile>,
    electric: FxHashMap<VehicleId, ElectricVehicleSpec>,
}

impl FleetSpecification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile after validating it.
    pub fn add_profile(&mut self, id: ProfileId, profile: PowertrainProfile) -> EnergyResult<()> {
        profile.validate(id)?;
        self.profiles.insert(id, profile);
        Ok(())
    }

    /// Register an electric vehicle.  Its profile must already be known.
    pub fn add_vehicle(&mut self, spec: ElectricVehicleSpec) -> EnergyResult<()> {
        if !self.profiles.contains_key(&spec.profile) {
            return Err(CoreError::UnknownVehicleProfile { vehicle: spec.id, profile: spec.profile }.into());
        }
        if !spec.battery_capacity_kwh.is_finite() || spec.battery_capacity_kwh <= 0.0 {
            return Err(EnergyError::Parse(format!(
                "vehicle {}: battery capacity must be positive, got {}",
                spec.id, spec.battery_capacity_kwh
            )));
        }
        self.electric.insert(spec.id, spec);
        Ok(())
    }

    #[inline]
    pub fn is_electric(&self, vehicle: VehicleId) -> bool {
        self.electric.contains_key(&vehicle)
    }

    pub fn spec(&self, vehicle: VehicleId) -> Option<&ElectricVehicleSpec> {
        self.electric.get(&vehicle)
    }

    /// Powertrain coefficients for `vehicle`'s profile.
    pub fn profile_for(&self, vehicle: &Vehicle) -> CoreResult<&PowertrainProfile> {
        self.profiles
            .get(&vehicle.profile)
            .ok_or(CoreError::UnknownVehicleProfile { vehicle: vehicle.id, profile: vehicle.profile })
    }

    /// Build the per-request [`Vehicle`] record for a fleet vehicle with the
    /// given state of charge.
    pub fn vehicle(&self, id: VehicleId, soc_kwh: f64) -> EnergyResult<Vehicle> {
        let spec = self.spec(id).ok_or(EnergyError::UnknownVehicle(id))?;
        Ok(Vehicle::new(id, spec.profile, spec.battery_capacity_kwh, soc_kwh)?)
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn vehicle_count(&self) -> usize {
        self.electric.len()
    }
}
