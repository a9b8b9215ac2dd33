//! The vehicle record passed with every routing request.

use crate::{CoreError, CoreResult, ProfileId, VehicleId};

/// A vehicle as seen by one routing request.
///
/// Routing never mutates a `Vehicle`: feasibility checks run on a private
/// running total seeded from [`soc_kwh`](Self::soc_kwh), so the simulation's
/// authoritative record is untouched by speculative path evaluation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    pub id:                   VehicleId,
    /// Powertrain profile; resolved against the fleet specification.
    pub profile:              ProfileId,
    pub battery_capacity_kwh: f64,
    /// Current state of charge, `0 ≤ soc_kwh ≤ battery_capacity_kwh`.
    pub soc_kwh:              f64,
}

impl Vehicle {
    /// Construct a vehicle, checking `0 ≤ soc ≤ capacity`.
    pub fn new(
        id:                   VehicleId,
        profile:              ProfileId,
        battery_capacity_kwh: f64,
        soc_kwh:              f64,
    ) -> CoreResult<Self> {
        let valid = battery_capacity_kwh.is_finite()
            && battery_capacity_kwh >= 0.0
            && soc_kwh.is_finite()
            && (0.0..=battery_capacity_kwh).contains(&soc_kwh);
        if !valid {
            return Err(CoreError::InvalidStateOfCharge {
                vehicle: id,
                soc_kwh,
                capacity_kwh: battery_capacity_kwh,
            });
        }
        Ok(Self { id, profile, battery_capacity_kwh, soc_kwh })
    }

    /// Construct a vehicle whose state of charge is given as a fraction of
    /// capacity, the way initial SoC is usually seeded (e.g. `0.2..=0.8`).
    pub fn with_soc_fraction(
        id:                   VehicleId,
        profile:              ProfileId,
        battery_capacity_kwh: f64,
        soc_fraction:         f64,
    ) -> CoreResult<Self> {
        Self::new(id, profile, battery_capacity_kwh, battery_capacity_kwh * soc_fraction)
    }

    /// State of charge as a fraction of capacity (0 for a zero-capacity vehicle).
    pub fn soc_fraction(&self) -> f64 {
        if self.battery_capacity_kwh > 0.0 {
            self.soc_kwh / self.battery_capacity_kwh
        } else {
            0.0
        }
    }
}
