//! Per-link energy consumption.
//!
//! [`PhysicsConsumptionModel`] evaluates a road-load balance at the mean
//! speed over the link:
//!
//! ```text
//! F_drag    = ½ ρ Cd A v²
//! F_roll    = m g Crr cos θ
//! F_ascent  = m g sin θ              θ = atan(grade)
//! E_wheel   = (F_drag + F_roll + F_ascent) × length
//! E_battery = E_wheel / η_drive      if E_wheel ≥ 0
//!           = E_wheel × η_regen      otherwise (recovered, negative)
//! E_aux     = (P_base + P_hvac × |T_ambient − T_comfort|) × t
//! ```
//!
//! Drive energy is clamped at zero per link, so a descent never yields a
//! net gain on a single link.  The auxiliary term depends only on the
//! traversal time.

use std::sync::Arc;

use ev_core::{CoreResult, Vehicle};
use ev_network::Link;

use crate::fleet::FleetSpecification;

const J_PER_KWH: f64 = 3.6e6;
const S_PER_H: f64 = 3600.0;

/// Energy drawn over one link, split by consumer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LinkEnergy {
    pub drive_kwh: f64,
    pub aux_kwh:   f64,
}

impl LinkEnergy {
    pub const ZERO: Self = Self { drive_kwh: 0.0, aux_kwh: 0.0 };

    #[inline]
    pub fn total_kwh(&self) -> f64 {
        self.drive_kwh + self.aux_kwh
    }
}

/// Energy model for one link traversal.
///
/// Implementations must return non-negative, finite totals.
pub trait EnergyConsumption: Send + Sync {
    /// Energy drawn traversing `link` in `traversal_time_s` seconds.
    fn consumption(&self, link: &Link, traversal_time_s: f64, vehicle: &Vehicle) -> CoreResult<LinkEnergy>;
}

// ── Physics model ─────────────────────────────────────────────────────────────

/// Environmental constants of the road-load equation.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalConstants {
    pub air_density_kg_m3: f64,
    pub gravity_m_s2:      f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self { air_density_kg_m3: 1.2, gravity_m_s2: 9.81 }
    }
}

/// Ambient conditions driving the HVAC share of auxiliary load.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Climate {
    pub ambient_temp_c: f64,
    pub comfort_temp_c: f64,
}

impl Default for Climate {
    fn default() -> Self {
        Self { ambient_temp_c: 20.0, comfort_temp_c: 20.0 }
    }
}

impl Climate {
    fn hvac_delta(&self) -> f64 {
        (self.ambient_temp_c - self.comfort_temp_c).abs()
    }
}

pub struct PhysicsConsumptionModel {
    fleet:     Arc<FleetSpecification>,
    constants: PhysicalConstants,
    climate:   Climate,
}

impl PhysicsConsumptionModel {
    pub fn new(fleet: Arc<FleetSpecification>) -> Self {
        Self { fleet, constants: PhysicalConstants::default(), climate: Climate::default() }
    }

    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_climate(mut self, climate: Climate) -> Self {
        self.climate = climate;
        self
    }

    pub fn fleet(&self) -> &FleetSpecification {
        &self.fleet
    }
}

impl EnergyConsumption for PhysicsConsumptionModel {
    fn consumption(&self, link: &Link, traversal_time_s: f64, vehicle: &Vehicle) -> CoreResult<LinkEnergy> {
        let p = self.fleet.profile_for(vehicle)?;
        let PhysicalConstants { air_density_kg_m3: rho, gravity_m_s2: g } = self.constants;

        // Mean speed over the link; fall back to free speed for a zero or
        // undefined traversal time.
        let speed = if traversal_time_s > 0.0 && traversal_time_s.is_finite() {
            link.length_m / traversal_time_s
        } else {
            link.free_speed_mps.max(0.0)
        };
        let theta = link.grade.atan();

        let force_n = 0.5 * rho * p.drag_coef * p.frontal_area_m2 * speed * speed
            + p.mass_kg * g * p.rolling_resistance * theta.cos()
            + p.mass_kg * g * theta.sin();
        let wheel_kwh = force_n * link.length_m / J_PER_KWH;

        let battery_kwh = if wheel_kwh >= 0.0 {
            wheel_kwh / p.drivetrain_efficiency
        } else {
            wheel_kwh * p.regen_efficiency
        };

        let aux_kw = p.aux_base_kw + p.hvac_kw_per_deg_c * self.climate.hvac_delta();
        let aux_kwh = if traversal_time_s.is_finite() {
            aux_kw * traversal_time_s.max(0.0) / S_PER_H
        } else {
            0.0
        };

        Ok(LinkEnergy { drive_kwh: battery_kwh.max(0.0), aux_kwh })
    }
}
