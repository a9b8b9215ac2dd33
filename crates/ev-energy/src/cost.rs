//! Energy-aware link disutility.
//!
//! ```text
//! cost(l, t, v)    = w_time × tt(l, t, v)
//!                  + w_energy × (drive + aux)      only if v is electric
//!                  + w_fare × fare(l, t)
//! minimum_cost(l)  = w_time × length / free_speed
//!                  + w_fare × minimum_fare(l)
//! dwell_cost(d)    = transfer_penalty + w_wait × d
//! ```
//!
//! `minimum_cost ≤ cost` holds because every weight is non-negative, energy
//! is non-negative, and [`TravelTime`] providers never return less than the
//! free-flow time.

use std::sync::{Arc, OnceLock};

use ev_core::{CoreResult, TransportMode, Vehicle};
use ev_network::{CostFunction, Link, ModeView, minimum_cost_rate};

use crate::consumption::EnergyConsumption;
use crate::fare::{FareModel, NoFare};
use crate::fleet::FleetSpecification;
use crate::travel_time::TravelTime;
use crate::{EnergyError, EnergyResult};

// ── CostWeights ───────────────────────────────────────────────────────────────

/// Non-negative cost rates.  Larger means worse.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostWeights {
    pub travel_time_per_s: f64,
    pub energy_per_kwh:    f64,
    pub fare_per_unit:     f64,
    /// Applied to time spent stationary at a charging waypoint.
    pub waiting_per_s:     f64,
    /// Fixed cost of every charging stop.
    pub transfer_penalty:  f64,
}

impl Default for CostWeights {
    /// One cost unit per second of travel; every other term disabled.
    fn default() -> Self {
        Self {
            travel_time_per_s: 1.0,
            energy_per_kwh:    0.0,
            fare_per_unit:     0.0,
            waiting_per_s:     0.0,
            transfer_penalty:  0.0,
        }
    }
}

/// Scoring-style marginal utilities: negative for things that hurt, the
/// marginal utility of money positive.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarginalUtilities {
    pub travel_time_per_s: f64,
    pub energy_per_kwh:    f64,
    pub money:             f64,
    pub waiting_per_s:     f64,
    pub transfer:          f64,
}

impl CostWeights {
    /// Convert utilities to cost rates by negation (money keeps its sign,
    /// since a fare is a negative amount of money).
    pub fn from_marginal_utilities(u: MarginalUtilities) -> EnergyResult<Self> {
        let weights = Self {
            travel_time_per_s: -u.travel_time_per_s,
            energy_per_kwh:    -u.energy_per_kwh,
            fare_per_unit:     u.money,
            waiting_per_s:     -u.waiting_per_s,
            transfer_penalty:  -u.transfer,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> EnergyResult<()> {
        let named = [
            ("travel_time_per_s", self.travel_time_per_s),
            ("energy_per_kwh", self.energy_per_kwh),
            ("fare_per_unit", self.fare_per_unit),
            ("waiting_per_s", self.waiting_per_s),
            ("transfer_penalty", self.transfer_penalty),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(EnergyError::InvalidWeights(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ── LinkCostFunction ──────────────────────────────────────────────────────────

/// The search's edge-weight oracle for one transport mode.
///
/// Cheap to clone; every collaborator is behind an `Arc`.
///
/// The A* heuristic rate is cached per mode on first use, so one instance
/// should only ever search one network.
#[derive(Clone)]
pub struct LinkCostFunction {
    weights:     CostWeights,
    travel_time: Arc<dyn TravelTime>,
    energy:      Arc<dyn EnergyConsumption>,
    fare:        Arc<dyn FareModel>,
    fleet:       Arc<FleetSpecification>,
    rates:       [OnceLock<f64>; TransportMode::COUNT],
}

impl LinkCostFunction {
    /// Build a cost function with no fare.  Fails if `weights` are invalid.
    pub fn new(
        weights:     CostWeights,
        travel_time: Arc<dyn TravelTime>,
        energy:      Arc<dyn EnergyConsumption>,
        fleet:       Arc<FleetSpecification>,
    ) -> EnergyResult<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            travel_time,
            energy,
            fare: Arc::new(NoFare),
            fleet,
            rates: Default::default(),
        })
    }

    pub fn with_fare(mut self, fare: Arc<dyn FareModel>) -> Self {
        self.fare = fare;
        self.rates = Default::default();
        self
    }

    pub fn weights(&self) -> &CostWeights {
        &self.weights
    }

    pub fn fleet(&self) -> &FleetSpecification {
        &self.fleet
    }

    pub fn energy_model(&self) -> &Arc<dyn EnergyConsumption> {
        &self.energy
    }

    /// The heuristic rate for `mode`, if a search has computed it yet.
    pub fn cached_heuristic_rate(&self, mode: TransportMode) -> Option<f64> {
        self.rates[mode.index()].get().copied()
    }

    /// Disutility of `link` for `vehicle` entering at `time`, for comparing
    /// modes outside a search.
    pub fn estimate_disutility(&self, link: &Link, time: f64, vehicle: &Vehicle) -> CoreResult<f64> {
        self.link_cost(link, time, vehicle)
    }
}

impl CostFunction for LinkCostFunction {
    #[inline]
    fn link_travel_time(&self, link: &Link, time: f64, vehicle: &Vehicle) -> f64 {
        self.travel_time.link_travel_time(link, time, vehicle)
    }

    fn link_cost(&self, link: &Link, time: f64, vehicle: &Vehicle) -> CoreResult<f64> {
        let w  = &self.weights;
        let tt = self.link_travel_time(link, time, vehicle);

        let mut cost = w.travel_time_per_s * tt;
        if self.fleet.is_electric(vehicle.id) {
            let energy = self.energy.consumption(link, tt, vehicle)?;
            cost += w.energy_per_kwh * energy.total_kwh();
        }
        if w.fare_per_unit > 0.0 {
            cost += w.fare_per_unit * self.fare.fare(link, time);
        }
        Ok(cost)
    }

    fn link_minimum_cost(&self, link: &Link) -> f64 {
        let w = &self.weights;
        let mut min = 0.0;
        if w.travel_time_per_s > 0.0 {
            min += w.travel_time_per_s * link.free_flow_time_s();
        }
        if w.fare_per_unit > 0.0 {
            min += w.fare_per_unit * self.fare.minimum_fare(link);
        }
        min
    }

    fn dwell_cost(&self, dwell_s: f64) -> f64 {
        self.weights.transfer_penalty + self.weights.waiting_per_s * dwell_s.max(0.0)
    }

    fn heuristic_rate(&self, graph: &ModeView<'_>) -> f64 {
        *self.rates[graph.mode.index()].get_or_init(|| minimum_cost_rate(graph, self))
    }
}
