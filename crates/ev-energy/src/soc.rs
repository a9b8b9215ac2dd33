//! State-of-charge feasibility of a candidate path.
//!
//! A [`StateOfChargeTracker`] is scratch state for one evaluation: it is
//! seeded from a charge value and never touches the [`Vehicle`] it came from,
//! so speculative path checks have no effect on the caller's record.
//!
//! ```text
//! Accumulating ──append──▶ Accumulating
//!      │                        │ charge would drop below floor
//!      │ finish                 ▼
//!      ▼                 Infeasible { at_link }
//!   Feasible
//! ```

use std::sync::Arc;

use ev_core::{CoreResult, Vehicle};
use ev_network::{PathCandidate, TransitNetwork};

use crate::consumption::{EnergyConsumption, LinkEnergy};
use crate::fleet::FleetSpecification;

// ── SocState ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SocState {
    Accumulating,
    Feasible,
    /// Traversing link `at_link` (index into the path) would have taken the
    /// charge below the floor.
    Infeasible { at_link: usize },
}

// ── StateOfChargeTracker ──────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct StateOfChargeTracker {
    floor_kwh:     f64,
    remaining_kwh: f64,
    drawn_kwh:     f64,
    links_seen:    usize,
    state:         SocState,
    /// Charge on arrival at each reached node; `trace[0]` is the start charge.
    trace:         Vec<f64>,
}

impl StateOfChargeTracker {
    pub fn new(start_kwh: f64, floor_kwh: f64) -> Self {
        Self {
            floor_kwh:     floor_kwh.max(0.0),
            remaining_kwh: start_kwh,
            drawn_kwh:     0.0,
            links_seen:    0,
            state:         SocState::Accumulating,
            trace:         vec![start_kwh],
        }
    }

    /// Seed from the vehicle's current charge, keeping `reserve_fraction` of
    /// capacity as the floor.
    pub fn for_vehicle(vehicle: &Vehicle, reserve_fraction: f64) -> Self {
        Self::new(vehicle.soc_kwh, vehicle.battery_capacity_kwh * reserve_fraction.clamp(0.0, 1.0))
    }

    /// Account for the next link of the path.  Ignored once infeasible.
    pub fn append(&mut self, energy: LinkEnergy) -> SocState {
        if self.state != SocState::Accumulating {
            return self.state;
        }
        let draw = energy.total_kwh();
        if self.remaining_kwh - draw < self.floor_kwh {
            self.state = SocState::Infeasible { at_link: self.links_seen };
            return self.state;
        }
        self.remaining_kwh -= draw;
        self.drawn_kwh     += draw;
        self.links_seen    += 1;
        self.trace.push(self.remaining_kwh);
        self.state
    }

    /// Replace the running charge after a charging stop at the current node.
    /// The trace keeps the arrival charge for that node.
    pub fn recharge(&mut self, to_kwh: f64) {
        if self.state == SocState::Accumulating {
            self.remaining_kwh = to_kwh;
        }
    }

    pub fn state(&self) -> SocState {
        self.state
    }

    pub fn remaining_kwh(&self) -> f64 {
        self.remaining_kwh
    }

    pub fn floor_kwh(&self) -> f64 {
        self.floor_kwh
    }

    pub fn finish(self) -> SocReport {
        let state = match self.state {
            SocState::Accumulating => SocState::Feasible,
            other => other,
        };
        SocReport {
            state,
            trace:       self.trace,
            drawn_kwh:   self.drawn_kwh,
            final_kwh:   self.remaining_kwh,
            floor_kwh:   self.floor_kwh,
        }
    }
}

// ── SocReport ─────────────────────────────────────────────────────────────────

/// Outcome of replaying a path through a tracker.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SocReport {
    /// `Feasible` or `Infeasible`; never `Accumulating`.
    pub state:     SocState,
    /// Charge on arrival at each reached node.  On an infeasible path the
    /// last entry is the charge at the start of the failing link.
    pub trace:     Vec<f64>,
    pub drawn_kwh: f64,
    pub final_kwh: f64,
    pub floor_kwh: f64,
}

impl SocReport {
    /// Report for a vehicle that carries no energy constraint.
    pub fn unconstrained(path: &PathCandidate, start_kwh: f64) -> Self {
        Self {
            state:     SocState::Feasible,
            trace:     vec![start_kwh; path.nodes.len()],
            drawn_kwh: 0.0,
            final_kwh: start_kwh,
            floor_kwh: 0.0,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.state == SocState::Feasible
    }

    pub fn infeasible_at(&self) -> Option<usize> {
        match self.state {
            SocState::Infeasible { at_link } => Some(at_link),
            _ => None,
        }
    }
}

// ── FeasibilityChecker ────────────────────────────────────────────────────────

/// Decides whether a vehicle can complete a path on its charge.
pub trait FeasibilityChecker: Send + Sync {
    /// Replay `path` starting with `start_kwh` in the battery.  Charging stops
    /// already on the path reset the charge to their `charge_after_kwh`.
    fn check(
        &self,
        network:   &TransitNetwork,
        path:      &PathCandidate,
        vehicle:   &Vehicle,
        start_kwh: f64,
    ) -> CoreResult<SocReport>;

    /// Lowest charge the vehicle may reach.
    fn floor_kwh(&self, vehicle: &Vehicle) -> f64;

    /// `false` for vehicles that never need a charging detour.
    fn is_constrained(&self, vehicle: &Vehicle) -> bool;
}

/// Feasibility from an [`EnergyConsumption`] model.  Vehicles outside the
/// electric fleet are always feasible.
pub struct EnergyFeasibilityChecker {
    energy:           Arc<dyn EnergyConsumption>,
    fleet:            Arc<FleetSpecification>,
    reserve_fraction: f64,
}

impl EnergyFeasibilityChecker {
    pub fn new(energy: Arc<dyn EnergyConsumption>, fleet: Arc<FleetSpecification>) -> Self {
        Self { energy, fleet, reserve_fraction: 0.0 }
    }

    pub fn with_reserve_fraction(mut self, reserve_fraction: f64) -> Self {
        self.reserve_fraction = reserve_fraction.clamp(0.0, 1.0);
        self
    }
}

impl FeasibilityChecker for EnergyFeasibilityChecker {
    fn check(
        &self,
        network:   &TransitNetwork,
        path:      &PathCandidate,
        vehicle:   &Vehicle,
        start_kwh: f64,
    ) -> CoreResult<SocReport> {
        if !self.is_constrained(vehicle) {
            return Ok(SocReport::unconstrained(path, start_kwh));
        }

        let mut tracker = StateOfChargeTracker::new(start_kwh, self.floor_kwh(vehicle));
        let mut stops   = path.charging_stops.iter().peekable();

        for (i, (&id, &tt)) in path.links.iter().zip(&path.link_times).enumerate() {
            while let Some(stop) = stops.next_if(|s| s.path_index == i) {
                tracker.recharge(stop.charge_after_kwh);
            }
            let energy = self.energy.consumption(&network.link(id), tt, vehicle)?;
            if let SocState::Infeasible { .. } = tracker.append(energy) {
                break;
            }
        }
        Ok(tracker.finish())
    }

    fn floor_kwh(&self, vehicle: &Vehicle) -> f64 {
        vehicle.battery_capacity_kwh * self.reserve_fraction
    }

    fn is_constrained(&self, vehicle: &Vehicle) -> bool {
        self.fleet.is_electric(vehicle.id)
    }
}
