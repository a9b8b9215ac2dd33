//! Route composition with bounded charging detours.
//!
//! # State machine
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            ▼                                          │
//!   Searching ──▶ Validating ──feasible──▶ Done          │
//!                     │                                 │
//!                     └─infeasible─▶ Detouring ──waypoint┘
//!                                       │
//!                                       └─bound reached──▶ RouteInfeasible
//! ```
//!
//! - **Searching** runs one least-cost search per leg: origin → first
//!   waypoint → … → destination.  At each waypoint the charging policy sets
//!   the dwell time and the charge the next leg starts with, and the next leg
//!   departs once the dwell is over.  A waypoint reached at or above the
//!   policy's target gets no stop.
//! - **Validating** replays the stitched path through the feasibility
//!   checker from the vehicle's current charge.
//! - **Detouring** asks the charging index for a charger before the failing
//!   link and adds it as a waypoint.  A charger is accepted only if the
//!   vehicle reaches it while it is open, and never twice.  At most
//!   `max_detours` waypoints are added, so every request terminates.
//!
//! A request with no charger anywhere near the shortfall fails with
//! `NoChargingOptionAvailable`.  One whose nearby chargers are all out of
//! range fails with `RouteInfeasible`, like an exhausted detour bound.
//!
//! A composer holds only shared references; every call to
//! [`route`](RouteComposer::route) owns its scratch state, so one composer
//! may serve many threads.

use ev_charging::{ChargingError, ChargingInfrastructureIndex, ChargingOpportunity, Placement, Shortfall};
use ev_core::{ChargerId, NodeId, Vehicle};
use ev_energy::{FeasibilityChecker, SocReport};
use ev_network::{ChargingStop, CostFunction, ModeView, PathCandidate, PathSearch};

use crate::settings::RoutingSettings;
use crate::{RouteError, RouteResult};

/// A stitched path and the path index of each waypoint, in waypoint order.
struct Composed {
    path:        PathCandidate,
    waypoint_at: Vec<usize>,
}

enum Phase {
    Searching,
    Validating(Composed),
    Detouring { composed: Composed, report: SocReport },
}

/// Energy-aware router for one transport mode.
///
/// Every capability is injected: the sub-network, the edge-cost oracle, the
/// search engine, the feasibility check and the charger index.
#[derive(Copy, Clone)]
pub struct RouteComposer<'a> {
    view:        ModeView<'a>,
    cost:        &'a dyn CostFunction,
    search:      &'a dyn PathSearch,
    feasibility: &'a dyn FeasibilityChecker,
    chargers:    &'a ChargingInfrastructureIndex,
    settings:    &'a RoutingSettings,
}

impl<'a> RouteComposer<'a> {
    pub fn new(
        view:        ModeView<'a>,
        cost:        &'a dyn CostFunction,
        search:      &'a dyn PathSearch,
        feasibility: &'a dyn FeasibilityChecker,
        chargers:    &'a ChargingInfrastructureIndex,
        settings:    &'a RoutingSettings,
    ) -> Self {
        Self { view, cost, search, feasibility, chargers, settings }
    }

    pub fn mode_view(&self) -> ModeView<'a> {
        self.view
    }

    /// Least-cost path from `origin` to `destination` that `vehicle` can
    /// complete on its current charge, with charging stops if needed.
    ///
    /// # Errors
    ///
    /// - `Core(UnknownVehicleProfile)` if the vehicle's profile is unknown.
    /// - `NoRoute` if the mode's sub-network does not connect the pair.
    /// - `NoChargingOptionAvailable` if no charger covers the shortfall.
    /// - `RouteInfeasible` if the detour bound is exhausted or every nearby
    ///   charger is out of range or closed on arrival.
    /// - `Charging(ChargerClosed)` if a new detour delays the vehicle past
    ///   the closing time of a later waypoint.
    pub fn route(
        &self,
        origin:         NodeId,
        destination:    NodeId,
        departure_time: f64,
        vehicle:        &Vehicle,
    ) -> RouteResult<PathCandidate> {
        let network = self.view.network;
        let mut waypoints: Vec<&'a ChargingOpportunity> = Vec::new();
        let mut phase = Phase::Searching;

        loop {
            phase = match phase {
                Phase::Searching => {
                    let composed = self.compose(origin, destination, departure_time, vehicle, &waypoints)?;
                    Phase::Validating(composed)
                }

                Phase::Validating(mut composed) => {
                    let report = self.feasibility.check(network, &composed.path, vehicle, vehicle.soc_kwh)?;
                    if report.is_feasible() {
                        composed.path.energy_kwh = report.drawn_kwh;
                        return Ok(composed.path);
                    }
                    Phase::Detouring { composed, report }
                }

                Phase::Detouring { composed, report } => {
                    let Composed { path, waypoint_at } = composed;
                    let Some(at) = report.infeasible_at() else {
                        return Ok(path);
                    };
                    if waypoints.len() >= self.settings.max_detours as usize {
                        log::warn!(
                            "{}: route {origin} → {destination} infeasible after {} detour(s), link index {at}",
                            vehicle.id,
                            waypoints.len()
                        );
                        return Err(RouteError::RouteInfeasible {
                            vehicle:       vehicle.id,
                            path:          Box::new(path),
                            infeasible_at: at,
                        });
                    }

                    // Waypoints the vehicle reached before failing.
                    let reached = waypoint_at.iter().filter(|&&i| i <= at).count();
                    let prefix = &waypoints[..reached];
                    let used: Vec<ChargerId> = waypoints.iter().map(|w| w.id).collect();
                    let shortfall = Shortfall {
                        vehicle:       vehicle.id,
                        path:          &path,
                        trace:         &report.trace,
                        infeasible_at: at,
                        floor_kwh:     report.floor_kwh,
                        used:          &used,
                    };
                    let mut vetoed = 0usize;
                    let found = self.chargers.nearest_opportunity(network, &shortfall, |c| {
                        let ok = self.reaches(origin, departure_time, vehicle, prefix, c);
                        vetoed += usize::from(!ok);
                        ok
                    });
                    let chosen = match found {
                        Ok(chosen) => chosen,
                        // Chargers exist nearby but none is usable.
                        Err(ChargingError::NoChargingOptionAvailable { .. }) if vetoed > 0 => {
                            log::warn!(
                                "{}: route {origin} → {destination} infeasible, {vetoed} nearby charger(s) out of range or closed",
                                vehicle.id
                            );
                            return Err(RouteError::RouteInfeasible {
                                vehicle:       vehicle.id,
                                path:          Box::new(path),
                                infeasible_at: at,
                            });
                        }
                        Err(e) => return Err(e.into()),
                    };

                    log::debug!(
                        "{}: detour {} via charger {} at {} ({:?})",
                        vehicle.id,
                        waypoints.len() + 1,
                        chosen.opportunity.id,
                        chosen.opportunity.node,
                        chosen.placement
                    );
                    // Keep waypoints in path order.  An on-path charger may sit
                    // before a waypoint that gave no charge.
                    let insert_at = match chosen.placement {
                        Placement::OnPath { path_index } => waypoint_at.iter().filter(|&&i| i <= path_index).count(),
                        Placement::OffPath { .. } => reached,
                    };
                    waypoints.insert(insert_at, chosen.opportunity);
                    Phase::Searching
                }
            };
        }
    }

    /// Search every leg between consecutive waypoints and join them,
    /// recording a charging stop at each waypoint where the vehicle charges.
    fn compose(
        &self,
        origin:         NodeId,
        destination:    NodeId,
        departure_time: f64,
        vehicle:        &Vehicle,
        waypoints:      &[&ChargingOpportunity],
    ) -> RouteResult<Composed> {
        let network = self.view.network;
        let mut from   = origin;
        let mut time   = departure_time;
        let mut charge = vehicle.soc_kwh;
        let mut path: Option<PathCandidate> = None;
        let mut pending: Option<(ChargingStop, f64)> = None;
        let mut waypoint_at = Vec::with_capacity(waypoints.len());

        let targets = waypoints.iter().map(|&w| Some(w)).chain(std::iter::once(None));
        for target in targets {
            let to  = target.map_or(destination, |w| w.node);
            let leg = self.search.search(&self.view, from, to, time, vehicle, self.cost)?;

            let mut next = None;
            if let Some(charger) = target {
                let report = self.feasibility.check(network, &leg, vehicle, charge)?;
                let before = report.final_kwh;
                let (after, dwell_s) =
                    self.settings.charging.plan(before, vehicle.battery_capacity_kwh, charger.power_kw);
                let arrival = leg.arrival_time();
                if dwell_s > 0.0 {
                    if !charger.is_available_at(arrival) {
                        return Err(ChargingError::ChargerClosed { charger: charger.id, time: arrival }.into());
                    }
                    let stop = ChargingStop {
                        charger:           charger.id,
                        node:              charger.node,
                        path_index:        0,
                        arrival_time:      arrival,
                        dwell_s,
                        charge_before_kwh: before,
                        charge_after_kwh:  after,
                    };
                    next = Some((stop, self.cost.dwell_cost(dwell_s)));
                }
                from   = charger.node;
                time   = arrival + dwell_s;
                charge = after;
            }

            let joined = match (path.take(), pending.take()) {
                (Some(prev), Some((stop, stop_cost))) => PathCandidate::stitch(prev, stop, stop_cost, leg),
                (Some(prev), None) => PathCandidate::join(prev, leg),
                (None, _) => leg,
            };
            if target.is_some() {
                waypoint_at.push(joined.len());
            }
            path = Some(joined);
            pending = next;
        }

        // The chain always ends with the destination leg.
        let path = path.ok_or_else(|| RouteError::Config("route composed no legs".into()))?;
        Ok(Composed { path, waypoint_at })
    }

    /// `true` if the vehicle can get from `origin` through `waypoints` to
    /// `target` without running out, and finds it open on arrival.
    fn reaches(
        &self,
        origin:         NodeId,
        departure_time: f64,
        vehicle:        &Vehicle,
        waypoints:      &[&ChargingOpportunity],
        target:         &ChargingOpportunity,
    ) -> bool {
        let network = self.view.network;
        let checked = self
            .compose(origin, target.node, departure_time, vehicle, waypoints)
            .and_then(|c| {
                let report = self.feasibility.check(network, &c.path, vehicle, vehicle.soc_kwh)?;
                Ok((c.path.arrival_time(), report.is_feasible()))
            });
        match checked {
            Ok((arrival, true)) if !target.is_available_at(arrival) => {
                log::debug!("{}: charger {} closed at arrival {arrival:.0} s", vehicle.id, target.id);
                false
            }
            Ok((_, feasible)) => feasible,
            Err(e) => {
                log::debug!("{}: charger {} unreachable: {e}", vehicle.id, target.id);
                false
            }
        }
    }
}
