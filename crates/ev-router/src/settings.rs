//! Routing settings and the charging policy applied at detour waypoints.

use std::sync::Arc;

use ev_network::{AStarSearch, DijkstraSearch, PathSearch};

use crate::{RouteError, RouteResult};

/// Share of grid energy that ends up in the battery.
pub const DEFAULT_CHARGING_EFFICIENCY: f64 = 0.9;

// ── SearchKind ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SearchKind {
    Dijkstra,
    /// A* with the great-circle lower bound.
    #[default]
    AStar,
}

impl SearchKind {
    pub fn engine(self) -> Arc<dyn PathSearch> {
        match self {
            SearchKind::Dijkstra => Arc::new(DijkstraSearch),
            SearchKind::AStar => Arc::new(AStarSearch),
        }
    }
}

// ── ChargingPolicy ────────────────────────────────────────────────────────────

/// How much a vehicle charges when it stops at a detour waypoint.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChargingPolicy {
    /// Charge up to this fraction of battery capacity.
    pub target_soc_fraction: f64,
    /// Leave after at most this many seconds, whatever the charge.
    pub max_dwell_s:         Option<f64>,
    pub efficiency:          f64,
}

impl Default for ChargingPolicy {
    fn default() -> Self {
        Self {
            target_soc_fraction: 1.0,
            max_dwell_s:         None,
            efficiency:          DEFAULT_CHARGING_EFFICIENCY,
        }
    }
}

impl ChargingPolicy {
    /// Charge after the stop and the dwell time, for a vehicle arriving with
    /// `before_kwh` at a charger delivering `power_kw`.
    ///
    /// Returns `(after_kwh, dwell_s)`.  A vehicle already at or above the
    /// target does not stop.
    pub fn plan(&self, before_kwh: f64, capacity_kwh: f64, power_kw: f64) -> (f64, f64) {
        let target = capacity_kwh * self.target_soc_fraction;
        let rate_kw = power_kw * self.efficiency;
        if before_kwh >= target || rate_kw <= 0.0 {
            return (before_kwh, 0.0);
        }

        let full_dwell_s = (target - before_kwh) / rate_kw * 3600.0;
        match self.max_dwell_s {
            Some(cap) if full_dwell_s > cap => (before_kwh + rate_kw * cap / 3600.0, cap),
            _ => (target, full_dwell_s),
        }
    }
}

// ── RoutingSettings ───────────────────────────────────────────────────────────

/// Settings shared by every routing request.
///
/// Typically loaded from a TOML file by the application crate:
///
/// ```toml
/// max_detours = 1
/// max_charger_candidates = 8
/// reserve_fraction = 0.1
/// search = "a_star"
///
/// [charging]
/// target_soc_fraction = 0.8
/// max_dwell_s = 1800.0
/// efficiency = 0.9
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoutingSettings {
    /// Charging waypoints one route may gain before it is declared
    /// infeasible.
    pub max_detours:            u32,
    /// Off-path chargers offered to the reachability check per detour.
    pub max_charger_candidates: usize,
    /// Share of capacity that must remain in the battery at all times.
    pub reserve_fraction:       f64,
    pub charging:               ChargingPolicy,
    pub search:                 SearchKind,
    /// Worker thread count for batch routing.  `None` uses all logical cores.
    pub num_threads:            Option<usize>,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            max_detours:            1,
            max_charger_candidates: ev_charging::index::DEFAULT_MAX_CANDIDATES,
            reserve_fraction:       0.0,
            charging:               ChargingPolicy::default(),
            search:                 SearchKind::default(),
            num_threads:            None,
        }
    }
}

impl RoutingSettings {
    pub fn validate(&self) -> RouteResult<()> {
        let bad = |msg: String| Err(RouteError::Config(msg));
        let c = &self.charging;

        if !(0.0..1.0).contains(&self.reserve_fraction) {
            return bad(format!("reserve_fraction must be in [0, 1), got {}", self.reserve_fraction));
        }
        if !(c.target_soc_fraction > 0.0 && c.target_soc_fraction <= 1.0) {
            return bad(format!("target_soc_fraction must be in (0, 1], got {}", c.target_soc_fraction));
        }
        if c.target_soc_fraction <= self.reserve_fraction {
            return bad("target_soc_fraction must exceed reserve_fraction".into());
        }
        if !(c.efficiency > 0.0 && c.efficiency <= 1.0) {
            return bad(format!("charging efficiency must be in (0, 1], got {}", c.efficiency));
        }
        if let Some(cap) = c.max_dwell_s {
            if !(cap.is_finite() && cap > 0.0) {
                return bad(format!("max_dwell_s must be positive, got {cap}"));
            }
        }
        if self.max_charger_candidates == 0 {
            return bad("max_charger_candidates must be at least 1".into());
        }
        if self.num_threads == Some(0) {
            return bad("num_threads must be at least 1".into());
        }
        Ok(())
    }
}
