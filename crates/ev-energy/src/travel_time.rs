//! Link travel-time providers.

use ev_core::Vehicle;
use ev_network::Link;

use crate::{EnergyError, EnergyResult};

const DAY_S: f64 = 86_400.0;

/// Time to traverse a link entered at a given time.
///
/// # Contract
///
/// Never faster than free flow: `link_travel_time(l, t, v) ≥ l.free_flow_time_s()`.
/// The cost function's minimum-cost bound relies on this.
pub trait TravelTime: Send + Sync {
    fn link_travel_time(&self, link: &Link, time: f64, vehicle: &Vehicle) -> f64;
}

/// Uncongested travel time, `length / free_speed`.
#[derive(Copy, Clone, Debug, Default)]
pub struct FreeSpeedTravelTime;

impl TravelTime for FreeSpeedTravelTime {
    #[inline]
    fn link_travel_time(&self, link: &Link, _time: f64, _vehicle: &Vehicle) -> f64 {
        link.free_flow_time_s()
    }
}

/// Free-flow time scaled by a congestion factor looked up per time-of-day bin.
///
/// Times wrap at 24 h, so a departure at 25:00 uses the 01:00 bin.  Factors
/// below 1 are clamped to 1.
#[derive(Clone, Debug)]
pub struct TimeOfDayTravelTime {
    bin_s:   f64,
    factors: Vec<f64>,
}

impl TimeOfDayTravelTime {
    pub fn new(bin_s: f64, factors: Vec<f64>) -> EnergyResult<Self> {
        if !(bin_s.is_finite() && bin_s > 0.0) {
            return Err(EnergyError::InvalidTravelTime(format!("bin width must be positive, got {bin_s}")));
        }
        if factors.is_empty() {
            return Err(EnergyError::InvalidTravelTime("no congestion factors".into()));
        }
        if factors.iter().any(|f| !f.is_finite()) {
            return Err(EnergyError::InvalidTravelTime("congestion factors must be finite".into()));
        }
        let factors = factors.into_iter().map(|f| f.max(1.0)).collect();
        Ok(Self { bin_s, factors })
    }

    /// Hourly factors, one per hour of the day.
    pub fn hourly(factors: [f64; 24]) -> EnergyResult<Self> {
        Self::new(3600.0, factors.to_vec())
    }

    pub fn factor_at(&self, time: f64) -> f64 {
        if !time.is_finite() {
            return 1.0;
        }
        let bin = (time.rem_euclid(DAY_S) / self.bin_s) as usize;
        self.factors[bin.min(self.factors.len() - 1)]
    }
}

impl TravelTime for TimeOfDayTravelTime {
    fn link_travel_time(&self, link: &Link, time: f64, _vehicle: &Vehicle) -> f64 {
        link.free_flow_time_s() * self.factor_at(time)
    }
}
