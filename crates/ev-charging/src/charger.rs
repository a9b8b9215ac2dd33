//! Charging opportunities and their opening hours.

use ev_core::{ChargerId, GeoPoint, LinkId, NodeId};

const DAY_S: f64 = 86_400.0;

/// Daily opening window in seconds since midnight, half-open `[open, close)`.
///
/// `open > close` wraps past midnight (e.g. a depot open 22:00–06:00).
/// Times beyond 24 h are folded into the day.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvailabilityWindow {
    pub open_s:  f64,
    pub close_s: f64,
}

impl AvailabilityWindow {
    pub const ALWAYS: Self = Self { open_s: 0.0, close_s: DAY_S };

    pub fn new(open_s: f64, close_s: f64) -> Self {
        Self { open_s, close_s }
    }

    pub fn is_always(&self) -> bool {
        self.close_s - self.open_s >= DAY_S
    }

    pub fn contains(&self, time: f64) -> bool {
        if self.is_always() {
            return true;
        }
        let t = time.rem_euclid(DAY_S);
        if self.open_s <= self.close_s {
            t >= self.open_s && t < self.close_s
        } else {
            t >= self.open_s || t < self.close_s
        }
    }
}

impl Default for AvailabilityWindow {
    fn default() -> Self {
        Self::ALWAYS
    }
}

/// Raw charger record from the infrastructure specification.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargerSpec {
    pub id:           ChargerId,
    /// Link the charger is attached to.  Vehicles charge at its to-node.
    pub link:         LinkId,
    pub power_kw:     f64,
    pub availability: AvailabilityWindow,
}

impl ChargerSpec {
    pub fn new(id: ChargerId, link: LinkId, power_kw: f64) -> Self {
        Self { id, link, power_kw, availability: AvailabilityWindow::ALWAYS }
    }

    pub fn available(mut self, window: AvailabilityWindow) -> Self {
        self.availability = window;
        self
    }
}

/// A charger resolved against the network.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargingOpportunity {
    pub id:           ChargerId,
    pub link:         LinkId,
    /// Where the vehicle stops to charge: the to-node of `link`.
    pub node:         NodeId,
    pub pos:          GeoPoint,
    pub power_kw:     f64,
    pub availability: AvailabilityWindow,
}

impl ChargingOpportunity {
    #[inline]
    pub fn is_available_at(&self, time: f64) -> bool {
        self.availability.contains(time)
    }
}
