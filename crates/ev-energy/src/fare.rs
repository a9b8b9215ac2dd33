//! Monetary fares charged per link.

use ev_network::Link;

/// Fare charged for traversing a link entered at `time`.
pub trait FareModel: Send + Sync {
    fn fare(&self, link: &Link, time: f64) -> f64;

    /// Lower bound of [`fare`](Self::fare) over all entry times.
    fn minimum_fare(&self, _link: &Link) -> f64 {
        0.0
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoFare;

impl FareModel for NoFare {
    fn fare(&self, _link: &Link, _time: f64) -> f64 {
        0.0
    }
}

/// Distance-based fare with an optional peak-hour multiplier.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceFare {
    pub per_km:          f64,
    pub peak_multiplier: f64,
    /// Half-open `[start, end)` windows in seconds since midnight.
    pub peak_windows:    Vec<(f64, f64)>,
}

impl DistanceFare {
    pub fn flat(per_km: f64) -> Self {
        Self { per_km: per_km.max(0.0), peak_multiplier: 1.0, peak_windows: Vec::new() }
    }

    pub fn with_peak(mut self, multiplier: f64, windows: Vec<(f64, f64)>) -> Self {
        self.peak_multiplier = multiplier.max(0.0);
        self.peak_windows    = windows;
        self
    }

    fn is_peak(&self, time: f64) -> bool {
        self.peak_windows.iter().any(|&(start, end)| time >= start && time < end)
    }
}

impl FareModel for DistanceFare {
    fn fare(&self, link: &Link, time: f64) -> f64 {
        let base = self.per_km * link.length_m / 1000.0;
        if self.is_peak(time) { base * self.peak_multiplier } else { base }
    }

    fn minimum_fare(&self, link: &Link) -> f64 {
        let base = self.per_km * link.length_m / 1000.0;
        if self.peak_windows.is_empty() { base } else { base * self.peak_multiplier.min(1.0) }
    }
}
