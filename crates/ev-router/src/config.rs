//! Per-mode routing bindings.

use std::sync::Arc;

use ev_energy::{CostWeights, FareModel, FreeSpeedTravelTime, NoFare, TravelTime};

/// Travel-time provider, disutility weights and fare lookup for one
/// transport mode.
#[derive(Clone)]
pub struct ModeRoutingConfig {
    pub travel_time: Arc<dyn TravelTime>,
    pub weights:     CostWeights,
    pub fare:        Arc<dyn FareModel>,
}

impl ModeRoutingConfig {
    pub fn new(travel_time: Arc<dyn TravelTime>, weights: CostWeights) -> Self {
        Self { travel_time, weights, fare: Arc::new(NoFare) }
    }

    /// Free-flow travel times, no fare.
    pub fn free_flow(weights: CostWeights) -> Self {
        Self::new(Arc::new(FreeSpeedTravelTime), weights)
    }

    pub fn with_fare(mut self, fare: Arc<dyn FareModel>) -> Self {
        self.fare = fare;
        self
    }
}
