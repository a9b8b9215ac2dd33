//! `ev-energy`: energy consumption, link disutility, and charge feasibility.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`fleet`]       | `PowertrainProfile`, `ElectricVehicleSpec`, `FleetSpecification` |
//! | [`loader`]      | `load_fleet_csv`, `load_fleet_reader`                     |
//! | [`consumption`] | `EnergyConsumption` trait, `PhysicsConsumptionModel`, `LinkEnergy` |
//! | [`travel_time`] | `TravelTime` trait, free-speed and time-of-day providers  |
//! | [`fare`]        | `FareModel` trait, `NoFare`, `DistanceFare`               |
//! | [`cost`]        | `CostWeights`, `LinkCostFunction`                         |
//! | [`soc`]         | `StateOfChargeTracker`, `FeasibilityChecker`, `EnergyFeasibilityChecker` |
//! | [`error`]       | `EnergyError`, `EnergyResult<T>`                          |
//!
//! # Units
//!
//! Distances in metres, speeds in m/s, times in seconds (absolute times are
//! seconds since midnight of the service day), energy in kWh, power in kW.

pub mod consumption;
pub mod cost;
pub mod error;
pub mod fare;
pub mod fleet;
pub mod loader;
pub mod soc;
pub mod travel_time;

#[cfg(test)]
mod tests;

pub use consumption::{Climate, EnergyConsumption, LinkEnergy, PhysicalConstants, PhysicsConsumptionModel};
pub use cost::{CostWeights, LinkCostFunction, MarginalUtilities};
pub use error::{EnergyError, EnergyResult};
pub use fare::{DistanceFare, FareModel, NoFare};
pub use fleet::{ElectricVehicleSpec, FleetSpecification, PowertrainProfile};
pub use loader::{load_fleet_csv, load_fleet_reader};
pub use soc::{EnergyFeasibilityChecker, FeasibilityChecker, SocReport, SocState, StateOfChargeTracker};
pub use travel_time::{FreeSpeedTravelTime, TimeOfDayTravelTime, TravelTime};
