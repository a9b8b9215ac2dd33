//! `ev-charging`: where vehicles can recharge, and which charger to use
//! when a path runs out of energy.
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`charger`] | `ChargerSpec`, `ChargingOpportunity`, `AvailabilityWindow` |
//! | [`loader`]  | `load_chargers_csv`, `load_chargers_reader`               |
//! | [`index`]   | `ChargingInfrastructureIndex`, `Shortfall`, `OpportunityMatch` |
//! | [`error`]   | `ChargingError`, `ChargingResult<T>`                      |

pub mod charger;
pub mod error;
pub mod index;
pub mod loader;


pub use charger::{AvailabilityWindow, ChargerSpec, ChargingOpportunity};
pub use error::{ChargingError, ChargingResult};
pub use index::{ChargingInfrastructureIndex, OpportunityMatch, Placement, Shortfall};
pub use loader::{load_chargers_csv, load_chargers_reader};
