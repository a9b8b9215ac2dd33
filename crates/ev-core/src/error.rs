//! Shared error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`, so a vehicle-profile failure raised deep inside a
//! cost function surfaces unchanged at the router.

use thiserror::Error;

use crate::{ProfileId, VehicleId};

/// Errors shared by every `ev-*` crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("vehicle {vehicle} references unknown powertrain profile {profile}")]
    UnknownVehicleProfile { vehicle: VehicleId, profile: ProfileId },

    #[error("vehicle {vehicle}: state of charge {soc_kwh} kWh outside [0, {capacity_kwh}] kWh")]
    InvalidStateOfCharge {
        vehicle:      VehicleId,
        soc_kwh:      f64,
        capacity_kwh: f64,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `ev-core` operations.
pub type CoreResult<T> = Result<T, CoreError>;
