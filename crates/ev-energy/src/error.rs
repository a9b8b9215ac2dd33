use thiserror::Error;

use ev_core::{CoreError, ProfileId, VehicleId};

#[derive(Debug, Error)]
pub enum EnergyError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("vehicle {0} is not in the electric fleet specification")]
    UnknownVehicle(VehicleId),

    #[error("invalid powertrain profile {profile}: {reason}")]
    InvalidProfile { profile: ProfileId, reason: String },

    #[error("invalid cost weights: {0}")]
    InvalidWeights(String),

    #[error("invalid travel-time provider: {0}")]
    InvalidTravelTime(String),

    #[error("fleet parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EnergyResult<T> = Result<T, EnergyError>;
