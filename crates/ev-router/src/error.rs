use thiserror::Error;

use ev_charging::ChargingError;
use ev_core::{CoreError, LinkId, NodeId, TransportMode, VehicleId};
use ev_energy::EnergyError;
use ev_network::{PathCandidate, SearchError};

#[derive(Debug, Error)]
pub enum RouteError {
    /// Wiring problem detected while building the registry, e.g. a required
    /// mode with no travel-time/disutility binding.
    #[error("routing configuration error: {0}")]
    Config(String),

    /// Includes `UnknownVehicleProfile`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("no {mode} route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId, mode: TransportMode },

    #[error("no charging option available for vehicle {vehicle} before link {at_link}")]
    NoChargingOptionAvailable { vehicle: VehicleId, at_link: LinkId },

    /// The detour bound was exhausted.  `path` is the last candidate and
    /// `infeasible_at` the index of the link the vehicle could not complete.
    #[error("route infeasible for vehicle {vehicle}: charge runs out on link index {infeasible_at}")]
    RouteInfeasible {
        vehicle:       VehicleId,
        path:          Box<PathCandidate>,
        infeasible_at: usize,
    },

    #[error("search error: {0}")]
    Search(SearchError),

    #[error("charging infrastructure error: {0}")]
    Charging(ChargingError),

    #[error("energy model error: {0}")]
    Energy(#[from] EnergyError),
}

impl From<SearchError> for RouteError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::NoRoute { from, to, mode } => Self::NoRoute { from, to, mode },
            SearchError::Cost(core) => Self::Core(core),
            other => Self::Search(other),
        }
    }
}

impl From<ChargingError> for RouteError {
    fn from(e: ChargingError) -> Self {
        match e {
            ChargingError::NoChargingOptionAvailable { vehicle, at_link } => {
                Self::NoChargingOptionAvailable { vehicle, at_link }
            }
            other => Self::Charging(other),
        }
    }
}

pub type RouteResult<T> = Result<T, RouteError>;
