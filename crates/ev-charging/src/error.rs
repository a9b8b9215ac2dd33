use thiserror::Error;

use ev_core::{ChargerId, LinkId, VehicleId};

#[derive(Debug, Error)]
pub enum ChargingError {
    /// No charger can be reached before the vehicle runs out.  Terminal for
    /// the request.
    #[error("no charging option available for vehicle {vehicle} before link {at_link}")]
    NoChargingOptionAvailable { vehicle: VehicleId, at_link: LinkId },

    /// The vehicle would reach the charger outside its opening hours.
    #[error("charger {charger} is closed at {time:.0} s")]
    ChargerClosed { charger: ChargerId, time: f64 },

    #[error("charger {charger} references unknown link {link}")]
    UnknownLink { charger: ChargerId, link: LinkId },

    #[error("charger {charger}: {reason}")]
    InvalidCharger { charger: ChargerId, reason: String },

    #[error("duplicate charger id {0}")]
    DuplicateCharger(ChargerId),

    #[error("charger parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChargingResult<T> = Result<T, ChargingError>;
