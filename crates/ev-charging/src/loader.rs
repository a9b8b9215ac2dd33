//! CSV charger loader.
//!
//! # CSV format
//!
//! ```csv
//! charger_id,link_id,power_kw,open_s,close_s
//! 0,17,150,,
//! 1,42,50,21600,79200
//! ```
//!
//! Empty `open_s`/`close_s` mean the charger is always available.  Link ids
//! are checked when the index is built, not here.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use ev_core::{ChargerId, LinkId};

use crate::charger::{AvailabilityWindow, ChargerSpec};
use crate::{ChargingError, ChargingResult};

#[derive(Deserialize)]
struct ChargerRecord {
    charger_id: u32,
    link_id:    u32,
    power_kw:   f64,
    open_s:     Option<f64>,
    close_s:    Option<f64>,
}

pub fn load_chargers_csv(path: &Path) -> ChargingResult<Vec<ChargerSpec>> {
    let file = std::fs::File::open(path).map_err(ChargingError::Io)?;
    load_chargers_reader(file)
}

/// Like [`load_chargers_csv`] but accepts any `Read` source.
pub fn load_chargers_reader<R: Read>(reader: R) -> ChargingResult<Vec<ChargerSpec>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut specs = Vec::new();

    for result in csv_reader.deserialize::<ChargerRecord>() {
        let row = result.map_err(|e| ChargingError::Parse(e.to_string()))?;
        let id = ChargerId(row.charger_id);
        let availability = match (row.open_s, row.close_s) {
            (None, None) => AvailabilityWindow::ALWAYS,
            (Some(open), Some(close)) => AvailabilityWindow::new(open, close),
            _ => {
                return Err(ChargingError::Parse(format!(
                    "charger {id}: open_s and close_s must both be set or both be empty"
                )));
            }
        };
        specs.push(ChargerSpec::new(id, LinkId(row.link_id), row.power_kw).available(availability));
    }

    Ok(specs)
}
