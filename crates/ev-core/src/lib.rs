//! `ev-core`: foundational types for energy-aware transit routing.
//!
//! This crate is a dependency of every other `ev-*` crate.  It intentionally
//! has no `ev-*` dependencies and a single external one (`thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `LinkId`, `VehicleId`, `ProfileId`, `ChargerId` |
//! | [`geo`]         | `GeoPoint`, haversine distance                        |
//! | [`transport`]   | `TransportMode` enum, `ModeSet` bitmask               |
//! | [`vehicle`]     | `Vehicle`: the per-request vehicle record            |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod transport;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::GeoPoint;
pub use ids::{ChargerId, LinkId, NodeId, ProfileId, VehicleId};
pub use transport::{ModeSet, TransportMode};
pub use vehicle::Vehicle;
