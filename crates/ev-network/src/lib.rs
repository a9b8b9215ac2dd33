//! `ev-network`: transit network, per-mode sub-networks, and path search.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`network`]    | `TransitNetwork` (CSR + R-tree), `Link`, `TransitNetworkBuilder` |
//! | [`mode_cache`] | `ModeNetworkCache`, `ModeView`: filtered adjacency per mode |
//! | [`path`]       | `PathCandidate`, `ChargingStop`                            |
//! | [`search`]     | `CostFunction`, `PathSearch`, `DijkstraSearch`, `AStarSearch` |
//! | [`error`]      | `SearchError`, `SearchResult<T>`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod error;
pub mod mode_cache;
pub mod network;
pub mod path;
pub mod search;

#[cfg(test)]
mod tests;

pub use error::{SearchError, SearchResult};
pub use mode_cache::{ModeNetworkCache, ModeView};
pub use network::{Link, LinkSpec, TransitNetwork, TransitNetworkBuilder};
pub use path::{ChargingStop, PathCandidate};
pub use search::{AStarSearch, CostFunction, DijkstraSearch, PathSearch, minimum_cost_rate};
