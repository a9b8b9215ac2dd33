//! `ev-router`: energy-aware route composition.
//!
//! # Request flow
//!
//! ```text
//! route(mode, origin, destination, departure_time, vehicle)
//!   ① Searching:  least-cost search on the mode's sub-network, one leg per
//!                 charging waypoint, edge weights from LinkCostFunction.
//!   ② Validating: replay the path through the feasibility checker.
//!   ③ Detouring:  on a shortfall, ask the charger index for a waypoint
//!                 and go back to ①; at most `max_detours` times.
//! ```
//!
//! # Wiring
//!
//! [`RoutingRegistry`] holds the shared network, fleet, per-mode cost
//! functions, charger index and settings.  Bindings are explicit
//! [`ModeRoutingConfig`] values; a required mode with no binding is a
//! configuration error at build time, never a per-request failure.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | `route_all` runs on Rayon's thread pool.               |
//! | `serde`    | Serde derives for settings, requests and paths.        |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ev_core::TransportMode;
//! use ev_energy::CostWeights;
//! use ev_router::{ModeRoutingConfig, RoutingRegistry};
//!
//! let registry = RoutingRegistry::builder(network, fleet)
//!     .mode(TransportMode::Bus, ModeRoutingConfig::free_flow(CostWeights::default()))
//!     .chargers(chargers)
//!     .build()?;
//! let path = registry.route(TransportMode::Bus, origin, destination, 28_800.0, &vehicle)?;
//! ```

pub mod composer;
pub mod config;
pub mod error;
pub mod registry;
pub mod settings;


pub use composer::RouteComposer;
pub use config::ModeRoutingConfig;
pub use error::{RouteError, RouteResult};
pub use registry::{RouteRequest, RoutingRegistry, RoutingRegistryBuilder};
pub use settings::{ChargingPolicy, RoutingSettings, SearchKind, DEFAULT_CHARGING_EFFICIENCY};
