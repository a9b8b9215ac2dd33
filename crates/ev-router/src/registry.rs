//! Explicit per-mode wiring and batch routing.

use std::sync::Arc;

use ev_charging::{ChargerSpec, ChargingInfrastructureIndex};
use ev_core::{LinkId, ModeSet, NodeId, TransportMode, Vehicle};
use ev_energy::{
    Climate, EnergyConsumption, EnergyFeasibilityChecker, FeasibilityChecker, FleetSpecification,
    LinkCostFunction, PhysicsConsumptionModel,
};
use ev_network::{ModeNetworkCache, PathCandidate, PathSearch, TransitNetwork};

use crate::composer::RouteComposer;
use crate::config::ModeRoutingConfig;
use crate::settings::RoutingSettings;
use crate::{RouteError, RouteResult};

// ── RoutingRegistryBuilder ────────────────────────────────────────────────────

/// Fluent builder for [`RoutingRegistry`].
///
/// # Required inputs
///
/// - the network, shared behind an `Arc`
/// - the [`FleetSpecification`]
/// - at least one [`ModeRoutingConfig`] via [`mode`](Self::mode)
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                                          |
/// |---------------------|--------------------------------------------------|
/// | `.settings(s)`      | `RoutingSettings::default()`                     |
/// | `.chargers(v)`      | no charging infrastructure                       |
/// | `.energy_model(m)`  | `PhysicsConsumptionModel` over the fleet         |
/// | `.climate(c)`       | 20 °C ambient and comfort (no HVAC load)         |
/// | `.search_engine(e)` | from `settings.search`                           |
/// | `.feasibility(f)`   | `EnergyFeasibilityChecker` with the settings' reserve |
/// | `.require(modes)`   | only the bound modes                             |
///
/// # Example
///
/// ```rust,ignore
/// let registry = RoutingRegistry::builder(network, fleet)
///     .mode(TransportMode::Bus, ModeRoutingConfig::free_flow(weights))
///     .chargers(chargers)
///     .require(TransportMode::Bus)
///     .build()?;
/// let path = registry.route(TransportMode::Bus, origin, dest, 8.0 * 3600.0, &vehicle)?;
/// ```
pub struct RoutingRegistryBuilder {
    network:     Arc<TransitNetwork>,
    fleet:       Arc<FleetSpecification>,
    settings:    RoutingSettings,
    modes:       [Option<ModeRoutingConfig>; TransportMode::COUNT],
    required:    ModeSet,
    chargers:    Vec<ChargerSpec>,
    energy:      Option<Arc<dyn EnergyConsumption>>,
    climate:     Climate,
    search:      Option<Arc<dyn PathSearch>>,
    feasibility: Option<Arc<dyn FeasibilityChecker>>,
}

impl RoutingRegistryBuilder {
    pub fn new(network: Arc<TransitNetwork>, fleet: Arc<FleetSpecification>) -> Self {
        Self {
            network,
            fleet,
            settings:    RoutingSettings::default(),
            modes:       std::array::from_fn(|_| None),
            required:    ModeSet::EMPTY,
            chargers:    Vec::new(),
            energy:      None,
            climate:     Climate::default(),
            search:      None,
            feasibility: None,
        }
    }

    pub fn settings(mut self, settings: RoutingSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Bind travel time, weights and fare for `mode`.  A later call for the
    /// same mode replaces the earlier one.
    pub fn mode(mut self, mode: TransportMode, config: ModeRoutingConfig) -> Self {
        self.modes[mode.index()] = Some(config);
        self
    }

    /// Modes the application will route.  `build` fails if any lacks a
    /// binding.
    pub fn require(mut self, modes: impl Into<ModeSet>) -> Self {
        self.required = modes.into();
        self
    }

    pub fn chargers(mut self, chargers: Vec<ChargerSpec>) -> Self {
        self.chargers = chargers;
        self
    }

    pub fn energy_model(mut self, model: Arc<dyn EnergyConsumption>) -> Self {
        self.energy = Some(model);
        self
    }

    /// Ambient conditions for the default physics model.  Ignored when a
    /// custom [`energy_model`](Self::energy_model) is supplied.
    pub fn climate(mut self, climate: Climate) -> Self {
        self.climate = climate;
        self
    }

    pub fn search_engine(mut self, search: Arc<dyn PathSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn feasibility(mut self, checker: Arc<dyn FeasibilityChecker>) -> Self {
        self.feasibility = Some(checker);
        self
    }

    /// Validate the wiring, build the cost functions and the charger index,
    /// and return a ready-to-route registry.
    pub fn build(self) -> RouteResult<RoutingRegistry> {
        self.settings.validate()?;

        // ── Mode bindings ─────────────────────────────────────────────────
        for mode in self.required.iter() {
            if self.modes[mode.index()].is_none() {
                return Err(RouteError::Config(format!(
                    "no travel-time/disutility binding for required mode {mode}"
                )));
            }
        }
        if self.modes.iter().all(Option::is_none) {
            return Err(RouteError::Config("no transport mode is bound".into()));
        }

        // ── Shared capabilities ───────────────────────────────────────────
        let energy: Arc<dyn EnergyConsumption> = match self.energy {
            Some(model) => model,
            None => Arc::new(
                PhysicsConsumptionModel::new(Arc::clone(&self.fleet)).with_climate(self.climate),
            ),
        };
        let feasibility: Arc<dyn FeasibilityChecker> = match self.feasibility {
            Some(checker) => checker,
            None => Arc::new(
                EnergyFeasibilityChecker::new(Arc::clone(&energy), Arc::clone(&self.fleet))
                    .with_reserve_fraction(self.settings.reserve_fraction),
            ),
        };
        let search = self.search.unwrap_or_else(|| self.settings.search.engine());

        // ── Per-mode cost functions ───────────────────────────────────────
        let mut costs: [Option<LinkCostFunction>; TransportMode::COUNT] = std::array::from_fn(|_| None);
        for (slot, config) in costs.iter_mut().zip(self.modes) {
            if let Some(ModeRoutingConfig { travel_time, weights, fare }) = config {
                let cost = LinkCostFunction::new(weights, travel_time, Arc::clone(&energy), Arc::clone(&self.fleet))?
                    .with_fare(fare);
                *slot = Some(cost);
            }
        }

        let chargers = ChargingInfrastructureIndex::build(&self.network, self.chargers)
            .map_err(RouteError::Charging)?
            .with_max_candidates(self.settings.max_charger_candidates);

        log::info!(
            "routing registry: {} nodes, {} links, {} chargers, modes [{}]",
            self.network.node_count(),
            self.network.link_count(),
            chargers.len(),
            TransportMode::ALL
                .iter()
                .filter(|m| costs[m.index()].is_some())
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(RoutingRegistry {
            cache: ModeNetworkCache::new(self.network),
            fleet: self.fleet,
            costs,
            search,
            feasibility,
            chargers,
            settings: self.settings,
        })
    }
}

// ── RouteRequest ──────────────────────────────────────────────────────────────

/// One trip to route in a batch.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteRequest {
    pub mode:           TransportMode,
    pub origin:         NodeId,
    pub destination:    NodeId,
    /// Seconds since midnight.
    pub departure_time: f64,
    pub vehicle:        Vehicle,
}

// ── RoutingRegistry ───────────────────────────────────────────────────────────

/// Everything routing needs, built once and shared read-only.
///
/// `Send + Sync`: wrap it in an `Arc` or borrow it from worker threads.
pub struct RoutingRegistry {
    cache:       ModeNetworkCache,
    fleet:       Arc<FleetSpecification>,
    costs:       [Option<LinkCostFunction>; TransportMode::COUNT],
    search:      Arc<dyn PathSearch>,
    feasibility: Arc<dyn FeasibilityChecker>,
    chargers:    ChargingInfrastructureIndex,
    settings:    RoutingSettings,
}

impl RoutingRegistry {
    pub fn builder(network: Arc<TransitNetwork>, fleet: Arc<FleetSpecification>) -> RoutingRegistryBuilder {
        RoutingRegistryBuilder::new(network, fleet)
    }

    pub fn network(&self) -> &TransitNetwork {
        self.cache.network()
    }

    pub fn fleet(&self) -> &FleetSpecification {
        &self.fleet
    }

    pub fn chargers(&self) -> &ChargingInfrastructureIndex {
        &self.chargers
    }

    pub fn settings(&self) -> &RoutingSettings {
        &self.settings
    }

    pub fn mode_cache(&self) -> &ModeNetworkCache {
        &self.cache
    }

    pub fn is_bound(&self, mode: TransportMode) -> bool {
        self.costs[mode.index()].is_some()
    }

    pub fn cost_function(&self, mode: TransportMode) -> RouteResult<&LinkCostFunction> {
        self.costs[mode.index()]
            .as_ref()
            .ok_or_else(|| RouteError::Config(format!("mode {mode} is not bound")))
    }

    /// A composer over `mode`'s sub-network, filtering it on first use.
    pub fn composer(&self, mode: TransportMode) -> RouteResult<RouteComposer<'_>> {
        let cost = self.cost_function(mode)?;
        Ok(RouteComposer::new(
            self.cache.view(mode),
            cost,
            self.search.as_ref(),
            self.feasibility.as_ref(),
            &self.chargers,
            &self.settings,
        ))
    }

    pub fn route(
        &self,
        mode:           TransportMode,
        origin:         NodeId,
        destination:    NodeId,
        departure_time: f64,
        vehicle:        &Vehicle,
    ) -> RouteResult<PathCandidate> {
        self.composer(mode)?.route(origin, destination, departure_time, vehicle)
    }

    /// Disutility of traversing `link` by `mode`, for comparing modes outside
    /// a search.
    pub fn estimate_disutility(
        &self,
        mode:    TransportMode,
        link:    LinkId,
        time:    f64,
        vehicle: &Vehicle,
    ) -> RouteResult<f64> {
        let network = self.network();
        if link.index() >= network.link_count() {
            return Err(RouteError::Config(format!("unknown link {link}")));
        }
        Ok(self.cost_function(mode)?.estimate_disutility(&network.link(link), time, vehicle)?)
    }

    /// Route every request independently.  The result vector is in request
    /// order; a failed request never affects the others.
    ///
    /// With the `parallel` feature the batch runs on Rayon, on a dedicated
    /// pool when `settings.num_threads` is set.
    pub fn route_all(&self, requests: &[RouteRequest]) -> Vec<RouteResult<PathCandidate>> {
        let one = |r: &RouteRequest| self.route(r.mode, r.origin, r.destination, r.departure_time, &r.vehicle);

        #[cfg(not(feature = "parallel"))]
        let results: Vec<_> = requests.iter().map(one).collect();

        #[cfg(feature = "parallel")]
        let results: Vec<_> = {
            use rayon::prelude::*;

            let run = || -> Vec<RouteResult<PathCandidate>> { requests.par_iter().map(one).collect() };
            match self.settings.num_threads {
                Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                    Ok(pool) => pool.install(run),
                    Err(e) => {
                        log::warn!("could not build a {n}-thread pool ({e}); using the global pool");
                        run()
                    }
                },
                None => run(),
            }
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            log::warn!("{failed} of {} route requests failed", requests.len());
        }
        results
    }
}
