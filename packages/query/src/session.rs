//! The query orchestrator.

use std::sync::Arc;

use crime_lookup_aggregate::{AggregateRequest, FanOutConfig, aggregate, load_catalog};
use crime_lookup_geocoder::{
    LocationResolver, ResolveError, ResolvedLocation, resolver_from_env,
};
use crime_lookup_police::{CategoryTransport, IncidentTransport, PoliceApiError, PoliceClient};
use crime_lookup_police_models::{AggregateResult, CategoryCatalog, Period};
use thiserror::Error;

use crate::cache::{CacheKey, OnceMap, QueryCache};

/// Errors surfaced by [`Session::query`].
///
/// Partial data loss inside the fan-out is never an error; only failing
/// to resolve the location is.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The location text could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolveError),
}

/// Errors building a [`Session`] from the environment.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The police API client could not be built.
    #[error("Police client: {0}")]
    Police(#[from] PoliceApiError),

    /// No location resolver could be built.
    #[error("Location resolver: {0}")]
    Resolver(#[from] ResolveError),
}

/// A query session: the collaborators plus the caches that live for as
/// long as the session does.
///
/// Location text is resolved at most once per distinct (trimmed) text,
/// category catalogs are loaded at most once per period and aggregate
/// results at most once per (location, period). The catalog and result
/// caches coalesce concurrent misses, so two simultaneous queries for the
/// same key share one fan-out.
pub struct Session {
    resolver: Arc<dyn LocationResolver>,
    categories: Arc<dyn CategoryTransport>,
    incidents: Arc<dyn IncidentTransport>,
    config: FanOutConfig,
    resolutions: OnceMap<String, ResolvedLocation>,
    catalogs: OnceMap<Period, Arc<CategoryCatalog>>,
    results: QueryCache,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("resolutions", &self.resolutions.len())
            .field("catalogs", &self.catalogs.len())
            .field("results", &self.results.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session over the given collaborators with empty caches.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn LocationResolver>,
        categories: Arc<dyn CategoryTransport>,
        incidents: Arc<dyn IncidentTransport>,
        config: FanOutConfig,
    ) -> Self {
        Self {
            resolver,
            categories,
            incidents,
            config,
            resolutions: OnceMap::new(),
            catalogs: OnceMap::new(),
            results: QueryCache::new(),
        }
    }

    /// Creates a session against the live services, configured from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if an HTTP client cannot be built or no
    /// resolver service is enabled.
    pub fn from_env() -> Result<Self, SessionError> {
        let police = Arc::new(PoliceClient::from_env()?);
        let resolver = resolver_from_env()?;
        let config = FanOutConfig::from_env();

        log::info!(
            "Police API at {}, sub-fetch timeout {:?}",
            police.base_url(),
            config.subfetch_timeout
        );

        let categories: Arc<dyn CategoryTransport> = police.clone();
        let incidents: Arc<dyn IncidentTransport> = police;

        Ok(Self::new(resolver, categories, incidents, config))
    }

    /// Answers "what was the most common crime at `location` in `period`,
    /// and how often did it happen per month?".
    ///
    /// The text is trimmed and resolved once per distinct text; failed
    /// resolutions are not remembered. The result is cached under the
    /// resolved identifier, so differently formatted text for the same
    /// location shares a cache entry. Repeating a query returns the cached
    /// result without any network call.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Resolution`] if the text is blank or cannot
    /// be resolved. Nothing is cached in that case.
    pub async fn query(
        &self,
        location: &str,
        period: Period,
    ) -> Result<AggregateResult, QueryError> {
        let text = location.trim();
        if text.is_empty() {
            return Err(ResolveError::NotFound {
                query: text.to_string(),
            }
            .into());
        }

        let resolved = self.resolve(text).await?;
        let key = CacheKey::new(resolved.id.clone(), period);

        if let Some(hit) = self.results.get(&key) {
            log::debug!("Cache hit for {} {period}", key.location_id);
            return Ok(hit);
        }

        let result = self
            .results
            .get_or_compute(&key, || async {
                log::debug!("Cache miss for {} {period}", resolved.id);
                let catalog = self.catalog(period).await;
                let request = AggregateRequest {
                    location_id: resolved.id.clone(),
                    coordinate: resolved.coordinate,
                    period,
                };
                aggregate(self.incidents.as_ref(), &request, &catalog, &self.config).await
            })
            .await;

        Ok(result)
    }

    async fn resolve(&self, text: &str) -> Result<ResolvedLocation, ResolveError> {
        let text = text.to_string();
        if let Some(resolved) = self.resolutions.get(&text) {
            return Ok(resolved);
        }

        let resolved = self.resolver.resolve(&text).await?;
        self.resolutions.put(text, resolved.clone());
        Ok(resolved)
    }

    /// The category catalog for `period`, loaded on first use.
    pub async fn catalog(&self, period: Period) -> Arc<CategoryCatalog> {
        self.catalogs
            .get_or_init(&period, || async {
                Arc::new(load_catalog(self.categories.as_ref(), period, &self.config).await)
            })
            .await
    }

    /// The result cache.
    #[must_use]
    pub const fn cached_results(&self) -> &QueryCache {
        &self.results
    }

    /// The fan-out settings this session was built with.
    #[must_use]
    pub const fn config(&self) -> &FanOutConfig {
        &self.config
    }
}
