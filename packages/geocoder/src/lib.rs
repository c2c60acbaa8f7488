#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location resolution for crime lookups.
//!
//! Turns a user-entered location string (a UK postcode) into a canonical
//! [`LocationId`] and a [`Coordinate`] the police API can be queried at.
//! Resolvers are configured via TOML files in `services/` and loaded from
//! the [`service_registry`]; [`resolver_from_env`] builds the highest
//! priority enabled one.

pub mod postcodes;
pub mod service_registry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crime_lookup_police_models::{Coordinate, LocationId};
use thiserror::Error;

use crate::service_registry::ProviderConfig;

/// A resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Canonical identifier (e.g. `"SW1A 1AA"` for `"sw1a1aa"`).
    pub id: LocationId,
    /// Centroid of the location.
    pub coordinate: Coordinate,
}

/// Errors from location resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The location could not be resolved to a coordinate.
    #[error("Location not found: '{query}'")]
    NotFound {
        /// The (trimmed) text that was looked up.
        query: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The resolver answered with an unexpected HTTP status.
    #[error("Resolver returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// No resolver service is enabled in the registry.
    #[error("No location resolver service is enabled")]
    NoService,
}

/// Resolves free-form location text to a canonical location.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Resolves `text` (already trimmed by the caller).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] if the text does not name a
    /// known location, or another [`ResolveError`] if the lookup fails.
    async fn resolve(&self, text: &str) -> Result<ResolvedLocation, ResolveError>;
}

/// Builds the highest-priority enabled resolver.
///
/// `POSTCODES_API_URL` overrides the base URL from the service TOML.
///
/// # Errors
///
/// Returns [`ResolveError::NoService`] if every service is disabled, or
/// [`ResolveError::Http`] if the HTTP client cannot be built.
pub fn resolver_from_env() -> Result<Arc<dyn LocationResolver>, ResolveError> {
    let service = service_registry::enabled_services()
        .into_iter()
        .next()
        .ok_or(ResolveError::NoService)?;

    log::debug!("Using location resolver '{}' ({})", service.id, service.name);

    match service.provider {
        ProviderConfig::PostcodesIo {
            base_url,
            timeout_secs,
        } => {
            let base_url = std::env::var("POSTCODES_API_URL").unwrap_or(base_url);
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()?;
            Ok(Arc::new(postcodes::PostcodesIoResolver::new(
                client, base_url,
            )))
        }
    }
}
