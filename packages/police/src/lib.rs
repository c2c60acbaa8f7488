#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Transport for the data.police.uk API.
//!
//! The API only answers questions one month at a time, so the two
//! endpoints used here are exposed as per-month traits:
//!
//! - [`CategoryTransport`]: `GET /crime-categories?date=YYYY-MM`
//! - [`IncidentTransport`]: `GET /crimes-at-location?date=YYYY-MM&lat=..&lng=..`
//!
//! [`PoliceClient`] implements both against the live API. The traits are
//! the seam the aggregation layer depends on, so tests substitute
//! in-memory implementations.
//!
//! See <https://data.police.uk/docs/>

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use crime_lookup_police_models::{
    CategoryListEntry, Coordinate, MonthlyIncidentBatch, YearMonth,
};

/// Default base URL of the police API.
pub const DEFAULT_BASE_URL: &str = "https://data.police.uk/api";

/// Default per-request timeout of the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from police API requests.
#[derive(Debug, thiserror::Error)]
pub enum PoliceApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {url}")]
    RateLimited {
        /// Request URL.
        url: String,
    },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fetches the category list for a single month.
#[async_trait]
pub trait CategoryTransport: Send + Sync {
    /// Returns every category the API knows for `month`.
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] if the request or decoding fails.
    async fn fetch_categories(
        &self,
        month: YearMonth,
    ) -> Result<Vec<CategoryListEntry>, PoliceApiError>;
}

/// Fetches the incidents recorded near a coordinate for a single month.
#[async_trait]
pub trait IncidentTransport: Send + Sync {
    /// Returns the incidents recorded at `coordinate` during `month`.
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError`] if the request or decoding fails.
    async fn fetch_incidents(
        &self,
        month: YearMonth,
        coordinate: Coordinate,
    ) -> Result<MonthlyIncidentBatch, PoliceApiError>;
}

/// data.police.uk client implementing both transports.
#[derive(Debug, Clone)]
pub struct PoliceClient {
    client: reqwest::Client,
    base_url: String,
}

impl PoliceClient {
    /// Creates a client against `base_url` (no trailing slash).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates a client configured from the environment.
    ///
    /// `POLICE_API_URL` overrides [`DEFAULT_BASE_URL`]; requests time out
    /// after [`DEFAULT_REQUEST_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`PoliceApiError::Http`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, PoliceApiError> {
        let base_url =
            std::env::var("POLICE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        log::debug!("Police API client using {base_url}");
        Ok(Self::new(client, base_url))
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn categories_url(&self) -> String {
        format!("{}/crime-categories", self.base_url)
    }

    fn incidents_url(&self) -> String {
        format!("{}/crimes-at-location", self.base_url)
    }
}

#[async_trait]
impl CategoryTransport for PoliceClient {
    async fn fetch_categories(
        &self,
        month: YearMonth,
    ) -> Result<Vec<CategoryListEntry>, PoliceApiError> {
        let request = self
            .client
            .get(self.categories_url())
            .query(&[("date", month.to_string())]);
        http::send_json(request).await
    }
}

#[async_trait]
impl IncidentTransport for PoliceClient {
    async fn fetch_incidents(
        &self,
        month: YearMonth,
        coordinate: Coordinate,
    ) -> Result<MonthlyIncidentBatch, PoliceApiError> {
        let request = self.client.get(self.incidents_url()).query(&[
            ("date", month.to_string()),
            ("lat", coordinate.latitude.to_string()),
            ("lng", coordinate.longitude.to_string()),
        ]);
        http::send_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crime_lookup_police_models::{CategoryId, IncidentRecord};

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let client = PoliceClient::new(reqwest::Client::new(), "http://localhost:9000/api/");
        assert_eq!(client.base_url(), "http://localhost:9000/api");
        assert_eq!(
            client.categories_url(),
            "http://localhost:9000/api/crime-categories"
        );
        assert_eq!(
            client.incidents_url(),
            "http://localhost:9000/api/crimes-at-location"
        );
    }

    #[test]
    fn decodes_category_list() {
        let body = serde_json::json!([
            { "url": "all-crime", "name": "All crime" },
            { "url": "anti-social-behaviour", "name": "Anti-social behaviour" }
        ]);
        let entries: Vec<CategoryListEntry> = serde_json::from_value(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].url, CategoryId::from("anti-social-behaviour"));
        assert_eq!(entries[1].name, "Anti-social behaviour");
    }

    #[test]
    fn decodes_incident_batch() {
        let body = serde_json::json!([
            {
                "category": "burglary",
                "location_type": "Force",
                "location": {
                    "latitude": "51.501009",
                    "street": { "id": 1_738_842, "name": "On or near Birdcage Walk" },
                    "longitude": "-0.141588"
                },
                "context": "",
                "outcome_status": null,
                "persistent_id": "",
                "id": 20_599_642,
                "location_subtype": "",
                "month": "2023-01"
            },
            { "category": "drugs", "month": "2023-01" }
        ]);
        let batch: MonthlyIncidentBatch = serde_json::from_value(body).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].category, CategoryId::from("burglary"));
        assert_eq!(batch[1], IncidentRecord {
            category: "drugs".into(),
            id: None,
            month: Some("2023-01".to_string()),
        });
    }

    #[test]
    fn status_error_mentions_url() {
        let err = PoliceApiError::Status {
            status: 404,
            url: "https://data.police.uk/api/crimes-at-location".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 404 from https://data.police.uk/api/crimes-at-location"
        );
    }
}
