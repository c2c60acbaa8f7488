//! Scripted in-memory police transport for tests.
//!
//! Each month can be scripted to respond, fail, panic or hang; months that
//! are not scripted respond with an empty list. Calls are counted so tests
//! can assert how much network work a code path issued.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use crime_lookup_police::{CategoryTransport, IncidentTransport, PoliceApiError};
use crime_lookup_police_models::{
    CategoryListEntry, Coordinate, MonthlyIncidentBatch, YearMonth,
};

/// How a scripted month behaves.
#[derive(Debug, Clone)]
pub enum MonthScript<T> {
    /// Respond with the value.
    Respond(T),
    /// Respond with an HTTP 503 error.
    Fail,
    /// Panic while handling the request.
    Panic,
    /// Never respond.
    Hang,
}

/// Scripted implementation of both police transports.
#[derive(Debug, Default)]
pub struct FakePolice {
    categories: BTreeMap<u32, MonthScript<Vec<CategoryListEntry>>>,
    incidents: BTreeMap<u32, MonthScript<MonthlyIncidentBatch>>,
    category_delays: BTreeMap<u32, Duration>,
    incident_delay: Option<Duration>,
    category_calls: AtomicUsize,
    incident_calls: AtomicUsize,
}

impl FakePolice {
    /// Creates a transport where every month responds with an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the category list for `month`.
    #[must_use]
    pub fn with_categories(mut self, month: u32, entries: Vec<CategoryListEntry>) -> Self {
        self.categories.insert(month, MonthScript::Respond(entries));
        self
    }

    /// Makes the category request for `month` fail.
    #[must_use]
    pub fn failing_categories(mut self, month: u32) -> Self {
        self.categories.insert(month, MonthScript::Fail);
        self
    }

    /// Makes the category request for `month` panic.
    #[must_use]
    pub fn panicking_categories(mut self, month: u32) -> Self {
        self.categories.insert(month, MonthScript::Panic);
        self
    }

    /// Delays the category response for `month` by `delay`.
    #[must_use]
    pub fn delaying_categories(mut self, month: u32, delay: Duration) -> Self {
        self.category_delays.insert(month, delay);
        self
    }

    /// Scripts the incident batch for `month`.
    #[must_use]
    pub fn with_incidents(mut self, month: u32, batch: MonthlyIncidentBatch) -> Self {
        self.incidents.insert(month, MonthScript::Respond(batch));
        self
    }

    /// Makes the incident request for `month` fail.
    #[must_use]
    pub fn failing_incidents(mut self, month: u32) -> Self {
        self.incidents.insert(month, MonthScript::Fail);
        self
    }

    /// Makes the incident request for `month` panic.
    #[must_use]
    pub fn panicking_incidents(mut self, month: u32) -> Self {
        self.incidents.insert(month, MonthScript::Panic);
        self
    }

    /// Makes the incident request for `month` never settle.
    #[must_use]
    pub fn hanging_incidents(mut self, month: u32) -> Self {
        self.incidents.insert(month, MonthScript::Hang);
        self
    }

    /// Delays every incident response by `delay`.
    #[must_use]
    pub const fn with_incident_delay(mut self, delay: Duration) -> Self {
        self.incident_delay = Some(delay);
        self
    }

    /// Number of category requests issued so far.
    #[must_use]
    pub fn category_calls(&self) -> usize {
        self.category_calls.load(Ordering::SeqCst)
    }

    /// Number of incident requests issued so far.
    #[must_use]
    pub fn incident_calls(&self) -> usize {
        self.incident_calls.load(Ordering::SeqCst)
    }
}

async fn play<T: Clone + Default>(
    script: Option<&MonthScript<T>>,
    month: YearMonth,
) -> Result<T, PoliceApiError> {
    match script {
        None => Ok(T::default()),
        Some(MonthScript::Respond(value)) => Ok(value.clone()),
        Some(MonthScript::Fail) => Err(PoliceApiError::Status {
            status: 503,
            url: format!("fake://police/{month}"),
        }),
        Some(MonthScript::Panic) => panic!("scripted panic for {month}"),
        Some(MonthScript::Hang) => std::future::pending().await,
    }
}

#[async_trait]
impl CategoryTransport for FakePolice {
    async fn fetch_categories(
        &self,
        month: YearMonth,
    ) -> Result<Vec<CategoryListEntry>, PoliceApiError> {
        self.category_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.category_delays.get(&month.month()) {
            tokio::time::sleep(*delay).await;
        }
        play(self.categories.get(&month.month()), month).await
    }
}

#[async_trait]
impl IncidentTransport for FakePolice {
    async fn fetch_incidents(
        &self,
        month: YearMonth,
        _coordinate: Coordinate,
    ) -> Result<MonthlyIncidentBatch, PoliceApiError> {
        self.incident_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.incident_delay {
            tokio::time::sleep(delay).await;
        }
        play(self.incidents.get(&month.month()), month).await
    }
}
