//! Incident aggregation.
//!
//! Scatters twelve "incidents near coordinate" requests for a period,
//! counts occurrences per category across every month that answered, and
//! reduces the counts to the single dominant category and its average
//! monthly rate.

use std::collections::BTreeMap;

use crime_lookup_police::IncidentTransport;
use crime_lookup_police_models::{
    AggregateResult, CategoryCatalog, CategoryId, Coordinate, IncidentRecord, LocationId,
    MONTHS_PER_PERIOD, Period,
};

use crate::config::FanOutConfig;
use crate::scatter::gather_months;

/// Per-category occurrence counts accumulated over a period.
///
/// Every key present has a count of at least one, and the sum of all
/// counts equals the number of recorded incidents with a recognized
/// category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceCounts {
    counts: BTreeMap<CategoryId, u64>,
}

impl OccurrenceCounts {
    /// Creates empty counts.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Counts one occurrence of `category`.
    ///
    /// Returns `false` (and counts nothing) if the category is blank.
    pub fn record(&mut self, category: &CategoryId) -> bool {
        if !category.is_recognized() {
            return false;
        }
        *self.counts.entry(category.clone()).or_insert(0) += 1;
        true
    }

    /// Counts every record of a monthly batch.
    pub fn record_batch(&mut self, batch: &[IncidentRecord]) {
        for record in batch {
            if !self.record(&record.category) {
                log::trace!("Skipping incident {:?} with blank category", record.id);
            }
        }
    }

    /// Occurrences of `category` (0 if never seen).
    #[must_use]
    pub fn get(&self, category: &CategoryId) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Total occurrences across all categories.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct categories seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no incidents were counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates counts in category identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&CategoryId, u64)> {
        self.counts.iter().map(|(id, count)| (id, *count))
    }

    /// Returns the category with the strictly greatest monthly rate, and
    /// that rate.
    ///
    /// Ties go to the lexicographically lowest category identifier, so the
    /// answer does not depend on the order incidents were counted in.
    /// Returns `None` when nothing was counted.
    #[must_use]
    pub fn dominant(&self) -> Option<(&CategoryId, f64)> {
        let mut best: Option<(&CategoryId, u64)> = None;
        for (id, &count) in &self.counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((id, count));
            }
        }
        best.map(|(id, count)| (id, monthly_rate(count)))
    }
}

/// Average occurrences per month for `count` occurrences over a period.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn monthly_rate(count: u64) -> f64 {
    count as f64 / f64::from(MONTHS_PER_PERIOD)
}

/// Counts occurrences across a set of monthly batches.
pub fn count_occurrences<'a, I>(batches: I) -> OccurrenceCounts
where
    I: IntoIterator<Item = &'a [IncidentRecord]>,
{
    let mut counts = OccurrenceCounts::new();
    for batch in batches {
        counts.record_batch(batch);
    }
    counts
}

/// What to aggregate: a resolved location over one period.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    /// Canonical location identifier.
    pub location_id: LocationId,
    /// Coordinate to query incidents at.
    pub coordinate: Coordinate,
    /// Period to aggregate over.
    pub period: Period,
}

/// Reduces counts to the result for `request`.
///
/// The winning category's display name comes from `catalog`; an unknown
/// category yields an empty name.
#[must_use]
pub fn reduce(
    request: &AggregateRequest,
    counts: &OccurrenceCounts,
    catalog: &CategoryCatalog,
) -> AggregateResult {
    let (dominant_category_id, dominant_category, monthly_rate) = match counts.dominant() {
        Some((id, rate)) => {
            let name = catalog.name(id).unwrap_or_else(|| {
                log::debug!("Category '{id}' missing from the {} catalog", request.period);
                ""
            });
            (Some(id.clone()), name.to_string(), rate)
        }
        None => (None, String::new(), 0.0),
    };

    AggregateResult {
        location_id: request.location_id.clone(),
        coordinate: request.coordinate,
        period: request.period,
        dominant_category_id,
        dominant_category,
        monthly_rate,
    }
}

/// Aggregates the incidents recorded at the request's coordinate over its
/// period.
///
/// Issues twelve monthly requests concurrently and waits for all of them
/// to settle. Months that fail, time out or panic contribute no
/// incidents; this never fails. A period without any incidents yields an
/// empty category name and a zero rate.
pub async fn aggregate(
    transport: &dyn IncidentTransport,
    request: &AggregateRequest,
    catalog: &CategoryCatalog,
    config: &FanOutConfig,
) -> AggregateResult {
    let coordinate = request.coordinate;

    let outcomes = gather_months(request.period, config, "incidents", |month| {
        transport.fetch_incidents(month, coordinate)
    })
    .await;

    let counts = count_occurrences(
        outcomes
            .iter()
            .filter_map(|(_, outcome)| outcome.as_ref().ok())
            .map(Vec::as_slice),
    );

    log::debug!(
        "{} {}: {} incidents across {} categories",
        request.location_id,
        request.period,
        counts.total(),
        counts.len()
    );

    reduce(request, &counts, catalog)
}
