#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime category, incident, period and aggregate result types.
//!
//! The police API only exposes incidents per month and per location, so
//! everything here is shaped around a [`Period`] (one calendar year) split
//! into twelve [`YearMonth`]s. Categories are identified by an opaque
//! [`CategoryId`] slug that is stable across months and years; display
//! names live in a per-period [`CategoryCatalog`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of monthly sub-queries scattered for a single period.
pub const MONTHS_PER_PERIOD: u32 = 12;

/// Opaque identifier of an incident category (e.g. `"burglary"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    /// Creates a category identifier from its slug.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// Returns the slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier names an actual category.
    ///
    /// Records with a blank category are skipped when counting.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CategoryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One entry of the monthly category list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryListEntry {
    /// Category slug (the API calls it `url`).
    pub url: CategoryId,
    /// Human-readable category name.
    pub name: String,
}

/// Mapping from [`CategoryId`] to display name for a single period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCatalog {
    names: BTreeMap<CategoryId, String>,
}

impl CategoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            names: BTreeMap::new(),
        }
    }

    /// Inserts a single name, overwriting any previous name for `id`.
    pub fn insert(&mut self, id: CategoryId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    /// Merges a monthly partial catalog into this one.
    ///
    /// Later merges win on key collision.
    pub fn merge<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = CategoryListEntry>,
    {
        for entry in entries {
            self.names.insert(entry.url, entry.name);
        }
    }

    /// Returns the display name for `id`, if the catalog knows it.
    #[must_use]
    pub fn name(&self, id: &CategoryId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Number of categories in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates categories in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&CategoryId, &str)> {
        self.names.iter().map(|(id, name)| (id, name.as_str()))
    }
}

/// A single incident returned by the location endpoint.
///
/// Only the category is used for aggregation; everything else the API
/// returns is ignored except a couple of fields kept for log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Category of the incident.
    pub category: CategoryId,
    /// API-assigned incident identifier.
    #[serde(default)]
    pub id: Option<i64>,
    /// Month the incident was recorded in (`YYYY-MM`).
    #[serde(default)]
    pub month: Option<String>,
}

impl IncidentRecord {
    /// Creates a record carrying only a category.
    #[must_use]
    pub fn new(category: impl Into<CategoryId>) -> Self {
        Self {
            category: category.into(),
            id: None,
            month: None,
        }
    }
}

/// Incidents for one (year, month, coordinate) triple, in API order.
pub type MonthlyIncidentBatch = Vec<IncidentRecord>;

/// WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A calendar year under analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(i32);

impl Period {
    /// Creates a period for the given calendar year.
    #[must_use]
    pub const fn new(year: i32) -> Self {
        Self(year)
    }

    /// Returns the calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.0
    }

    /// Yields the twelve months of this period in calendar order.
    pub fn months(self) -> impl Iterator<Item = YearMonth> {
        (1..=MONTHS_PER_PERIOD).map(move |month| YearMonth {
            year: self.0,
            month,
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single month of a [`Period`].
///
/// Displays as `YYYY-MM`, which is the format the police API expects in
/// its `date` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawYearMonth")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawYearMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawYearMonth> for YearMonth {
    type Error = String;

    fn try_from(raw: RawYearMonth) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
            .ok_or_else(|| format!("month {} is outside 1..=12", raw.month))
    }
}

impl YearMonth {
    /// Creates a year/month pair, or `None` if `month` is outside `1..=12`.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= MONTHS_PER_PERIOD {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, 1 through 12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The period this month belongs to.
    #[must_use]
    pub const fn period(self) -> Period {
        Period(self.year)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Canonical location identifier returned by the resolver (e.g. a
/// normalized postcode such as `"SW1A 1AA"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Creates a location identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The dominant incident category for a location over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Canonical location identifier.
    pub location_id: LocationId,
    /// Coordinate the incidents were queried at.
    pub coordinate: Coordinate,
    /// Period the incidents were aggregated over.
    pub period: Period,
    /// Winning category, `None` when no incidents were recorded.
    pub dominant_category_id: Option<CategoryId>,
    /// Display name of the winning category. Empty when there were no
    /// incidents or the catalog does not know the category.
    pub dominant_category: String,
    /// Average occurrences per month of the winning category (0 if none).
    pub monthly_rate: f64,
}

impl AggregateResult {
    /// Whether any incidents were recorded for the period.
    #[must_use]
    pub const fn has_incidents(&self) -> bool {
        self.dominant_category_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_pads_month() {
        let ym = YearMonth::new(2023, 8).unwrap();
        assert_eq!(ym.to_string(), "2023-08");
        assert_eq!(YearMonth::new(2023, 12).unwrap().to_string(), "2023-12");
    }

    #[test]
    fn year_month_rejects_out_of_range() {
        assert!(YearMonth::new(2023, 0).is_none());
        assert!(YearMonth::new(2023, 13).is_none());
    }

    #[test]
    fn period_yields_twelve_months_in_order() {
        let months: Vec<YearMonth> = Period::new(2022).months().collect();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].to_string(), "2022-01");
        assert_eq!(months[11].to_string(), "2022-12");
        assert!(months.windows(2).all(|w| w[0] < w[1]));
        assert!(months.iter().all(|m| m.period() == Period::new(2022)));
    }

    #[test]
    fn catalog_merge_is_last_write_wins() {
        let mut catalog = CategoryCatalog::new();
        catalog.merge(vec![CategoryListEntry {
            url: "anti-social-behaviour".into(),
            name: "ASB".to_string(),
        }]);
        catalog.merge(vec![
            CategoryListEntry {
                url: "anti-social-behaviour".into(),
                name: "Anti-Social Behaviour".to_string(),
            },
            CategoryListEntry {
                url: "burglary".into(),
                name: "Burglary".to_string(),
            },
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.name(&"anti-social-behaviour".into()),
            Some("Anti-Social Behaviour")
        );
        assert_eq!(catalog.name(&"drugs".into()), None);
    }

    #[test]
    fn blank_category_is_not_recognized() {
        assert!(CategoryId::from("burglary").is_recognized());
        assert!(!CategoryId::from("").is_recognized());
        assert!(!CategoryId::from("  ").is_recognized());
    }

    #[test]
    fn year_month_deserialization_checks_month_range() {
        let ym: YearMonth =
            serde_json::from_value(serde_json::json!({ "year": 2023, "month": 12 })).unwrap();
        assert_eq!(ym, YearMonth::new(2023, 12).unwrap());

        for month in [0, 13] {
            let err = serde_json::from_value::<YearMonth>(
                serde_json::json!({ "year": 2023, "month": month }),
            )
            .unwrap_err();
            assert!(err.to_string().contains("outside 1..=12"));
        }
    }

    #[test]
    fn incident_record_ignores_unknown_fields() {
        let record: IncidentRecord = serde_json::from_value(serde_json::json!({
            "category": "burglary",
            "id": 116_208_998,
            "month": "2023-01",
            "location_type": "Force",
            "outcome_status": null
        }))
        .unwrap();
        assert_eq!(record.category, CategoryId::from("burglary"));
        assert_eq!(record.id, Some(116_208_998));
    }
}
