//! Category catalog loading.
//!
//! The police API publishes the category list per month, so a period's
//! catalog is the union of twelve monthly lists.

use crime_lookup_police::CategoryTransport;
use crime_lookup_police_models::{CategoryCatalog, Period};

use crate::config::FanOutConfig;
use crate::scatter::gather_months;

/// Loads the category catalog for `period`.
///
/// All twelve monthly category lists are requested concurrently and
/// merged in calendar order, so when two months disagree on a name the
/// later month wins. Months that fail contribute nothing; this never
/// fails, a period with unreachable months just yields a partial catalog.
pub async fn load_catalog(
    transport: &dyn CategoryTransport,
    period: Period,
    config: &FanOutConfig,
) -> CategoryCatalog {
    let outcomes = gather_months(period, config, "categories", |month| {
        transport.fetch_categories(month)
    })
    .await;

    let mut catalog = CategoryCatalog::new();
    let mut failed = 0_usize;

    for (_, outcome) in outcomes {
        match outcome {
            Ok(entries) => catalog.merge(entries),
            Err(_) => failed += 1,
        }
    }

    if failed > 0 {
        log::warn!(
            "Category catalog for {period} is partial: {failed} month(s) unavailable, {} categories loaded",
            catalog.len()
        );
    } else {
        log::info!(
            "Loaded {} categories for {period}",
            catalog.len()
        );
    }

    catalog
}
