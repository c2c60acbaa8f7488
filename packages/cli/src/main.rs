#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Looks up the most common crime at one or more UK postcodes.
//!
//! ```text
//! crime_lookup "SW1A 1AA" [--year 2023] [--json]
//! ```
//!
//! The year defaults to the previous calendar year. Every postcode is
//! answered from the same session, so repeated postcodes and the
//! category catalog are only fetched once.
//!
//! Environment:
//! - `RUST_LOG`: log filter (e.g. `crime_lookup_aggregate=debug`)
//! - `POLICE_API_URL`: police API base URL
//! - `POSTCODES_API_URL`: postcode resolver base URL
//! - `CRIME_LOOKUP_SUBFETCH_TIMEOUT_SECS`: per-month request limit, `0` to disable

use chrono::Datelike;
use clap::Parser;
use crime_lookup_police_models::{AggregateResult, CategoryId, Period};
use crime_lookup_query::Session;

#[derive(Parser)]
#[command(
    name = "crime_lookup",
    about = "Find the most common crime at a postcode over a year"
)]
struct Cli {
    /// Postcodes to look up
    #[arg(required = true)]
    postcodes: Vec<String>,

    /// Calendar year to analyze (defaults to last year)
    #[arg(long)]
    year: Option<i32>,

    /// Print results as JSON instead of sentences
    #[arg(long)]
    json: bool,
}

fn default_period() -> Period {
    Period::new(chrono::Local::now().year() - 1)
}

fn describe(result: &AggregateResult) -> String {
    if result.has_incidents() {
        let name = if result.dominant_category.is_empty() {
            result
                .dominant_category_id
                .as_ref()
                .map_or("", CategoryId::as_str)
        } else {
            &result.dominant_category
        };
        format!(
            "The most common crime at postcode {} in {} was {name}, averaging {:.2} occurrences per month.",
            result.location_id, result.period, result.monthly_rate
        )
    } else {
        format!(
            "There were no recorded criminal instances at postcode {} in {}.",
            result.location_id, result.period
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let period = cli.year.map_or_else(default_period, Period::new);
    let session = Session::from_env()?;

    let mut failures = 0_usize;
    let mut results = Vec::new();

    for postcode in &cli.postcodes {
        match session.query(postcode, period).await {
            Ok(result) => {
                if cli.json {
                    results.push(result);
                } else {
                    println!("{}", describe(&result));
                }
            }
            Err(e) => {
                log::debug!("Query for '{postcode}' failed: {e:?}");
                eprintln!("{e}");
                failures += 1;
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    if failures > 0 {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crime_lookup_police_models::{Coordinate, LocationId};

    use super::*;

    fn result(id: Option<&str>, name: &str, rate: f64) -> AggregateResult {
        AggregateResult {
            location_id: LocationId::new("SW1A 1AA"),
            coordinate: Coordinate::new(51.501_009, -0.141_588),
            period: Period::new(2023),
            dominant_category_id: id.map(CategoryId::new),
            dominant_category: name.to_string(),
            monthly_rate: rate,
        }
    }

    #[test]
    fn describes_dominant_category_with_two_decimals() {
        let text = describe(&result(Some("anti-social-behaviour"), "Anti-social behaviour", 7.0 / 3.0));
        assert_eq!(
            text,
            "The most common crime at postcode SW1A 1AA in 2023 was Anti-social behaviour, averaging 2.33 occurrences per month."
        );
    }

    #[test]
    fn describes_empty_period() {
        assert_eq!(
            describe(&result(None, "", 0.0)),
            "There were no recorded criminal instances at postcode SW1A 1AA in 2023."
        );
    }

    #[test]
    fn falls_back_to_category_id_when_name_is_unknown() {
        let text = describe(&result(Some("new-category"), "", 0.5));
        assert!(text.contains("was new-category, averaging 0.50"));
    }

    #[test]
    fn parses_postcodes_and_year() {
        let cli = Cli::try_parse_from(["crime_lookup", "SW1A 1AA", "LS1 4AP", "--year", "2021"])
            .unwrap();
        assert_eq!(cli.postcodes, vec!["SW1A 1AA", "LS1 4AP"]);
        assert_eq!(cli.year, Some(2021));
        assert!(!cli.json);
    }

    #[test]
    fn requires_a_postcode() {
        assert!(Cli::try_parse_from(["crime_lookup"]).is_err());
    }
}
