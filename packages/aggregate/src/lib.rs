#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Twelve-month scatter-gather engine.
//!
//! The police API only answers per-month questions, so answering anything
//! about a year means issuing twelve independent requests and folding
//! them together. Two folds are built on the shared [`scatter`] barrier:
//!
//! 1. [`catalog::load_catalog`]: unions the monthly category lists into a
//!    single [`CategoryCatalog`](crime_lookup_police_models::CategoryCatalog).
//! 2. [`incidents::aggregate`]: counts incidents per category across the
//!    twelve months and reduces them to the dominant category and its
//!    average monthly rate.
//!
//! Both degrade instead of failing: a month that errors, times out or
//! panics contributes nothing and the rest of the period is still used.

pub mod catalog;
pub mod config;
#[cfg(any(test, feature = "test-utils"))]
pub mod fakes;
pub mod incidents;
pub mod scatter;

pub use catalog::load_catalog;
pub use config::FanOutConfig;
pub use incidents::{AggregateRequest, OccurrenceCounts, aggregate};
pub use scatter::{MonthFailure, MonthOutcome, gather_months};
