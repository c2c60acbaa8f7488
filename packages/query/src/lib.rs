#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cached crime queries.
//!
//! A [`Session`] resolves location text, loads the period's category
//! catalog once, runs the twelve-month aggregation and remembers the
//! result for the rest of the session.

pub mod cache;
pub mod session;

pub use cache::{CacheKey, OnceMap, QueryCache};
pub use session::{QueryError, Session, SessionError};
