//! Twelve-month scatter-gather barrier.
//!
//! [`gather_months`] starts one sub-fetch per month of a period, lets all
//! of them run concurrently, and returns once every one of them has
//! settled. A sub-fetch settles either with its value or with a
//! [`MonthFailure`]; transport errors, timeouts and panics all become
//! failures, so no month can keep the barrier open or take the whole
//! fan-out down with it.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use crime_lookup_police_models::{Period, YearMonth};
use futures::FutureExt as _;
use futures::future::join_all;

use crate::config::FanOutConfig;

/// Why a monthly sub-fetch contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonthFailure {
    /// The transport reported an error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The sub-fetch did not settle within the configured timeout.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// The sub-fetch panicked while being dispatched or polled.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Settled outcome of a single monthly sub-fetch.
pub type MonthOutcome<T> = Result<T, MonthFailure>;

/// Runs `fetch` once for every month of `period` and waits for all twelve
/// sub-fetches to settle.
///
/// Sub-fetches are started together and none waits on another. The
/// returned outcomes are in calendar order, whatever order they settled
/// in. `label` only appears in log output.
pub async fn gather_months<T, E, F, Fut>(
    period: Period,
    config: &FanOutConfig,
    label: &str,
    fetch: F,
) -> Vec<(YearMonth, MonthOutcome<T>)>
where
    F: Fn(YearMonth) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let fetch = &fetch;

    let units = period.months().map(move |month| async move {
        // The call itself happens inside the guarded future so a panic
        // while building the request settles this month instead of
        // unwinding through the fan-out.
        let guarded = AssertUnwindSafe(async move { fetch(month).await }).catch_unwind();

        let settled = match config.subfetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(settled) => settled,
                Err(_) => return (month, Err(MonthFailure::TimedOut(limit))),
            },
            None => guarded.await,
        };

        let outcome = match settled {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(MonthFailure::Transport(e.to_string())),
            Err(payload) => Err(MonthFailure::Panicked(panic_message(payload.as_ref()))),
        };

        (month, outcome)
    });

    let outcomes = join_all(units).await;

    let mut failed = 0_usize;
    for (month, outcome) in &outcomes {
        if let Err(failure) = outcome {
            failed += 1;
            log::warn!("{label} {month}: {failure}");
        }
    }
    log::debug!(
        "{label} {period}: {}/{} months settled successfully",
        outcomes.len() - failed,
        outcomes.len()
    );

    outcomes
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
