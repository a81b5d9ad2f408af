//! Fail-safe-to-inert wrapper for remote calls.
//!
//! Every rule that talks to the platform degrades the same way: log the
//! failure at warning level and continue with an inert value (flags off, no
//! rank, no reward). Callers name the operation so the log line is
//! searchable.

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Await `call` and return its value, or `default` after logging the error.
///
/// # Examples
/// ```
/// use questline::domain::safe_call;
///
/// # futures::executor::block_on(async {
/// let rank = safe_call("load_rank", async { Err::<Option<u32>, _>("offline") }, None).await;
/// assert_eq!(rank, None);
/// # });
/// ```
pub async fn safe_call<T, E, F>(operation: &'static str, call: F, default: T) -> T
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match call.await {
        Ok(value) => value,
        Err(error) => {
            warn!(operation, error = %error, "remote call failed; continuing with inert value");
            default
        }
    }
}
