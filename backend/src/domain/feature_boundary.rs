//! Error isolation for optional features.
//!
//! A [`FeatureBoundary`] wraps one mounted feature. The first error or panic
//! raised by the wrapped child flips the boundary to
//! [`BoundaryState::Errored`] for the rest of its life: the failure is
//! reported once, the caller's fallback is returned, and the child is never
//! run again. Nothing escapes the boundary, so one broken feature cannot take
//! down the surface hosting it.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use futures_util::future::join_all;
use tracing::{error, warn};

use crate::domain::ports::{ErrorReporter, FeatureErrorReport};

/// Lifecycle of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryState {
    /// The child renders normally.
    Ok,
    /// The child failed; only the fallback is rendered from now on.
    Errored,
}

/// What went wrong inside a child.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChildFailure {
    Error {
        message: String,
        stack: Option<String>,
    },
    Panic {
        message: String,
    },
}

impl ChildFailure {
    fn from_error<E>(error: &E) -> Self
    where
        E: fmt::Display + fmt::Debug,
    {
        let message = error.to_string();
        let debug = format!("{error:?}");
        let stack = (debug != message).then_some(debug);
        Self::Error { message, stack }
    }

    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|text| (*text).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "feature panicked".to_owned());
        Self::Panic { message }
    }

    fn into_report(self, feature: &str, location: &str) -> FeatureErrorReport {
        let (message, stack) = match self {
            Self::Error { message, stack } => (message, stack),
            Self::Panic { message } => (message, None),
        };
        FeatureErrorReport {
            feature: feature.to_owned(),
            message,
            stack,
            location: location.to_owned(),
        }
    }
}

/// Isolation boundary around one optional feature.
pub struct FeatureBoundary {
    feature: String,
    location: String,
    reporter: Arc<dyn ErrorReporter>,
    errored: AtomicBool,
}

impl FeatureBoundary {
    /// Wrap `feature`, mounted on `location`, reporting through `reporter`.
    pub fn new(
        feature: impl Into<String>,
        location: impl Into<String>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            feature: feature.into(),
            location: location.into(),
            reporter,
            errored: AtomicBool::new(false),
        }
    }

    /// Name of the wrapped feature.
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BoundaryState {
        if self.errored.load(Ordering::Acquire) {
            BoundaryState::Errored
        } else {
            BoundaryState::Ok
        }
    }

    /// Run a synchronous child. Returns `None` once the boundary has errored.
    pub async fn render<T, E, F>(&self, child: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display + fmt::Debug,
    {
        if self.state() == BoundaryState::Errored {
            return None;
        }
        let failure = match catch_unwind(AssertUnwindSafe(child)) {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(err)) => ChildFailure::from_error(&err),
            Err(payload) => ChildFailure::from_panic(payload.as_ref()),
        };
        self.trip(failure).await;
        None
    }

    /// Run a synchronous child, substituting `fallback` on failure.
    pub async fn render_or<T, E, F>(&self, child: F, fallback: T) -> T
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display + fmt::Debug,
    {
        self.render(child).await.unwrap_or(fallback)
    }

    /// Run an asynchronous child. Returns `None` once the boundary has
    /// errored.
    pub async fn render_async<T, E, Fut>(&self, child: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display + fmt::Debug,
    {
        if self.state() == BoundaryState::Errored {
            return None;
        }
        let failure = match AssertUnwindSafe(child).catch_unwind().await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(err)) => ChildFailure::from_error(&err),
            Err(payload) => ChildFailure::from_panic(payload.as_ref()),
        };
        self.trip(failure).await;
        None
    }

    async fn trip(&self, failure: ChildFailure) {
        if self.errored.swap(true, Ordering::AcqRel) {
            return;
        }
        let report = failure.into_report(&self.feature, &self.location);
        error!(
            feature = %report.feature,
            location = %report.location,
            message = %report.message,
            "feature failed; rendering fallback"
        );
        if let Err(err) = self.reporter.report(&report).await {
            warn!(feature = %report.feature, error = %err, "failed to report feature error");
        }
    }
}

/// Render sibling features concurrently, each behind its own boundary.
///
/// Results keep input order; a failed sibling yields `None` without
/// affecting the others.
pub async fn render_all<T, I, Fut>(renders: I) -> Vec<Option<T>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Option<T>>,
{
    join_all(renders).await
}
