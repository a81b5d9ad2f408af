//! Port for shipping contained feature failures to the platform's error log.

use async_trait::async_trait;
use serde::Serialize;

use super::RemoteError;

/// One contained failure, as logged remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureErrorReport {
    /// Feature whose boundary tripped.
    pub feature: String,
    /// Human-readable failure message.
    pub message: String,
    /// Debug rendering of the failure, when it adds anything to `message`.
    pub stack: Option<String>,
    /// Surface the feature was mounted on.
    pub location: String,
}

/// Remote error log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    /// Record `report`. Callers treat failures as non-fatal.
    async fn report(&self, report: &FeatureErrorReport) -> Result<(), RemoteError>;
}

/// Reporter that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpErrorReporter;

#[async_trait]
impl ErrorReporter for NoOpErrorReporter {
    async fn report(&self, _report: &FeatureErrorReport) -> Result<(), RemoteError> {
        Ok(())
    }
}
