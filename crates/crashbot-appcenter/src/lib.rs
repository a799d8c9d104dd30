//! AppCenter data-source client for crashbot.
//!
//! Wraps the AppCenter error-reporting and analytics REST API behind the
//! [`CrashSource`] trait: build resolution, crash counts, paginated error
//! groups, affected users, and version user totals.

pub mod client;
pub mod versions;

pub use client::AppCenterClient;
pub use versions::compare_builds;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crashbot_core::error::Result;

/// Crash counts over one reporting window, split by error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrashCounts {
    pub unhandled: u64,
    pub handled: u64,
}

impl CrashCounts {
    /// Handled and unhandled errors combined.
    pub fn total(&self) -> u64 {
        self.unhandled + self.handled
    }
}

/// Capability interface over the crash-reporting service.
///
/// The aggregator and command handler depend on this trait rather than on
/// [`AppCenterClient`] directly, so tests can substitute a canned source.
#[async_trait]
pub trait CrashSource: Send + Sync {
    /// Newest known build id for a version, or `None` if the service knows
    /// no builds for it.
    async fn latest_build(&self, app: &str, version: &str) -> Result<Option<String>>;

    /// Unhandled and handled error counts since `since`.
    async fn crash_counts(
        &self,
        since: DateTime<Utc>,
        app: &str,
        version: &str,
        build: &str,
    ) -> Result<CrashCounts>;

    /// Number of error groups over the maximal lookback window, following
    /// pagination to the end.
    async fn error_group_count(&self, app: &str, version: &str, build: &str) -> Result<u64>;

    /// Devices hit by the top 30 error groups since `since` (a bounded
    /// approximation of the affected-user count).
    async fn affected_users(
        &self,
        since: DateTime<Utc>,
        app: &str,
        version: &str,
        build: &str,
    ) -> Result<u64>;

    /// Total users of a version over the last 24 hours.
    async fn total_users(&self, app: &str, version: &str) -> Result<u64>;

    /// Deep link into the service's crash dashboard for a build.
    fn dashboard_url(&self, app: &str, version: &str, build: &str) -> String;
}
