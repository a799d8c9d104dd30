//! Aggregation of AppCenter metrics into per-platform crash summaries and
//! the rendered Slack report.

pub mod summary;

pub use summary::{crash_report, summarize, PlatformSummary};
