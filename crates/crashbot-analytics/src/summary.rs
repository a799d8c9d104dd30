use crashbot_appcenter::CrashSource;
use crashbot_core::config::AppCenterSettings;
use crashbot_core::error::Result;
use crashbot_core::types::{day_window_start, launch_window_start, Platform, PLATFORMS};
use serde::{Deserialize, Serialize};

/// Crash and usage metrics for one (platform, version, build) target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSummary {
    pub platform: Platform,
    pub version: String,
    pub build: String,
    /// Handled + unhandled crashes since launch.
    pub crashes_since_launch: u64,
    /// Error groups since launch, across all pages.
    pub crash_groups: u64,
    /// Devices hit by the top error groups since launch.
    pub affected_users: u64,
    /// Total users of the version over the last 24 hours.
    pub total_users: u64,
    /// Handled + unhandled crashes in the last 24 hours.
    pub crashes_last_day: u64,
}

impl PlatformSummary {
    /// Share of users hit by the top error groups, as a percentage.
    /// `None` when the version has no recorded users.
    pub fn affected_percentage(&self) -> Option<f64> {
        if self.total_users == 0 {
            None
        } else {
            Some(self.affected_users as f64 / self.total_users as f64 * 100.0)
        }
    }

    fn percentage_label(&self) -> String {
        match self.affected_percentage() {
            Some(pct) => format!("{:.1}%", pct),
            None => "n/a".into(),
        }
    }

    /// The stats portion of a report line.
    pub fn stats_line(&self) -> String {
        format!(
            "{} crashes ({} groups) affecting {} of users ({} of {}). {} crashes in last 24h.",
            self.crashes_since_launch,
            self.crash_groups,
            self.percentage_label(),
            self.affected_users,
            self.total_users,
            self.crashes_last_day,
        )
    }
}

/// Fetch and combine the metrics for one platform build.
///
/// The five queries are issued strictly sequentially; the data source has
/// no batching endpoint.
pub async fn summarize(
    source: &dyn CrashSource,
    platform: Platform,
    app: &str,
    version: &str,
    build: &str,
) -> Result<PlatformSummary> {
    let total_users = source.total_users(app, version).await?;
    let since_launch = source
        .crash_counts(launch_window_start(), app, version, build)
        .await?;
    let last_day = source
        .crash_counts(day_window_start(), app, version, build)
        .await?;
    let crash_groups = source.error_group_count(app, version, build).await?;
    let affected_users = source
        .affected_users(launch_window_start(), app, version, build)
        .await?;

    tracing::debug!(
        %platform,
        version,
        build,
        crashes = since_launch.total(),
        "Summarized platform"
    );

    Ok(PlatformSummary {
        platform,
        version: version.to_string(),
        build: build.to_string(),
        crashes_since_launch: since_launch.total(),
        crash_groups,
        affected_users,
        total_users,
        crashes_last_day: last_day.total(),
    })
}

/// Render the full report: one line per platform, Android first, each
/// prefixed with a clickable dashboard link wrapping the build id.
pub async fn crash_report(
    source: &dyn CrashSource,
    settings: &AppCenterSettings,
    version: &str,
    android_build: &str,
    ios_build: &str,
) -> Result<String> {
    let mut lines = Vec::with_capacity(PLATFORMS.len());
    for platform in PLATFORMS {
        let app = settings.app(platform);
        let build = match platform {
            Platform::Android => android_build,
            Platform::Ios => ios_build,
        };
        let summary = summarize(source, platform, app, version, build).await?;
        let link = source.dashboard_url(app, version, build);
        lines.push(format!(
            "{} (<{}|{}>): {}",
            platform.label(),
            link,
            build,
            summary.stats_line(),
        ));
    }
    Ok(lines.join("\n"))
}
