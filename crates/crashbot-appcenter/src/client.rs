use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use crashbot_core::config::AppCenterSettings;
use crashbot_core::error::{BotError, Result};
use crashbot_core::types::{day_window_start, launch_window_start};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::versions::compare_builds;
use crate::{CrashCounts, CrashSource};

/// HTTP client for the AppCenter error-reporting and analytics API.
///
/// Every operation is an authenticated GET returning JSON; the client does
/// no retries. Both base URLs are injectable so tests can point the client
/// at a mock server.
pub struct AppCenterClient {
    http: reqwest::Client,
    api_base: Url,
    portal_base: Url,
    owner: String,
    token: String,
}

impl AppCenterClient {
    pub fn new(settings: &AppCenterSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("crashbot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_base: Url::parse(&settings.api_base)?,
            portal_base: Url::parse(&settings.portal_base)?,
            owner: settings.owner.clone(),
            token: settings.api_token.clone(),
        })
    }

    /// URL for an app-scoped API path like `errors/errorGroups`.
    fn app_url(&self, app: &str, path: &str) -> Result<Url> {
        let url = format!(
            "{}/apps/{}/{}/{}",
            self.api_base.as_str().trim_end_matches('/'),
            self.owner,
            app,
            path
        );
        Ok(Url::parse(&url)?)
    }

    /// Complete a pagination link, which may be relative to the portal origin.
    fn complete_link(&self, link: &str) -> Result<Url> {
        if link.starts_with("http") {
            Ok(Url::parse(link)?)
        } else {
            Ok(self.portal_base.join(link)?)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .header("x-api-token", &self.token)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BotError::Api {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.json::<T>().await?)
    }
}

fn timestamp(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Deserialize)]
struct AvailableBuilds {
    #[serde(default)]
    app_builds: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorCounts {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorGroupsPage {
    #[serde(rename = "errorGroups", default)]
    error_groups: Vec<ErrorGroup>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorGroup {
    #[serde(rename = "deviceCount", default)]
    device_count: u64,
}

#[derive(Debug, Deserialize)]
struct VersionTotals {
    total: u64,
}

#[async_trait]
impl CrashSource for AppCenterClient {
    async fn latest_build(&self, app: &str, version: &str) -> Result<Option<String>> {
        let mut url = self.app_url(app, "errors/availableAppBuilds")?;
        url.query_pairs_mut().append_pair("version", version);

        let builds: AvailableBuilds = self.get_json(url).await?;
        Ok(builds
            .app_builds
            .into_iter()
            .max_by(|a, b| compare_builds(a, b)))
    }

    async fn crash_counts(
        &self,
        since: DateTime<Utc>,
        app: &str,
        version: &str,
        build: &str,
    ) -> Result<CrashCounts> {
        let mut base = self.app_url(app, "errors/errorCountsPerDay")?;
        base.query_pairs_mut()
            .append_pair("version", version)
            .append_pair("app_build", build)
            .append_pair("start", &timestamp(since));

        let mut unhandled_url = base.clone();
        unhandled_url
            .query_pairs_mut()
            .append_pair("errorType", "unhandlederror");
        let mut handled_url = base;
        handled_url
            .query_pairs_mut()
            .append_pair("errorType", "handlederror");

        let unhandled: ErrorCounts = self.get_json(unhandled_url).await?;
        let handled: ErrorCounts = self.get_json(handled_url).await?;
        Ok(CrashCounts {
            unhandled: unhandled.count,
            handled: handled.count,
        })
    }

    async fn error_group_count(&self, app: &str, version: &str, build: &str) -> Result<u64> {
        let mut url = self.app_url(app, "errors/errorGroups")?;
        url.query_pairs_mut()
            .append_pair("version", version)
            .append_pair("app_build", build)
            .append_pair("start", &timestamp(launch_window_start()));

        let mut groups = 0u64;
        let mut next = Some(url);
        while let Some(page_url) = next {
            let page: ErrorGroupsPage = self.get_json(page_url).await?;
            groups += page.error_groups.len() as u64;
            next = match page.next_link {
                Some(link) => Some(self.complete_link(&link)?),
                None => None,
            };
        }
        Ok(groups)
    }

    async fn affected_users(
        &self,
        since: DateTime<Utc>,
        app: &str,
        version: &str,
        build: &str,
    ) -> Result<u64> {
        let mut url = self.app_url(app, "errors/errorGroups")?;
        url.query_pairs_mut()
            .append_pair("version", version)
            .append_pair("app_build", build)
            .append_pair("start", &timestamp(since))
            .append_pair("errorType", "all")
            .append_pair("$orderby", "devices desc")
            .append_pair("$top", "30");

        // Top-30 cutoff: the sum is an approximation, not a true total.
        let page: ErrorGroupsPage = self.get_json(url).await?;
        Ok(page.error_groups.iter().map(|g| g.device_count).sum())
    }

    async fn total_users(&self, app: &str, version: &str) -> Result<u64> {
        let mut url = self.app_url(app, "analytics/versions")?;
        url.query_pairs_mut()
            .append_pair("start", &timestamp(day_window_start()))
            .append_pair("versions", version);

        let totals: VersionTotals = self.get_json(url).await?;
        Ok(totals.total)
    }

    fn dashboard_url(&self, app: &str, version: &str, build: &str) -> String {
        format!(
            "{}/users/{}/apps/{}/crashes/errors?appBuild={}&period=last30Days&status=&version={}",
            self.portal_base.as_str().trim_end_matches('/'),
            self.owner,
            app,
            build,
            version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> AppCenterClient {
        AppCenterClient::new(&AppCenterSettings {
            api_base: server.uri(),
            portal_base: server.uri(),
            owner: "acme".into(),
            api_token: "token".into(),
            android_app: "shop-droid".into(),
            ios_app: "shop-ios".into(),
        })
        .unwrap()
    }

    fn groups(count: usize, next_link: Option<&str>) -> serde_json::Value {
        json!({
            "errorGroups": vec![json!({"deviceCount": 1}); count],
            "nextLink": next_link,
        })
    }

    #[tokio::test]
    async fn test_latest_build_orders_numerically() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/acme/shop-droid/errors/availableAppBuilds"))
            .and(query_param("version", "1.2.3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "app_builds": ["1.0.0", "1.10.0", "1.2.0"]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let build = client.latest_build("shop-droid", "1.2.3").await.unwrap();
        assert_eq!(build.as_deref(), Some("1.10.0"));
    }

    #[tokio::test]
    async fn test_latest_build_empty_list_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/acme/shop-droid/errors/availableAppBuilds"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "app_builds": [] })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let build = client.latest_build("shop-droid", "1.2.3").await.unwrap();
        assert_eq!(build, None);
    }

    #[tokio::test]
    async fn test_crash_counts_queries_both_error_types() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/acme/shop-droid/errors/errorCountsPerDay"))
            .and(query_param("errorType", "unhandlederror"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 3 })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/apps/acme/shop-droid/errors/errorCountsPerDay"))
            .and(query_param("errorType", "handlederror"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 2 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let counts = client
            .crash_counts(Utc::now(), "shop-droid", "1.2.3", "42")
            .await
            .unwrap();
        assert_eq!(counts.unhandled, 3);
        assert_eq!(counts.handled, 2);
        assert_eq!(counts.total(), 5);
    }

    #[tokio::test]
    async fn test_error_group_count_follows_pagination() {
        let server = MockServer::start().await;
        // First page links relatively, second absolutely, third ends the chain.
        Mock::given(method("GET"))
            .and(path("/apps/acme/shop-droid/errors/errorGroups"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(groups(10, Some("/api/page2"))),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(groups(
                10,
                Some(&format!("{}/api/page3", server.uri())),
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/page3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(groups(5, None)))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let count = client
            .error_group_count("shop-droid", "1.2.3", "42")
            .await
            .unwrap();
        assert_eq!(count, 25);
    }

    #[tokio::test]
    async fn test_affected_users_sums_device_counts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/acme/shop-ios/errors/errorGroups"))
            .and(query_param("$top", "30"))
            .and(query_param("$orderby", "devices desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errorGroups": [
                    {"deviceCount": 5},
                    {"deviceCount": 3},
                    {"deviceCount": 2},
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let affected = client
            .affected_users(Utc::now(), "shop-ios", "1.2.3", "42")
            .await
            .unwrap();
        assert_eq!(affected, 10);
    }

    #[tokio::test]
    async fn test_total_users() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/acme/shop-ios/analytics/versions"))
            .and(query_param("versions", "1.2.3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 1234 })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let total = client.total_users("shop-ios", "1.2.3").await.unwrap();
        assert_eq!(total, 1234);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.total_users("shop-ios", "1.2.3").await.unwrap_err();
        assert!(matches!(err, BotError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(client.total_users("shop-ios", "1.2.3").await.is_err());
    }

    #[test]
    fn test_dashboard_url() {
        let settings = AppCenterSettings {
            api_base: "https://appcenter.ms/api/v0.1".into(),
            portal_base: "https://appcenter.ms".into(),
            owner: "acme".into(),
            api_token: "token".into(),
            android_app: "shop-droid".into(),
            ios_app: "shop-ios".into(),
        };
        let client = AppCenterClient::new(&settings).unwrap();
        assert_eq!(
            client.dashboard_url("shop-droid", "1.2.3", "42"),
            "https://appcenter.ms/users/acme/apps/shop-droid/crashes/errors\
             ?appBuild=42&period=last30Days&status=&version=1.2.3"
        );
    }
}
