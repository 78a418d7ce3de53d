//! GitHub REST client backing the contributor and contents endpoints.

use chrono::{TimeZone, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use repopulse_core::{
    BoxFuture, ContributorBasic, ContributorSource, ContributorStats, Credential, RepoId,
    RepoPulseError, Result, StatsFetch, WeeklyStat,
};

use crate::config::GitHubConfig;

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.v3.raw";

/// GitHub API client implementation.
#[derive(Debug, Clone)]
pub struct GitHubApiClient {
    base_url: String,
    client: Client,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct StatsRow {
    author: Option<StatsAuthor>,
    #[serde(default)]
    weeks: Vec<WeekRow>,
}

#[derive(Debug, Deserialize)]
struct StatsAuthor {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct WeekRow {
    w: i64,
    #[serde(default)]
    a: u64,
    #[serde(default)]
    d: u64,
    #[serde(default)]
    c: u64,
}

impl GitHubApiClient {
    /// Build a client from GitHub settings.
    pub fn new(config: &GitHubConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn repo_url(&self, repo: &RepoId, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{suffix}",
            self.base_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        )
    }

    fn get(&self, url: String, credential: &Credential, accept: &str) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept);
        match credential.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        request
            .send()
            .await
            .map_err(|err| RepoPulseError::Provider(format!("github request failed: {err}")))
    }

    /// List a directory of the repository. The JSON payload is passed through.
    pub async fn list_contents(
        &self,
        repo: &RepoId,
        path: &str,
        credential: &Credential,
    ) -> Result<serde_json::Value> {
        let url = self.repo_url(repo, &contents_suffix(path));
        log::info!("fetching repository contents from {url}");
        let response = self.send(self.get(url, credential, JSON_MEDIA_TYPE)).await?;
        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|err| RepoPulseError::Provider(format!("github contents decode failed: {err}")))
    }

    /// Fetch the raw text of one file in the repository.
    pub async fn fetch_raw_file(
        &self,
        repo: &RepoId,
        path: &str,
        credential: &Credential,
    ) -> Result<String> {
        let url = self.repo_url(repo, &contents_suffix(path));
        log::info!("fetching file content from {url}");
        let response = self.send(self.get(url, credential, RAW_MEDIA_TYPE)).await?;
        let response = ensure_success(response).await?;
        response
            .text()
            .await
            .map_err(|err| RepoPulseError::Provider(format!("github file read failed: {err}")))
    }

    async fn fetch_contributors(
        &self,
        repo: &RepoId,
        credential: &Credential,
    ) -> Result<Vec<ContributorBasic>> {
        let url = self.repo_url(repo, "contributors");
        let response = self.send(self.get(url, credential, JSON_MEDIA_TYPE)).await?;
        log::info!("contributors response status: {}", response.status());
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let response = ensure_success(response).await?;
        response.json().await.map_err(|err| {
            RepoPulseError::Provider(format!("github contributors decode failed: {err}"))
        })
    }

    async fn fetch_stats(&self, repo: &RepoId, credential: &Credential) -> Result<StatsFetch> {
        let url = self.repo_url(repo, "stats/contributors");
        let response = self.send(self.get(url, credential, JSON_MEDIA_TYPE)).await?;
        log::info!("stats response status: {}", response.status());
        match response.status() {
            StatusCode::ACCEPTED => return Ok(StatsFetch::Processing),
            StatusCode::NO_CONTENT => return Ok(StatsFetch::Ready(Vec::new())),
            _ => {}
        }
        let response = ensure_success(response).await?;
        let rows: Vec<StatsRow> = response
            .json()
            .await
            .map_err(|err| RepoPulseError::Provider(format!("github stats decode failed: {err}")))?;
        stats_from_rows(rows).map(StatsFetch::Ready)
    }
}

impl ContributorSource for GitHubApiClient {
    fn list_contributors<'a>(
        &'a self,
        repo: &'a RepoId,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Vec<ContributorBasic>>> {
        Box::pin(self.fetch_contributors(repo, credential))
    }

    fn contributor_stats<'a>(
        &'a self,
        repo: &'a RepoId,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<StatsFetch>> {
        Box::pin(self.fetch_stats(repo, credential))
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::error!("github api error ({status}): {body}");
    Err(RepoPulseError::Upstream {
        status: status.as_u16(),
        body,
    })
}

fn contents_suffix(path: &str) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("contents/{}", encoded.join("/"))
}

fn stats_from_rows(rows: Vec<StatsRow>) -> Result<Vec<ContributorStats>> {
    let mut stats = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(author) = row.author else {
            log::debug!("dropping stats row without an author");
            continue;
        };
        let weeks = row
            .weeks
            .into_iter()
            .map(|week| {
                let week_start = Utc.timestamp_opt(week.w, 0).single().ok_or_else(|| {
                    RepoPulseError::Provider(format!("invalid week timestamp {}", week.w))
                })?;
                Ok(WeeklyStat {
                    week_start,
                    commits: week.c,
                    additions: week.a,
                    deletions: week.d,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        stats.push(ContributorStats {
            author_id: author.id,
            weeks,
        });
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use repopulse_core::{ReconcileOptions, Sleeper, reconcile_contributors};
    use std::time::Duration;

    struct NoopSleeper;

    impl Sleeper for NoopSleeper {
        fn sleep<'a>(&'a self, _duration: Duration) -> BoxFuture<'a, ()> {
            Box::pin(async {})
        }
    }

    fn client(server: &MockServer) -> GitHubApiClient {
        GitHubApiClient::new(&GitHubConfig {
            api_url: server.base_url(),
            token: None,
            user_agent: "repopulse-tests".to_string(),
        })
    }

    fn repo() -> RepoId {
        RepoId::new("octo", "demo").expect("repo")
    }

    #[tokio::test]
    async fn lists_contributors_with_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/demo/contributors")
                    .header("authorization", "Bearer gh-token")
                    .header("user-agent", "repopulse-tests");
                then.status(200).json_body(serde_json::json!([
                    {"id": 1, "login": "octo", "avatar_url": "https://a/1", "html_url": "https://github.com/octo", "contributions": 12, "type": "User"},
                    {"id": 2, "login": "mona"}
                ]));
            })
            .await;

        let contributors = client(&server)
            .list_contributors(&repo(), &Credential::token("gh-token"))
            .await
            .expect("contributors");

        mock.assert_async().await;
        assert_eq!(contributors.len(), 2);
        assert_eq!(contributors[0].contributions, 12);
        assert_eq!(contributors[1].login, "mona");
        assert_eq!(contributors[1].contributions, 0);
    }

    #[tokio::test]
    async fn contributor_listing_failure_keeps_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/contributors");
                then.status(404)
                    .json_body(serde_json::json!({"message": "Not Found"}));
            })
            .await;

        let err = client(&server)
            .list_contributors(&repo(), &Credential::anonymous())
            .await
            .unwrap_err();

        match err {
            RepoPulseError::Upstream { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stats_processing_is_reported_as_pending() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/stats/contributors");
                then.status(202).json_body(serde_json::json!({}));
            })
            .await;

        let fetch = client(&server)
            .contributor_stats(&repo(), &Credential::anonymous())
            .await
            .expect("stats");
        assert_eq!(fetch, StatsFetch::Processing);
    }

    #[tokio::test]
    async fn stats_rows_are_converted_and_authorless_rows_dropped() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/stats/contributors");
                then.status(200).json_body(serde_json::json!([
                    {"author": {"id": 1, "login": "octo"}, "total": 3, "weeks": [
                        {"w": 1700006400, "a": 10, "d": 2, "c": 1},
                        {"w": 1700611200, "a": 5, "d": 0, "c": 2}
                    ]},
                    {"author": null, "total": 1, "weeks": [{"w": 1700006400, "a": 1, "d": 1, "c": 1}]}
                ]));
            })
            .await;

        let fetch = client(&server)
            .contributor_stats(&repo(), &Credential::anonymous())
            .await
            .expect("stats");

        let StatsFetch::Ready(stats) = fetch else {
            panic!("expected ready stats");
        };
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].author_id, 1);
        assert_eq!(stats[0].weeks.len(), 2);
        assert_eq!(stats[0].weeks[0].week_start.timestamp(), 1_700_006_400);
        assert_eq!(stats[0].weeks[1].commits, 2);
        assert_eq!(stats[0].weeks[0].additions, 10);
    }

    #[tokio::test]
    async fn reconcile_gives_up_when_stats_never_finish() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/contributors");
                then.status(200)
                    .json_body(serde_json::json!([{"id": 1, "login": "octo"}]));
            })
            .await;
        let stats_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/stats/contributors");
                then.status(202);
            })
            .await;

        let err = reconcile_contributors(
            &client(&server),
            &NoopSleeper,
            &repo(),
            &Credential::anonymous(),
            &ReconcileOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RepoPulseError::StatsUnavailable { attempts: 3 }));
        assert_eq!(stats_mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn lists_contents_and_fetches_raw_files() {
        let server = MockServer::start_async().await;
        let listing = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/demo/contents/src/app")
                    .header("accept", JSON_MEDIA_TYPE);
                then.status(200).json_body(serde_json::json!([
                    {"name": "main.py", "path": "src/app/main.py", "type": "file"}
                ]));
            })
            .await;
        let raw = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/demo/contents/src/app/main.py")
                    .header("accept", RAW_MEDIA_TYPE);
                then.status(200).body("print('hello')\n");
            })
            .await;

        let github = client(&server);
        let contents = github
            .list_contents(&repo(), "/src/app/", &Credential::anonymous())
            .await
            .expect("contents");
        let file = github
            .fetch_raw_file(&repo(), "src/app/main.py", &Credential::anonymous())
            .await
            .expect("file");

        listing.assert_async().await;
        raw.assert_async().await;
        assert_eq!(contents[0]["name"], "main.py");
        assert_eq!(file, "print('hello')\n");
    }

    #[test]
    fn contents_suffix_encodes_segments() {
        assert_eq!(contents_suffix(""), "contents/");
        assert_eq!(contents_suffix("docs/my file.md"), "contents/docs/my%20file.md");
    }
}
