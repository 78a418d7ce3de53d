//! HTTP client for the RepoPulse server.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use repopulse_core::{EnrichedContributor, FolderSummary, RepoId};

use crate::CliResult;

/// Error payload returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Reqwest-backed client for the RepoPulse API.
pub(crate) struct ApiClient {
    client: Client,
    server_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client for `server_url`, forwarding `token` as a bearer token.
    pub(crate) fn new(server_url: &str, token: Option<String>) -> CliResult<Self> {
        let client = Client::builder().user_agent("repopulse-cli").build()?;
        Ok(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            token: token.filter(|token| !token.trim().is_empty()),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn contributors_url(&self, repo: &RepoId) -> String {
        format!(
            "{}/api/contributors/{}/{}",
            self.server_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name)
        )
    }

    /// Fetch enriched contributors for a repository.
    pub(crate) async fn contributors(&self, repo: &RepoId) -> CliResult<Vec<EnrichedContributor>> {
        let response = self
            .authorize(self.client.get(self.contributors_url(repo)))
            .send()
            .await?;
        read_json(response).await
    }

    /// Ask the server to aggregate a folder on its filesystem.
    pub(crate) async fn analyze_folder(&self, folder_path: &str) -> CliResult<FolderSummary> {
        let url = format!("{}/api/analyze/folder", self.server_url);
        let response = self
            .authorize(self.client.post(url))
            .json(&serde_json::json!({ "folder_path": folder_path }))
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> CliResult<T> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response.json::<T>().await?);
    }
    let body = response.text().await.unwrap_or_default();
    Err(describe_error(status, &body).into())
}

fn describe_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error,
            details: Some(details),
        }) => {
            let detail = details
                .get("message")
                .and_then(|value| value.as_str())
                .map(String::from)
                .unwrap_or_else(|| details.to_string());
            format!("server returned {status}: {error} ({detail})")
        }
        Ok(ErrorResponse { error, .. }) => format!("server returned {status}: {error}"),
        Err(_) if body.is_empty() => format!("server returned {status}"),
        Err(_) => format!("server returned {status}: {body}"),
    }
}
