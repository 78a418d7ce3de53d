//! HTTP handlers for RepoPulse server.

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use repopulse_core::{
    ContributorSource, Credential, FileAnalyzer, FolderAggregator, ReconcileOptions, RepoId,
    RepoPulseError, Sleeper, SourceFilter, StdFileSystem, TokioSleeper, reconcile_contributors,
};

use crate::analyzer::OpenAiAnalyzer;
use crate::config::ServerConfig;
use crate::github::GitHubApiClient;
use crate::openapi::ApiDoc;

#[derive(Clone)]
/// Shared application state for handlers.
pub struct AppState {
    /// Source of contributor listings and statistics.
    pub contributors: Arc<dyn ContributorSource + Send + Sync>,
    /// GitHub client used by the repository contents endpoints.
    pub github: Arc<GitHubApiClient>,
    /// Single file analyzer.
    pub analyzer: Arc<dyn FileAnalyzer + Send + Sync>,
    /// Sleeper used between statistics polls.
    pub sleeper: Arc<dyn Sleeper + Send + Sync>,
    /// Request handling settings.
    pub settings: RouteSettings,
}

/// Settings consulted by the handlers.
#[derive(Debug, Clone, Default)]
pub struct RouteSettings {
    /// Token used when a request carries no bearer token.
    pub default_token: Option<String>,
    /// Statistics polling and recent window settings.
    pub reconcile: ReconcileOptions,
    /// Extensions analyzed by folder aggregation.
    pub analyze_filter: SourceFilter,
    /// Analyzer calls allowed in flight during folder aggregation.
    pub folder_concurrency: usize,
}

impl AppState {
    /// Build production state from configuration.
    #[cfg_attr(test, allow(dead_code))]
    pub fn from_config(config: &ServerConfig) -> Self {
        let github = Arc::new(GitHubApiClient::new(&config.github));
        Self {
            contributors: github.clone(),
            github,
            analyzer: Arc::new(OpenAiAnalyzer::new(&config.openai)),
            sleeper: Arc::new(TokioSleeper),
            settings: RouteSettings {
                default_token: config.github.token.clone(),
                reconcile: config.reconcile.clone(),
                analyze_filter: config.analyze_filter.clone(),
                folder_concurrency: config.folder_concurrency,
            },
        }
    }
}

/// Error response payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Provider error body, when one was returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Request payload for single file analysis.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeFileRequest {
    /// Source text to analyze.
    #[serde(default)]
    pub file_content: Option<String>,
}

/// Request payload for folder analysis.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeFolderRequest {
    /// Directory on the server to aggregate.
    #[serde(default)]
    pub folder_path: Option<String>,
}

/// Query parameters for the repository contents endpoints.
#[derive(Debug, Deserialize)]
pub struct ContentsQuery {
    /// Path inside the repository; empty means the root.
    #[serde(default)]
    pub path: String,
}

/// Liveness payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: String,
}

fn error_body(status: StatusCode, error: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.into(),
        details: None,
    })
}

fn error_response(err: RepoPulseError, upstream_message: &str) -> HttpResponse {
    match err {
        RepoPulseError::InvalidInput(message) => error_body(StatusCode::BAD_REQUEST, message),
        RepoPulseError::Upstream { status, body } => {
            let details = serde_json::from_str(&body)
                .unwrap_or_else(|_| serde_json::Value::String(body));
            HttpResponse::build(StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY))
                .json(ErrorResponse {
                    error: upstream_message.to_string(),
                    details: Some(details),
                })
        }
        RepoPulseError::StatsUnavailable { .. } => {
            error_body(StatusCode::ACCEPTED, "Failed to fetch detailed statistics")
        }
        RepoPulseError::InvalidPath(path) => error_body(
            StatusCode::BAD_REQUEST,
            format!("Invalid folder path: {}", path.display()),
        ),
        RepoPulseError::Provider(message) => error_body(StatusCode::BAD_GATEWAY, message),
        RepoPulseError::Io(err) => error_body(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn request_credential(req: &HttpRequest, default_token: Option<&str>) -> Credential {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    match bearer.or(default_token) {
        Some(token) => Credential::token(token),
        None => Credential::anonymous(),
    }
}

#[utoipa::path(
    get,
    path = "/contributors/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name")
    ),
    responses(
        (status = 200, description = "Contributors with activity metrics", body = [repopulse_core::EnrichedContributor]),
        (status = 202, description = "Statistics still processing", body = ErrorResponse),
        (status = 400, description = "Missing owner or repo", body = ErrorResponse),
        (status = 502, description = "Provider unreachable", body = ErrorResponse)
    ),
    tag = "contributors"
)]
#[get("/api/contributors/{owner}/{repo}")]
/// Reconcile contributors with their weekly statistics.
pub async fn contributors(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (owner, name) = path.into_inner();
    let repo = match RepoId::new(owner, name) {
        Ok(repo) => repo,
        Err(err) => {
            log::error!("rejecting contributors request: {err}");
            return error_response(err, "GitHub API request failed");
        }
    };
    let credential = request_credential(&req, state.settings.default_token.as_deref());
    match reconcile_contributors(
        state.contributors.as_ref(),
        state.sleeper.as_ref(),
        &repo,
        &credential,
        &state.settings.reconcile,
    )
    .await
    {
        Ok(enriched) => HttpResponse::Ok().json(enriched),
        Err(err) => error_response(err, "GitHub API request failed"),
    }
}

#[utoipa::path(
    post,
    path = "/analyze/file",
    request_body = AnalyzeFileRequest,
    responses(
        (status = 200, description = "File analysis", body = repopulse_core::FileAnalysisResult),
        (status = 400, description = "Missing file content", body = ErrorResponse),
        (status = 502, description = "Analysis failed", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/analyze/file")]
/// Analyze a single file's content.
pub async fn analyze_file(
    state: web::Data<AppState>,
    payload: web::Json<AnalyzeFileRequest>,
) -> impl Responder {
    let Some(content) = payload.into_inner().file_content else {
        log::error!("missing file_content in request");
        return error_body(StatusCode::BAD_REQUEST, "Missing file_content in request");
    };
    log::info!("analyzing single file content");
    match state.analyzer.analyze(&content).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(err) => {
            log::error!("file analysis failed: {err}");
            error_body(StatusCode::BAD_GATEWAY, err.message())
        }
    }
}

#[utoipa::path(
    post,
    path = "/analyze/folder",
    request_body = AnalyzeFolderRequest,
    responses(
        (status = 200, description = "Folder summary", body = repopulse_core::FolderSummary),
        (status = 400, description = "Missing or invalid folder path", body = ErrorResponse)
    ),
    tag = "analysis"
)]
#[post("/api/analyze/folder")]
/// Aggregate code quality across a folder on the server.
pub async fn analyze_folder(
    state: web::Data<AppState>,
    payload: web::Json<AnalyzeFolderRequest>,
) -> impl Responder {
    let Some(folder_path) = payload.into_inner().folder_path else {
        log::error!("missing folder_path in request");
        return error_body(StatusCode::BAD_REQUEST, "Missing folder_path in request");
    };
    let aggregator = FolderAggregator::new(Arc::new(StdFileSystem::new()), state.analyzer.clone())
        .with_filter(state.settings.analyze_filter.clone())
        .with_concurrency(state.settings.folder_concurrency);
    match aggregator.aggregate(&PathBuf::from(folder_path)).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(err) => error_response(err, "Folder analysis failed"),
    }
}

#[utoipa::path(
    get,
    path = "/github/list-files/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
        ("path" = Option<String>, Query, description = "Folder inside the repository")
    ),
    responses(
        (status = 200, description = "Repository contents listing", body = serde_json::Value),
        (status = 404, description = "Path not found", body = ErrorResponse)
    ),
    tag = "github"
)]
#[get("/api/github/list-files/{owner}/{repo}")]
/// List a folder of a GitHub repository.
pub async fn github_list_files(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<ContentsQuery>,
) -> impl Responder {
    let (owner, name) = path.into_inner();
    let repo = match RepoId::new(owner, name) {
        Ok(repo) => repo,
        Err(err) => return error_response(err, "Failed to fetch repository contents"),
    };
    let credential = request_credential(&req, state.settings.default_token.as_deref());
    match state
        .github
        .list_contents(&repo, &query.path, &credential)
        .await
    {
        Ok(listing) => HttpResponse::Ok().json(listing),
        Err(err) => error_response(err, "Failed to fetch repository contents"),
    }
}

#[utoipa::path(
    get,
    path = "/github/get-file/{owner}/{repo}",
    params(
        ("owner" = String, Path, description = "Repository owner"),
        ("repo" = String, Path, description = "Repository name"),
        ("path" = String, Query, description = "File inside the repository")
    ),
    responses(
        (status = 200, description = "Raw file content", body = String, content_type = "text/plain"),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    tag = "github"
)]
#[get("/api/github/get-file/{owner}/{repo}")]
/// Fetch the raw content of a GitHub repository file.
pub async fn github_get_file(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<ContentsQuery>,
) -> impl Responder {
    let (owner, name) = path.into_inner();
    let repo = match RepoId::new(owner, name) {
        Ok(repo) => repo,
        Err(err) => return error_response(err, "Failed to fetch file content"),
    };
    let credential = request_credential(&req, state.settings.default_token.as_deref());
    match state
        .github
        .fetch_raw_file(&repo, &query.path, &credential)
        .await
    {
        Ok(text) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(text),
        Err(err) => error_response(err, "Failed to fetch file content"),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "system"
)]
#[get("/api/health")]
/// Liveness probe.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/openapi.json",
    responses(
        (status = 200, description = "OpenAPI document", body = serde_json::Value)
    ),
    tag = "system"
)]
#[get("/api/openapi.json")]
/// Serve the OpenAPI document.
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Register every RepoPulse route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(contributors)
        .service(analyze_file)
        .service(analyze_folder)
        .service(github_list_files)
        .service(github_get_file)
        .service(health)
        .service(openapi_json);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use repopulse_core::{
        AnalysisError, AnalysisOutcome, BackoffPolicy, BoxFuture, ContributorBasic,
        ContributorStats, FileAnalysisResult, FolderSummary, Result as CoreResult, StatsFetch,
        WeeklyStat,
    };
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::config::GitHubConfig;

    struct NoopSleeper;

    impl Sleeper for NoopSleeper {
        fn sleep<'a>(&'a self, _duration: Duration) -> BoxFuture<'a, ()> {
            Box::pin(async {})
        }
    }

    enum StubStats {
        Ready,
        Processing,
        ListingFails,
    }

    struct StubSource {
        mode: StubStats,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    impl StubSource {
        fn new(mode: StubStats) -> Self {
            Self {
                mode,
                seen_tokens: Mutex::new(Vec::new()),
            }
        }

        fn seen_tokens(&self) -> Vec<Option<String>> {
            self.seen_tokens.lock().expect("tokens").clone()
        }
    }

    impl ContributorSource for StubSource {
        fn list_contributors<'a>(
            &'a self,
            _repo: &'a RepoId,
            credential: &'a Credential,
        ) -> BoxFuture<'a, CoreResult<Vec<ContributorBasic>>> {
            self.seen_tokens
                .lock()
                .expect("tokens")
                .push(credential.bearer().map(String::from));
            let result = match self.mode {
                StubStats::ListingFails => Err(RepoPulseError::Upstream {
                    status: 404,
                    body: r#"{"message":"Not Found"}"#.to_string(),
                }),
                _ => Ok(vec![basic(1, "octo"), basic(2, "mona")]),
            };
            Box::pin(async move { result })
        }

        fn contributor_stats<'a>(
            &'a self,
            _repo: &'a RepoId,
            _credential: &'a Credential,
        ) -> BoxFuture<'a, CoreResult<StatsFetch>> {
            let fetch = match self.mode {
                StubStats::Processing => StatsFetch::Processing,
                _ => StatsFetch::Ready(vec![ContributorStats {
                    author_id: 1,
                    weeks: vec![WeeklyStat {
                        week_start: chrono::DateTime::from_timestamp(1_700_006_400, 0)
                            .expect("timestamp"),
                        commits: 4,
                        additions: 40,
                        deletions: 4,
                    }],
                }]),
            };
            Box::pin(async move { Ok(fetch) })
        }
    }

    struct StubAnalyzer;

    impl FileAnalyzer for StubAnalyzer {
        fn analyze<'a>(&'a self, content: &'a str) -> BoxFuture<'a, AnalysisOutcome> {
            let outcome = if content.contains("fail") {
                Err(AnalysisError::new("model unavailable"))
            } else {
                Ok(FileAnalysisResult {
                    lines_of_code: Some(content.lines().count() as f64),
                    issues: vec!["naming".to_string()],
                    ..FileAnalysisResult::default()
                })
            };
            Box::pin(async move { outcome })
        }
    }

    fn basic(id: u64, login: &str) -> ContributorBasic {
        ContributorBasic {
            id,
            login: login.to_string(),
            avatar_url: String::new(),
            html_url: format!("https://github.com/{login}"),
            contributions: 3,
        }
    }

    fn test_state(source: Arc<StubSource>, github_url: &str) -> web::Data<AppState> {
        web::Data::new(AppState {
            contributors: source,
            github: Arc::new(GitHubApiClient::new(&GitHubConfig {
                api_url: github_url.to_string(),
                token: None,
                user_agent: "repopulse-tests".to_string(),
            })),
            analyzer: Arc::new(StubAnalyzer),
            sleeper: Arc::new(NoopSleeper),
            settings: RouteSettings {
                default_token: Some("server-token".to_string()),
                reconcile: ReconcileOptions {
                    backoff: BackoffPolicy::new(3, Duration::from_millis(1)),
                    recent_weeks: None,
                },
                analyze_filter: SourceFilter::default(),
                folder_concurrency: 2,
            },
        })
    }

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("repopulse_server_{prefix}_{nanos}"));
        std::fs::create_dir_all(&root).expect("create temp dir");
        root
    }

    #[actix_web::test]
    async fn contributors_returns_enriched_list() {
        let source = Arc::new(StubSource::new(StubStats::Ready));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source.clone(), "http://127.0.0.1:9"))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/contributors/octo/demo")
            .insert_header(("Authorization", "Bearer user-token"))
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let list = resp.as_array().expect("array");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["login"], "octo");
        assert_eq!(list[0]["total_commits"], 4);
        assert_eq!(list[0]["commit_history"][0]["date"], "2023-11-15T00:00:00Z");
        assert!(list[1].get("total_commits").is_none());
        assert_eq!(source.seen_tokens(), vec![Some("user-token".to_string())]);
    }

    #[actix_web::test]
    async fn contributors_falls_back_to_server_token() {
        let source = Arc::new(StubSource::new(StubStats::Ready));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source.clone(), "http://127.0.0.1:9"))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/contributors/octo/demo")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(source.seen_tokens(), vec![Some("server-token".to_string())]);
    }

    #[actix_web::test]
    async fn contributors_relays_upstream_status_and_details() {
        let source = Arc::new(StubSource::new(StubStats::ListingFails));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source, "http://127.0.0.1:9"))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/contributors/octo/missing")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "GitHub API request failed");
        assert_eq!(body.details.expect("details")["message"], "Not Found");
    }

    #[actix_web::test]
    async fn contributors_reports_processing_when_stats_never_finish() {
        let source = Arc::new(StubSource::new(StubStats::Processing));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source, "http://127.0.0.1:9"))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/contributors/octo/demo")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Failed to fetch detailed statistics");
    }

    #[actix_web::test]
    async fn contributors_rejects_blank_owner() {
        let source = Arc::new(StubSource::new(StubStats::Ready));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source.clone(), "http://127.0.0.1:9"))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/contributors/%20/demo")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(source.seen_tokens().is_empty());
    }

    #[actix_web::test]
    async fn analyze_file_returns_analysis_or_errors() {
        let source = Arc::new(StubSource::new(StubStats::Ready));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source, "http://127.0.0.1:9"))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/analyze/file")
            .set_json(serde_json::json!({"file_content": "a = 1\nb = 2\n"}))
            .to_request();
        let resp: FileAnalysisResult = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.lines_of_code, Some(2.0));

        let req = test::TestRequest::post()
            .uri("/api/analyze/file")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Missing file_content in request");

        let req = test::TestRequest::post()
            .uri("/api/analyze/file")
            .set_json(serde_json::json!({"file_content": "fail()"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn analyze_folder_aggregates_and_validates_root() {
        let root = unique_temp_dir("analyze_folder");
        std::fs::create_dir_all(root.join("pkg")).expect("pkg");
        std::fs::write(root.join("a.py"), "x = 1\n").expect("write a");
        std::fs::write(root.join("pkg/b.py"), "y = 2\nz = 3\n").expect("write b");
        std::fs::write(root.join("pkg/c.py"), "fail()\n").expect("write c");
        std::fs::write(root.join("README.md"), "docs\n").expect("write readme");

        let source = Arc::new(StubSource::new(StubStats::Ready));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source, "http://127.0.0.1:9"))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/analyze/folder")
            .set_json(serde_json::json!({"folder_path": root.to_string_lossy()}))
            .to_request();
        let summary: FolderSummary = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary.total_files_analyzed, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.total_lines_of_code, 3.0);
        assert_eq!(summary.average_cyclomatic_complexity, None);
        assert_eq!(summary.issues, vec!["naming".to_string()]);

        let file_root = root.join("a.py");
        let req = test::TestRequest::post()
            .uri("/api/analyze/folder")
            .set_json(serde_json::json!({"folder_path": file_root.to_string_lossy()}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.starts_with("Invalid folder path"));

        let req = test::TestRequest::post()
            .uri("/api/analyze/folder")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    #[actix_web::test]
    async fn github_contents_endpoints_proxy_provider() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/octo/demo/contents/src")
                    .header("authorization", "Bearer server-token");
                then.status(200)
                    .json_body(serde_json::json!([{"name": "main.py", "type": "file"}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/contents/src/main.py");
                then.status(200).body("print('hi')\n");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/octo/demo/contents/missing");
                then.status(404)
                    .json_body(serde_json::json!({"message": "Not Found"}));
            })
            .await;

        let source = Arc::new(StubSource::new(StubStats::Ready));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source, &server.base_url()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/github/list-files/octo/demo?path=src")
            .to_request();
        let listing: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing[0]["name"], "main.py");

        let req = test::TestRequest::get()
            .uri("/api/github/get-file/octo/demo?path=src/main.py")
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(std::str::from_utf8(&body).expect("utf8"), "print('hi')\n");

        let req = test::TestRequest::get()
            .uri("/api/github/list-files/octo/demo?path=missing")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Failed to fetch repository contents");
    }

    #[actix_web::test]
    async fn health_and_openapi_are_served() {
        let source = Arc::new(StubSource::new(StubStats::Ready));
        let app = test::init_service(
            App::new()
                .app_data(test_state(source, "http://127.0.0.1:9"))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let health_body: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health_body.status, "ok");

        let req = test::TestRequest::get().uri("/api/openapi.json").to_request();
        let doc: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(doc["paths"]["/contributors/{owner}/{repo}"].is_object());
        assert!(doc["components"]["schemas"]["FolderSummary"].is_object());
    }
}
