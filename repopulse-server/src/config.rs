//! Server configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use repopulse_core::{BackoffPolicy, ReconcileOptions, SourceFilter};

const DEFAULT_UI_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Runtime settings for the RepoPulse server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Origins allowed by CORS.
    pub ui_origins: Vec<String>,
    /// GitHub API settings.
    pub github: GitHubConfig,
    /// OpenAI API settings.
    pub openai: OpenAiConfig,
    /// Extensions analyzed by folder aggregation.
    pub analyze_filter: SourceFilter,
    /// Analyzer calls allowed in flight during folder aggregation.
    pub folder_concurrency: usize,
    /// Statistics polling and recent window settings.
    pub reconcile: ReconcileOptions,
}

/// GitHub API settings.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// GitHub API base URL.
    pub api_url: String,
    /// Fallback token used when a request carries none.
    pub token: Option<String>,
    /// User agent sent with every request.
    pub user_agent: String,
}

/// OpenAI API settings.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// OpenAI API base URL.
    pub base_url: String,
    /// API key; analysis fails per file when missing.
    pub api_key: Option<String>,
    /// Chat model name.
    pub model: String,
    /// Largest file, in characters, sent to the model.
    pub max_file_chars: usize,
}

impl ServerConfig {
    /// Build configuration from environment variables.
    pub fn from_env() -> Self {
        let ui_origins = parse_list(&env_or("REPOPULSE_UI_ORIGINS", DEFAULT_UI_ORIGINS));
        let attempts = env_parse("REPOPULSE_STATS_ATTEMPTS", 3u32);
        let delay_ms = env_parse("REPOPULSE_STATS_DELAY_MS", 1000u64);
        let recent_weeks = std::env::var("REPOPULSE_RECENT_WEEKS")
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok());

        Self {
            host: env_or("REPOPULSE_HOST", "127.0.0.1"),
            port: env_parse("REPOPULSE_PORT", 5000u16),
            ui_origins,
            github: GitHubConfig::from_env(),
            openai: OpenAiConfig::from_env(),
            analyze_filter: SourceFilter::parse(&env_or("REPOPULSE_ANALYZE_EXTENSIONS", "py")),
            folder_concurrency: env_parse("REPOPULSE_FOLDER_CONCURRENCY", 1usize).max(1),
            reconcile: ReconcileOptions {
                backoff: BackoffPolicy::new(attempts, Duration::from_millis(delay_ms)),
                recent_weeks,
            },
        }
    }
}

impl GitHubConfig {
    /// Build GitHub settings from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_url: env_or("GITHUB_API_URL", "https://api.github.com"),
            token: env_optional("GITHUB_TOKEN"),
            user_agent: env_or("GITHUB_USER_AGENT", "repopulse-server"),
        }
    }
}

impl OpenAiConfig {
    /// Build OpenAI settings from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com"),
            api_key: env_optional("OPENAI_API_KEY"),
            model: env_or("OPENAI_MODEL", "gpt-4o-2024-08-06"),
            max_file_chars: env_parse("REPOPULSE_MAX_FILE_CHARS", 30_000usize),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn env_parse<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid {key}={raw}; using {default}");
            default
        }),
        Err(_) => default,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect()
}
