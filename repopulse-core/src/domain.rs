//! Domain entities for RepoPulse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::{RepoPulseError, Result};

/// Identity of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RepoId {
    /// Owning user or organisation.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoId {
    /// Build a repository identity, rejecting blank segments.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into().trim().to_string();
        let name = name.into().trim().to_string();
        if owner.is_empty() || name.is_empty() {
            return Err(RepoPulseError::InvalidInput(
                "missing owner or repo".to_string(),
            ));
        }
        Ok(Self { owner, name })
    }

    /// Parse an `owner/name` slug.
    pub fn parse(slug: &str) -> Result<Self> {
        let (owner, name) = slug
            .trim()
            .trim_end_matches('/')
            .split_once('/')
            .ok_or_else(|| {
                RepoPulseError::InvalidInput(format!("expected owner/repo, got `{slug}`"))
            })?;
        if name.contains('/') {
            return Err(RepoPulseError::InvalidInput(format!(
                "expected owner/repo, got `{slug}`"
            )));
        }
        Self::new(owner, name)
    }

    /// The `owner/name` slug.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Authorization credential forwarded to the provider.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    token: Option<String>,
}

impl Credential {
    /// A bearer token credential. Blank tokens are treated as anonymous.
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self { token: Some(token) }
    }

    /// No credential; the provider applies its anonymous limits.
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// The bearer token, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.token.is_some() {
            "token"
        } else {
            "anonymous"
        };
        f.debug_tuple("Credential").field(&state).finish()
    }
}

/// Contributor identity as returned by the provider's listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContributorBasic {
    /// Provider account id. Used as the reconciliation key.
    pub id: u64,
    /// Account login.
    pub login: String,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar_url: String,
    /// Profile page URL.
    #[serde(default)]
    pub html_url: String,
    /// Contribution count reported by the listing endpoint.
    #[serde(default)]
    pub contributions: u64,
}

/// Activity of one contributor during one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyStat {
    /// Start of the week.
    pub week_start: DateTime<Utc>,
    /// Commits authored during the week.
    pub commits: u64,
    /// Lines added during the week.
    pub additions: u64,
    /// Lines deleted during the week.
    pub deletions: u64,
}

/// Detailed weekly statistics for one contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ContributorStats {
    /// Provider account id of the author.
    pub author_id: u64,
    /// Weekly entries in provider order.
    pub weeks: Vec<WeeklyStat>,
}

/// One point of a contributor's commit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommitPoint {
    /// Start of the week.
    pub date: DateTime<Utc>,
    /// Commits authored during the week.
    pub commits: u64,
    /// Lines added during the week.
    pub additions: u64,
    /// Lines deleted during the week.
    pub deletions: u64,
}

impl From<&WeeklyStat> for CommitPoint {
    fn from(week: &WeeklyStat) -> Self {
        Self {
            date: week.week_start,
            commits: week.commits,
            additions: week.additions,
            deletions: week.deletions,
        }
    }
}

/// A contributor joined with its derived activity metrics.
///
/// Derived fields are absent (not zero) when no statistics matched the
/// contributor, which keeps "no activity" distinct from "stats unavailable".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EnrichedContributor {
    /// Identity fields from the listing endpoint.
    #[serde(flatten)]
    pub basic: ContributorBasic,
    /// Lines added across all weeks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_additions: Option<u64>,
    /// Lines deleted across all weeks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_deletions: Option<u64>,
    /// Commits across all weeks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_commits: Option<u64>,
    /// Commits in the recent window, when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_commits: Option<u64>,
    /// Lines added in the recent window, when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_additions: Option<u64>,
    /// Lines deleted in the recent window, when enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_deletions: Option<u64>,
    /// One entry per week in provider order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_history: Option<Vec<CommitPoint>>,
}

impl EnrichedContributor {
    /// Wrap a contributor that has no matching statistics.
    pub fn unmatched(basic: ContributorBasic) -> Self {
        Self {
            basic,
            total_additions: None,
            total_deletions: None,
            total_commits: None,
            recent_commits: None,
            recent_additions: None,
            recent_deletions: None,
            commit_history: None,
        }
    }

    /// Whether derived statistics are attached.
    pub fn has_stats(&self) -> bool {
        self.commit_history.is_some()
    }
}

/// Halstead metrics as reported by the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HalsteadMetrics {
    /// Program length.
    #[serde(default)]
    pub length: Option<f64>,
    /// Program vocabulary.
    #[serde(default)]
    pub vocabulary: Option<f64>,
    /// Difficulty.
    #[serde(default)]
    pub difficulty: Option<f64>,
    /// Volume.
    #[serde(default)]
    pub volume: Option<f64>,
    /// Effort.
    #[serde(default)]
    pub effort: Option<f64>,
}

/// Complexity metrics as reported by the analyzer.
///
/// The outer `Option` of each field records whether the key was present at
/// all, so `{}` can be told apart from `{"cyclomatic_complexity": null}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComplexityMetrics {
    /// Cyclomatic complexity.
    #[serde(
        default,
        deserialize_with = "present_key",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<f64>)]
    pub cyclomatic_complexity: Option<Option<f64>>,
    /// Halstead metrics.
    #[serde(
        default,
        deserialize_with = "present_key",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<HalsteadMetrics>)]
    pub halstead_metrics: Option<Option<HalsteadMetrics>>,
    /// Maintainability index.
    #[serde(
        default,
        deserialize_with = "present_key",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<f64>)]
    pub maintainability_index: Option<Option<f64>>,
}

impl ComplexityMetrics {
    /// True when the analyzer sent an object without any known key.
    pub fn is_empty(&self) -> bool {
        self.cyclomatic_complexity.is_none()
            && self.halstead_metrics.is_none()
            && self.maintainability_index.is_none()
    }

    /// Cyclomatic complexity, if reported with a value.
    pub fn cyclomatic(&self) -> Option<f64> {
        self.cyclomatic_complexity.flatten()
    }

    /// Maintainability index, if reported with a value.
    pub fn maintainability(&self) -> Option<f64> {
        self.maintainability_index.flatten()
    }

    /// Halstead metrics, if reported with a value.
    pub fn halstead(&self) -> Option<&HalsteadMetrics> {
        self.halstead_metrics.as_ref().and_then(Option::as_ref)
    }
}

// Only runs when the key exists, so a present `null` becomes `Some(None)`.
fn present_key<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Quality report for a single file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileAnalysisResult {
    /// Lines of code, excluding comments and blanks where possible.
    #[serde(default)]
    pub lines_of_code: Option<f64>,
    /// Complexity metrics, when the analyzer produced them.
    #[serde(default)]
    pub complexity_metrics: Option<ComplexityMetrics>,
    /// Issues, smells and duplicated sections.
    #[serde(default)]
    pub issues: Vec<String>,
    /// Improvement suggestions.
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Short description of the file's purpose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Per-file averages of the Halstead metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HalsteadAverages {
    /// Average program length.
    pub length: f64,
    /// Average vocabulary.
    pub vocabulary: f64,
    /// Average difficulty.
    pub difficulty: f64,
    /// Average volume.
    pub volume: f64,
    /// Average effort.
    pub effort: f64,
}

/// Directory-level code-quality summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FolderSummary {
    /// Files successfully analyzed.
    pub total_files_analyzed: usize,
    /// Sum of lines of code over analyzed files.
    pub total_lines_of_code: f64,
    /// Analyzed files that carried complexity metrics.
    pub files_with_complexity: usize,
    /// Eligible files skipped after a read or analysis failure.
    pub files_skipped: usize,
    /// Average cyclomatic complexity, or null when no file had metrics.
    pub average_cyclomatic_complexity: Option<f64>,
    /// Average maintainability index, or null when no file had metrics.
    pub average_maintainability_index: Option<f64>,
    /// Average Halstead metrics, or null when no file had metrics.
    pub average_halstead_metrics: Option<HalsteadAverages>,
    /// Deduplicated issues.
    pub issues: Vec<String>,
    /// Deduplicated suggestions.
    pub suggestions: Vec<String>,
}
