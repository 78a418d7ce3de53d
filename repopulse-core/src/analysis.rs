//! Per-file analysis seam and the helpers shared by folder aggregation.

use std::path::Path;

use crate::backoff::BoxFuture;
use crate::domain::FileAnalysisResult;
use crate::error::AnalysisError;

/// Result of analyzing one file.
pub type AnalysisOutcome = std::result::Result<FileAnalysisResult, AnalysisError>;

/// Produces a quality report for the contents of one source file.
pub trait FileAnalyzer {
    /// Analyze `content`. Failures are recoverable and scoped to this file.
    fn analyze<'a>(&'a self, content: &'a str) -> BoxFuture<'a, AnalysisOutcome>;
}

/// Extension allow-list deciding which files are analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    extensions: Vec<String>,
}

impl SourceFilter {
    /// Build a filter from extensions such as `py` or `.rs`.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        extensions.sort();
        extensions.dedup();
        Self { extensions }
    }

    /// Parse a comma-separated extension list.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Normalized extensions, lowercase and without a leading dot.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether `path` has one of the allowed extensions.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::new(["py"])
    }
}

/// Treat an unknown metric as zero when it feeds a running sum.
///
/// This is the only place where "unknown" collapses to zero; reported
/// values keep the distinction.
pub fn metric_or_zero(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}
