#![deny(missing_docs)]
//! RepoPulse core library.
//!
//! This crate contains the domain types and the two pipelines behind the
//! RepoPulse service: contributor reconciliation against a hosting
//! provider and folder-level code quality aggregation.

pub mod analysis;
pub mod backoff;
pub mod contributors;
pub mod domain;
pub mod error;
pub mod folder;
pub mod fs;
pub mod report;

pub use analysis::{AnalysisOutcome, FileAnalyzer, SourceFilter, metric_or_zero};
pub use backoff::{
    BackoffPolicy, BoxFuture, PollOutcome, RetryOutcome, Sleeper, TokioSleeper,
    retry_with_backoff,
};
pub use contributors::{
    ContributorSource, ReconcileOptions, StatsFetch, enrich_contributor, enrich_contributors,
    reconcile_contributors,
};
pub use domain::{
    CommitPoint, ComplexityMetrics, ContributorBasic, ContributorStats, Credential,
    EnrichedContributor, FileAnalysisResult, FolderSummary, HalsteadAverages, HalsteadMetrics,
    RepoId, WeeklyStat,
};
pub use error::{AnalysisError, RepoPulseError, Result};
pub use folder::{FolderAggregate, FolderAggregator, aggregate_folder};
pub use fs::{FileSystem, StdFileSystem};
pub use report::{format_average, render_contributors_markdown, render_folder_markdown, render_json};
