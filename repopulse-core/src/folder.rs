//! Folder quality aggregation.
//!
//! Walks a directory, runs the file analyzer over every eligible file and
//! folds the per-file reports into a [`FolderSummary`]. A file that cannot
//! be read or analyzed is skipped; only an invalid root fails the call.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::analysis::{FileAnalyzer, SourceFilter, metric_or_zero};
use crate::domain::{FileAnalysisResult, FolderSummary, HalsteadAverages, HalsteadMetrics};
use crate::error::{RepoPulseError, Result};
use crate::fs::{FileSystem, StdFileSystem};

/// Running state of a folder aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderAggregate {
    files_analyzed: usize,
    files_skipped: usize,
    lines_of_code: f64,
    files_with_complexity: usize,
    cyclomatic_sum: f64,
    maintainability_sum: f64,
    halstead_sum: HalsteadSums,
    issues: Vec<String>,
    suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct HalsteadSums {
    length: f64,
    vocabulary: f64,
    difficulty: f64,
    volume: f64,
    effort: f64,
}

impl HalsteadSums {
    fn add(&mut self, metrics: Option<&HalsteadMetrics>) {
        let Some(metrics) = metrics else {
            return;
        };
        self.length += metric_or_zero(metrics.length);
        self.vocabulary += metric_or_zero(metrics.vocabulary);
        self.difficulty += metric_or_zero(metrics.difficulty);
        self.volume += metric_or_zero(metrics.volume);
        self.effort += metric_or_zero(metrics.effort);
    }

    fn merge(&mut self, other: &Self) {
        self.length += other.length;
        self.vocabulary += other.vocabulary;
        self.difficulty += other.difficulty;
        self.volume += other.volume;
        self.effort += other.effort;
    }

    fn average(&self, count: f64) -> HalsteadAverages {
        HalsteadAverages {
            length: self.length / count,
            vocabulary: self.vocabulary / count,
            difficulty: self.difficulty / count,
            volume: self.volume / count,
            effort: self.effort / count,
        }
    }
}

impl FolderAggregate {
    /// Start an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one successfully analyzed file into the running sums.
    pub fn record(&mut self, result: &FileAnalysisResult) {
        self.files_analyzed += 1;
        self.lines_of_code += metric_or_zero(result.lines_of_code);
        if let Some(complexity) = result
            .complexity_metrics
            .as_ref()
            .filter(|complexity| !complexity.is_empty())
        {
            self.files_with_complexity += 1;
            self.cyclomatic_sum += metric_or_zero(complexity.cyclomatic());
            self.maintainability_sum += metric_or_zero(complexity.maintainability());
            self.halstead_sum.add(complexity.halstead());
        }
        self.issues.extend(result.issues.iter().cloned());
        self.suggestions.extend(result.suggestions.iter().cloned());
    }

    /// Count a file that was skipped after a read or analysis failure.
    pub fn record_skipped(&mut self) {
        self.files_skipped += 1;
    }

    /// Combine a partial aggregate produced elsewhere into this one.
    pub fn merge(&mut self, other: FolderAggregate) {
        self.files_analyzed += other.files_analyzed;
        self.files_skipped += other.files_skipped;
        self.lines_of_code += other.lines_of_code;
        self.files_with_complexity += other.files_with_complexity;
        self.cyclomatic_sum += other.cyclomatic_sum;
        self.maintainability_sum += other.maintainability_sum;
        self.halstead_sum.merge(&other.halstead_sum);
        self.issues.extend(other.issues);
        self.suggestions.extend(other.suggestions);
    }

    /// Produce averages and deduplicated findings.
    ///
    /// Averages are `None` when no analyzed file carried complexity metrics.
    pub fn finalize(self) -> FolderSummary {
        let averaged = self.files_with_complexity > 0;
        let count = self.files_with_complexity as f64;

        FolderSummary {
            total_files_analyzed: self.files_analyzed,
            total_lines_of_code: self.lines_of_code,
            files_with_complexity: self.files_with_complexity,
            files_skipped: self.files_skipped,
            average_cyclomatic_complexity: averaged.then(|| self.cyclomatic_sum / count),
            average_maintainability_index: averaged.then(|| self.maintainability_sum / count),
            average_halstead_metrics: averaged.then(|| self.halstead_sum.average(count)),
            issues: dedupe(self.issues),
            suggestions: dedupe(self.suggestions),
        }
    }
}

fn dedupe(items: Vec<String>) -> Vec<String> {
    items.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

enum FileOutcome {
    Analyzed(FileAnalysisResult),
    Skipped(String),
}

/// Walks a folder and aggregates per-file analysis results.
pub struct FolderAggregator<F: ?Sized, A: ?Sized> {
    fs: Arc<F>,
    analyzer: Arc<A>,
    filter: SourceFilter,
    concurrency: usize,
}

impl<F, A> FolderAggregator<F, A>
where
    F: FileSystem + Send + Sync + ?Sized + 'static,
    A: FileAnalyzer + Send + Sync + ?Sized + 'static,
{
    /// Create an aggregator with the default filter and sequential analysis.
    pub fn new(fs: Arc<F>, analyzer: Arc<A>) -> Self {
        Self {
            fs,
            analyzer,
            filter: SourceFilter::default(),
            concurrency: 1,
        }
    }

    /// Replace the extension filter.
    pub fn with_filter(mut self, filter: SourceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Allow up to `concurrency` analyzer calls in flight. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Aggregate every eligible file under `root`.
    pub async fn aggregate(&self, root: &Path) -> Result<FolderSummary> {
        if !self.fs.is_dir(root) {
            log::warn!("rejecting folder analysis for {}", root.display());
            return Err(RepoPulseError::InvalidPath(root.to_path_buf()));
        }
        let files = match self.fs.list_files(root) {
            Ok(files) => files,
            Err(err) => {
                log::error!("failed to walk {}: {err}", root.display());
                return Err(RepoPulseError::InvalidPath(root.to_path_buf()));
            }
        };
        let mut candidates: Vec<PathBuf> = files
            .into_iter()
            .filter(|path| self.filter.matches(path))
            .collect();
        candidates.sort();
        log::info!(
            "analyzing {} files under {}",
            candidates.len(),
            root.display()
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (index, path) in candidates.iter().cloned().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|err| RepoPulseError::Provider(err.to_string()))?;
            let fs = Arc::clone(&self.fs);
            let analyzer = Arc::clone(&self.analyzer);
            tasks.spawn(async move {
                let _permit = permit;
                (index, analyze_path(fs, analyzer, path).await)
            });
        }

        let mut outcomes: Vec<Option<FileOutcome>> =
            std::iter::repeat_with(|| None).take(candidates.len()).collect();
        let mut aggregate = FolderAggregate::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(err) => {
                    log::error!("file analysis task failed: {err}");
                    aggregate.record_skipped();
                }
            }
        }

        // Fold in path order so floating point sums are reproducible.
        for (path, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                Some(FileOutcome::Analyzed(result)) => {
                    log::debug!("analyzed {}", path.display());
                    aggregate.record(&result);
                }
                Some(FileOutcome::Skipped(reason)) => {
                    log::warn!("skipping {}: {reason}", path.display());
                    aggregate.record_skipped();
                }
                None => {}
            }
        }

        let summary = aggregate.finalize();
        log::info!(
            "folder analysis complete: {} analyzed, {} skipped",
            summary.total_files_analyzed,
            summary.files_skipped
        );
        Ok(summary)
    }
}

async fn analyze_path<F, A>(fs: Arc<F>, analyzer: Arc<A>, path: PathBuf) -> FileOutcome
where
    F: FileSystem + Send + Sync + ?Sized + 'static,
    A: FileAnalyzer + ?Sized,
{
    let read = tokio::task::spawn_blocking(move || fs.read_to_string(&path)).await;
    let content = match read {
        Ok(Ok(content)) => content,
        Ok(Err(err)) => return FileOutcome::Skipped(format!("read failed: {err}")),
        Err(err) => return FileOutcome::Skipped(format!("read task failed: {err}")),
    };
    match analyzer.analyze(&content).await {
        Ok(result) => FileOutcome::Analyzed(result),
        Err(err) => FileOutcome::Skipped(format!("analysis failed: {err}")),
    }
}

/// Aggregate `root` on the local filesystem with the default filter.
pub async fn aggregate_folder<A>(root: &Path, analyzer: Arc<A>) -> Result<FolderSummary>
where
    A: FileAnalyzer + Send + Sync + ?Sized + 'static,
{
    FolderAggregator::new(Arc::new(StdFileSystem::new()), analyzer)
        .aggregate(root)
        .await
}
