//! Contributor reconciliation.
//!
//! Joins the provider's basic contributor listing with its asynchronously
//! computed weekly statistics. The statistics resource may answer
//! "processing" for a while, so it is polled through
//! [`retry_with_backoff`](crate::backoff::retry_with_backoff).

use std::collections::HashMap;

use crate::backoff::{BackoffPolicy, BoxFuture, PollOutcome, RetryOutcome, Sleeper};
use crate::domain::{
    CommitPoint, ContributorBasic, ContributorStats, Credential, EnrichedContributor, RepoId,
    WeeklyStat,
};
use crate::error::{RepoPulseError, Result};

/// Answer from the detailed statistics resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsFetch {
    /// Statistics are computed.
    Ready(Vec<ContributorStats>),
    /// The provider is still computing statistics.
    Processing,
}

/// Provider of contributor listings and weekly statistics.
pub trait ContributorSource {
    /// Fetch the basic contributor listing. Non-success is terminal.
    fn list_contributors<'a>(
        &'a self,
        repo: &'a RepoId,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Vec<ContributorBasic>>>;

    /// Fetch detailed weekly statistics once.
    fn contributor_stats<'a>(
        &'a self,
        repo: &'a RepoId,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<StatsFetch>>;
}

/// Tuning for a reconciliation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Polling policy for the statistics resource.
    pub backoff: BackoffPolicy,
    /// Size of the trailing window for `recent_*` metrics. `None` disables them.
    pub recent_weeks: Option<usize>,
}

/// Fetch both contributor resources and join them into enriched records.
///
/// The result has one entry per listed contributor, in listing order.
pub async fn reconcile_contributors<C, S>(
    source: &C,
    sleeper: &S,
    repo: &RepoId,
    credential: &Credential,
    options: &ReconcileOptions,
) -> Result<Vec<EnrichedContributor>>
where
    C: ContributorSource + ?Sized,
    S: Sleeper + ?Sized,
{
    let slug = repo.slug();
    log::info!("fetching contributors for {slug}");
    let basics = source.list_contributors(repo, credential).await?;
    log::info!("received {} contributors for {slug}", basics.len());

    let outcome = poll_contributor_stats(source, sleeper, repo, credential, &options.backoff)
        .await;
    let stats = match outcome {
        RetryOutcome::Ready(stats) => stats,
        RetryOutcome::Failed(err) => {
            log::error!("failed to fetch detailed statistics for {slug}: {err}");
            return Err(err);
        }
        RetryOutcome::Exhausted { attempts } => {
            log::error!("statistics for {slug} still processing after {attempts} attempts");
            return Err(RepoPulseError::StatsUnavailable { attempts });
        }
    };

    let enriched = enrich_contributors(basics, &stats, options.recent_weeks);
    log::info!("returning data for {} contributors", enriched.len());
    Ok(enriched)
}

async fn poll_contributor_stats<C, S>(
    source: &C,
    sleeper: &S,
    repo: &RepoId,
    credential: &Credential,
    policy: &BackoffPolicy,
) -> RetryOutcome<Vec<ContributorStats>, RepoPulseError>
where
    C: ContributorSource + ?Sized,
    S: Sleeper + ?Sized,
{
    crate::backoff::retry_with_backoff(policy, sleeper, |attempt| async move {
        log::info!(
            "fetching detailed statistics for {} (attempt {attempt})",
            repo.slug()
        );
        match source.contributor_stats(repo, credential).await {
            Ok(StatsFetch::Ready(stats)) => PollOutcome::Ready(stats),
            Ok(StatsFetch::Processing) => PollOutcome::Pending,
            Err(err) => PollOutcome::Failed(err),
        }
    })
    .await
}

/// Join contributors with their statistics by exact author id.
///
/// When the statistics contain the same author twice, the first row wins.
pub fn enrich_contributors(
    basics: Vec<ContributorBasic>,
    stats: &[ContributorStats],
    recent_weeks: Option<usize>,
) -> Vec<EnrichedContributor> {
    let mut by_author: HashMap<u64, &ContributorStats> = HashMap::with_capacity(stats.len());
    for row in stats {
        by_author.entry(row.author_id).or_insert(row);
    }

    basics
        .into_iter()
        .map(|basic| match by_author.get(&basic.id) {
            Some(row) => enrich_contributor(basic, row, recent_weeks),
            None => EnrichedContributor::unmatched(basic),
        })
        .collect()
}

/// Attach totals, history and the optional recent window to one contributor.
pub fn enrich_contributor(
    basic: ContributorBasic,
    stats: &ContributorStats,
    recent_weeks: Option<usize>,
) -> EnrichedContributor {
    let totals = WeekTotals::sum(&stats.weeks);
    let recent = recent_weeks.map(|window| {
        let start = stats.weeks.len().saturating_sub(window);
        WeekTotals::sum(&stats.weeks[start..])
    });

    EnrichedContributor {
        basic,
        total_additions: Some(totals.additions),
        total_deletions: Some(totals.deletions),
        total_commits: Some(totals.commits),
        recent_commits: recent.map(|window| window.commits),
        recent_additions: recent.map(|window| window.additions),
        recent_deletions: recent.map(|window| window.deletions),
        commit_history: Some(stats.weeks.iter().map(CommitPoint::from).collect()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WeekTotals {
    commits: u64,
    additions: u64,
    deletions: u64,
}

impl WeekTotals {
    fn sum(weeks: &[WeeklyStat]) -> Self {
        weeks.iter().fold(Self::default(), |acc, week| Self {
            commits: acc.commits.saturating_add(week.commits),
            additions: acc.additions.saturating_add(week.additions),
            deletions: acc.deletions.saturating_add(week.deletions),
        })
    }
}
