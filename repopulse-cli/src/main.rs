#![deny(missing_docs)]
//! RepoPulse command-line interface.
//!
//! Queries a RepoPulse server for contributor activity and folder quality
//! summaries and renders them as text, Markdown or JSON.

mod api;

use api::ApiClient;
use clap::{Args, Parser, Subcommand, ValueEnum};
use repopulse_core::{
    EnrichedContributor, FolderSummary, RepoId, format_average, render_contributors_markdown,
    render_folder_markdown, render_json,
};
use std::fmt::Write;
use std::path::PathBuf;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "repopulse", version, about = "RepoPulse CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ServerArgs {
    /// Base URL of the RepoPulse server.
    #[arg(long, env = "REPOPULSE_API_URL", default_value = "http://127.0.0.1:5000")]
    server_url: String,
    /// GitHub token forwarded to the server as a bearer token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Show contributors of a GitHub repository with their activity totals.
    Contributors {
        /// Repository as `owner/name`.
        repo: String,
        #[command(flatten)]
        server: ServerArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Aggregate code quality for a folder on the server host.
    Folder {
        /// Folder to analyze.
        path: PathBuf,
        #[command(flatten)]
        server: ServerArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Contributors {
            repo,
            server,
            report,
        } => run_contributors(&repo, &server, &report).await?,
        Commands::Folder {
            path,
            server,
            report,
        } => run_folder(path, &server, &report).await?,
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

async fn run_contributors(slug: &str, server: &ServerArgs, output: &OutputArgs) -> CliResult<()> {
    let repo = RepoId::parse(slug)?;
    let client = ApiClient::new(&server.server_url, server.token.clone())?;
    let contributors = client.contributors(&repo).await?;
    let contents = match output.format {
        OutputFormat::Text => render_contributors_text(&repo, &contributors),
        OutputFormat::Markdown => render_contributors_markdown(&repo, &contributors),
        OutputFormat::Json => render_json(&contributors)?,
    };
    emit_output(output, contents).await
}

async fn run_folder(path: PathBuf, server: &ServerArgs, output: &OutputArgs) -> CliResult<()> {
    let root = std::path::absolute(&path)?;
    let root = root.to_string_lossy().into_owned();
    let client = ApiClient::new(&server.server_url, server.token.clone())?;
    let summary = client.analyze_folder(&root).await?;
    let contents = match output.format {
        OutputFormat::Text => render_folder_text(&root, &summary),
        OutputFormat::Markdown => render_folder_markdown(&root, &summary),
        OutputFormat::Json => render_json(&summary)?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

fn render_contributors_text(repo: &RepoId, contributors: &[EnrichedContributor]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Repository: {}", repo.slug());
    if contributors.is_empty() {
        let _ = writeln!(output, "No contributors found.");
        return output;
    }
    for contributor in contributors {
        let _ = write!(
            output,
            "{} ({} contributions)",
            contributor.basic.login, contributor.basic.contributions
        );
        match (
            contributor.total_commits,
            contributor.total_additions,
            contributor.total_deletions,
        ) {
            (Some(commits), Some(additions), Some(deletions)) => {
                let _ = write!(output, ": {commits} commits, +{additions} -{deletions}");
                if let Some(recent) = contributor.recent_commits {
                    let _ = write!(output, ", {recent} recent");
                }
                let _ = writeln!(output);
            }
            _ => {
                let _ = writeln!(output, ": no weekly statistics");
            }
        }
    }
    output
}

fn render_folder_text(root: &str, summary: &FolderSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Folder: {root}");
    let _ = writeln!(
        output,
        "Files analyzed: {} (skipped {})",
        summary.total_files_analyzed, summary.files_skipped
    );
    let _ = writeln!(output, "Lines of code: {}", summary.total_lines_of_code);
    let _ = writeln!(
        output,
        "Average cyclomatic complexity: {}",
        format_average(summary.average_cyclomatic_complexity)
    );
    let _ = writeln!(
        output,
        "Average maintainability index: {}",
        format_average(summary.average_maintainability_index)
    );
    if summary.issues.is_empty() {
        let _ = writeln!(output, "Issues: none");
    } else {
        let _ = writeln!(output, "Issues:");
        for issue in &summary.issues {
            let _ = writeln!(output, "  - {issue}");
        }
    }
    if summary.suggestions.is_empty() {
        let _ = writeln!(output, "Suggestions: none");
    } else {
        let _ = writeln!(output, "Suggestions:");
        for suggestion in &summary.suggestions {
            let _ = writeln!(output, "  - {suggestion}");
        }
    }
    output
}
