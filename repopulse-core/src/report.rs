//! Report formatting utilities for RepoPulse outputs.

use std::fmt::Write;

use serde::Serialize;

use crate::domain::{EnrichedContributor, FolderSummary, RepoId};

/// Render enriched contributors for a repository as Markdown.
pub fn render_contributors_markdown(repo: &RepoId, contributors: &[EnrichedContributor]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# RepoPulse Contributors Report\n");
    let _ = writeln!(output, "## {}\n", repo.slug());
    if contributors.is_empty() {
        let _ = writeln!(output, "No contributors found.\n");
        return output;
    }

    let show_recent = contributors
        .iter()
        .any(|contributor| contributor.recent_commits.is_some());
    if show_recent {
        let _ = writeln!(
            output,
            "| Contributor | Contributions | Commits | Additions | Deletions | Recent commits |"
        );
        let _ = writeln!(output, "| --- | ---: | ---: | ---: | ---: | ---: |");
    } else {
        let _ = writeln!(
            output,
            "| Contributor | Contributions | Commits | Additions | Deletions |"
        );
        let _ = writeln!(output, "| --- | ---: | ---: | ---: | ---: |");
    }
    for contributor in contributors {
        let _ = write!(
            output,
            "| [{}]({}) | {} | {} | {} | {} |",
            contributor.basic.login,
            contributor.basic.html_url,
            contributor.basic.contributions,
            format_count(contributor.total_commits),
            format_count(contributor.total_additions),
            format_count(contributor.total_deletions),
        );
        if show_recent {
            let _ = write!(output, " {} |", format_count(contributor.recent_commits));
        }
        let _ = writeln!(output);
    }
    let _ = writeln!(output);

    let missing: Vec<String> = contributors
        .iter()
        .filter(|contributor| !contributor.has_stats())
        .map(|contributor| contributor.basic.login.clone())
        .collect();
    if !missing.is_empty() {
        append_list(
            &mut output,
            "Without weekly statistics",
            &missing,
            "All contributors have statistics.",
        );
    }
    output
}

/// Render a folder summary as Markdown.
pub fn render_folder_markdown(root: &str, summary: &FolderSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# RepoPulse Folder Report\n");
    let _ = writeln!(output, "## {root}\n");
    let _ = writeln!(
        output,
        "- Files analyzed: {}",
        summary.total_files_analyzed
    );
    let _ = writeln!(output, "- Files skipped: {}", summary.files_skipped);
    let _ = writeln!(
        output,
        "- Lines of code: {}",
        format_number(summary.total_lines_of_code)
    );
    let _ = writeln!(
        output,
        "- Files with complexity metrics: {}",
        summary.files_with_complexity
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "### Averages");
    let _ = writeln!(
        output,
        "- Cyclomatic complexity: {}",
        format_average(summary.average_cyclomatic_complexity)
    );
    let _ = writeln!(
        output,
        "- Maintainability index: {}",
        format_average(summary.average_maintainability_index)
    );
    match &summary.average_halstead_metrics {
        Some(halstead) => {
            let _ = writeln!(
                output,
                "- Halstead: length {:.2}, vocabulary {:.2}, difficulty {:.2}, volume {:.2}, effort {:.2}",
                halstead.length,
                halstead.vocabulary,
                halstead.difficulty,
                halstead.volume,
                halstead.effort
            );
        }
        None => {
            let _ = writeln!(output, "- Halstead: n/a");
        }
    }
    let _ = writeln!(output);

    append_list(&mut output, "Issues", &summary.issues, "No issues reported.");
    append_list(
        &mut output,
        "Suggestions",
        &summary.suggestions,
        "No suggestions.",
    );
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// Format an optional average with two decimals, or `n/a` when unknown.
pub fn format_average(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn format_count(value: Option<u64>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn append_list(output: &mut String, title: &str, items: &[String], empty_message: &str) {
    if items.is_empty() {
        let _ = writeln!(output, "### {title}\n{empty_message}\n");
        return;
    }
    let _ = writeln!(output, "### {title}");
    for item in items {
        let _ = writeln!(output, "- {item}");
    }
    let _ = writeln!(output);
}
