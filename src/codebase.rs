use crate::cli::CommonArgs;
use crate::model::{
    CodebaseOutput, CodebaseReport, CommitActivity, FileStats, RepositoryInfo,
    RepositoryMetadata, SCHEMA_VERSION,
};
use crate::stats::StatsSource;
use anyhow::Context;
use chrono::Utc;
use console::style;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const RECENT_MONTHS: usize = 12;

pub fn exec(common: CommonArgs, json: bool) -> anyhow::Result<()> {
    let query = common.query(!json);
    let source = StatsSource::open(&query).context("Failed to open repository")?;

    let report = source
        .codebase()
        .context("Failed to collect codebase statistics")?;

    if json {
        let output = CodebaseOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository: source.display_name(),
            mode: source.mode(),
            report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}", style("Repository").bold(), source.display_name());
        output_table(&report);
    }

    Ok(())
}

pub(crate) fn output_table(report: &CodebaseReport) {
    if let Some(info) = &report.info {
        output_info(info);
    }
    if let Some(meta) = &report.metadata {
        output_metadata(meta);
    }
    if let Some(activity) = &report.activity {
        output_activity(activity);
    }
    if let Some(files) = &report.files {
        output_files(files);
    }
}

fn output_info(info: &RepositoryInfo) {
    println!(
        "branch {}  remote {}",
        info.default_branch.as_deref().unwrap_or("(detached)"),
        info.remote_url.as_deref().unwrap_or("(none)")
    );
    match (info.first_commit, info.last_commit) {
        (Some(first), Some(last)) => println!(
            "{} commits from {} to {}",
            info.total_commits,
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        _ => println!("no commits"),
    }
    println!("{} tracked files", info.total_files);
}

fn output_metadata(meta: &RepositoryMetadata) {
    if let Some(description) = &meta.description {
        println!("{}", style(description).dim());
    }
    println!(
        "{} stars  {} forks  {} open issues  {} open pull requests",
        style(meta.stars).yellow(),
        meta.forks,
        meta.open_issues,
        meta.open_pull_requests
    );
    println!(
        "default branch {}  primary language {}",
        meta.default_branch,
        meta.language.as_deref().unwrap_or("unknown")
    );
}

fn output_activity(activity: &CommitActivity) {
    if activity.by_month.is_empty() {
        return;
    }

    println!("\n{}", style("Commits by month").bold());
    let skip = activity.by_month.len().saturating_sub(RECENT_MONTHS);
    let peak = activity.by_month.values().copied().max().unwrap_or(0);
    for (month, count) in activity.by_month.iter().skip(skip) {
        println!("{:<8} {:>6}  {}", month, count, style(bar(*count, peak, 30)).blue());
    }

    println!("\n{}", style("Commits by weekday").bold());
    let peak = activity.by_weekday.iter().copied().max().unwrap_or(0);
    for (day, count) in WEEKDAYS.iter().zip(activity.by_weekday) {
        println!("{:<8} {:>6}  {}", day, count, style(bar(count, peak, 30)).blue());
    }

    let (busiest, count) = activity
        .by_hour
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(hour, count)| (hour, *count))
        .unwrap_or((0, 0));
    println!("\nbusiest hour {busiest:02}:00 ({count} commits)");
}

fn output_files(files: &FileStats) {
    println!("\n{}", style("File types").bold());
    let mut extensions: Vec<(&String, &u64)> = files.by_extension.iter().collect();
    extensions.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (ext, count) in extensions.iter().take(10) {
        println!("{:<12} {:>6}", ext, count);
    }
    println!("{} files", files.file_count);

    if !files.largest_files.is_empty() {
        println!("\n{}", style("Largest files").bold());
        for f in &files.largest_files {
            println!("{:>8}  {}", f.lines, crate::contributors::fit(&f.path, 70));
        }
    }

    if !files.most_changed_files.is_empty() {
        println!("\n{}", style("Most changed files").bold());
        for f in &files.most_changed_files {
            println!("{:>8}  {}", f.commits, crate::contributors::fit(&f.path, 70));
        }
    }
}

fn bar(value: u64, peak: u64, width: usize) -> String {
    if peak == 0 {
        return String::new();
    }
    let filled = (value as f64 / peak as f64 * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}
