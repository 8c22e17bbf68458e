use crate::cli::CommonArgs;
use crate::model::{ContributorReport, ContributorsOutput, SCHEMA_VERSION};
use crate::stats::StatsSource;
use anyhow::Context;
use chrono::Utc;
use console::style;

const TABLE_ROWS: usize = 50;

pub fn exec(common: CommonArgs, json: bool, ndjson: bool, limit: Option<usize>) -> anyhow::Result<()> {
    let query = common.query(!json && !ndjson);
    let source = StatsSource::open(&query).context("Failed to open repository")?;

    let mut report = source
        .contributors()
        .context("Failed to collect contributor statistics")?;
    if let Some(n) = limit {
        report.contributors.truncate(n);
    }

    if json {
        output_json(report, &source, &common)?;
    } else if ndjson {
        output_ndjson(&report)?;
    } else {
        output_table(&report, limit.unwrap_or(TABLE_ROWS));
    }

    Ok(())
}

fn output_json(report: ContributorReport, source: &StatsSource, common: &CommonArgs) -> anyhow::Result<()> {
    let output = ContributorsOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository: source.display_name(),
        since: common.since.clone(),
        until: common.until.clone(),
        report,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_ndjson(report: &ContributorReport) -> anyhow::Result<()> {
    for c in &report.contributors {
        println!("{}", serde_json::to_string(c)?);
    }
    Ok(())
}

pub(crate) fn output_table(report: &ContributorReport, rows: usize) {
    if report.is_empty() {
        println!("No contributors found");
        return;
    }

    println!(
        "{:<24} {:<32} {:>8} {:>9} {:>9} {:>6} {:>10} {:>7}",
        style("Name").bold(),
        style("Email").bold(),
        style("Commits").bold(),
        style("Added").bold(),
        style("Deleted").bold(),
        style("Files").bold(),
        style("Changes").bold(),
        style("Share").bold()
    );
    println!("{}", "─".repeat(112));
    for c in report.contributors.iter().take(rows) {
        let files = c
            .files_changed
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        println!(
            "{:<24} {:<32} {:>8} {:>9} {:>9} {:>6} {:>10} {:>6.1}%",
            fit(&c.name, 24),
            fit(&c.email, 32),
            c.commit_count,
            style(format!("+{}", c.lines_added)).green(),
            style(format!("-{}", c.lines_deleted)).red(),
            files,
            c.total_changes(),
            c.percentage
        );
    }
    if report.contributors.len() > rows {
        println!("\n... and {} more contributors", report.contributors.len() - rows);
    }
    println!(
        "\n{} commits, {} lines changed",
        report.total_commits, report.total_changes
    );
}

/// Truncate to `width` characters, marking the cut with an ellipsis.
pub(crate) fn fit(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::fit;

    #[test]
    fn fit_truncates_on_char_boundaries() {
        assert_eq!(fit("short", 10), "short");
        assert_eq!(fit("Zoë Łukasiewicz", 5), "Zoë …");
        assert_eq!(fit("abcdef", 6), "abcdef");
    }
}
