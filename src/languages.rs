use crate::cli::CommonArgs;
use crate::model::{LanguageReport, LanguageUnit, LanguagesOutput, Mode, SCHEMA_VERSION};
use crate::stats::StatsSource;
use anyhow::Context;
use chrono::Utc;
use console::style;

pub fn exec(common: CommonArgs, lines: bool, json: bool) -> anyhow::Result<()> {
    let query = common.query(false);
    let source = StatsSource::open(&query).context("Failed to open repository")?;

    if lines && source.mode() == Mode::Remote {
        eprintln!(
            "{} line counts are not available for remote repositories; showing bytes",
            style("note:").cyan().bold()
        );
    }

    let report = source
        .languages(lines)
        .context("Failed to compute language statistics")?;

    if json {
        let output = LanguagesOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository: source.display_name(),
            report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output_table(&report);
    }

    Ok(())
}

pub(crate) fn output_table(report: &LanguageReport) {
    if report.languages.is_empty() {
        println!("No source files found");
        return;
    }

    let unit = match report.unit {
        LanguageUnit::Lines => "Lines",
        LanguageUnit::Bytes => "Bytes",
    };
    println!(
        "{:<20} {:>12} {:>7} {:>7}",
        style("Language").bold(),
        style(unit).bold(),
        style("Files").bold(),
        style("Share").bold()
    );
    println!("{}", "─".repeat(70));
    for lang in &report.languages {
        let files = lang.files.map_or_else(|| "-".to_string(), |n| n.to_string());
        println!(
            "{:<20} {:>12} {:>7} {:>6.1}%  {}",
            lang.language,
            lang.value,
            files,
            lang.percentage,
            style(bar(lang.percentage, 20)).blue()
        );
    }

    println!("\n{} {} total", report.total, report.unit);
    if let Some(files) = report.files {
        println!(
            "{} code files, {} other files",
            files.code_files, files.non_code_files
        );
    }
    if !report.skipped.is_empty() {
        println!(
            "{}",
            style(format!("{} files skipped (binary or unreadable)", report.skipped.len())).dim()
        );
    }
}

fn bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage / 100.0) * width as f64).round() as usize;
    "█".repeat(filled.min(width))
}

#[cfg(test)]
mod tests {
    use super::bar;

    #[test]
    fn bar_scales_with_share() {
        assert_eq!(bar(0.0, 20), "");
        assert_eq!(bar(50.0, 20).chars().count(), 10);
        assert_eq!(bar(100.0, 20).chars().count(), 20);
    }
}
