use crate::cli::CommonArgs;
use crate::model::{AnalysisOutput, Mode, SCHEMA_VERSION};
use crate::stats::StatsSource;
use anyhow::Context;
use chrono::Utc;
use console::style;

const TOP_CONTRIBUTORS: usize = 10;

pub fn exec(common: CommonArgs, json: bool, lines: bool) -> anyhow::Result<()> {
    let query = common.query(!json);
    let source = StatsSource::open(&query).context("Failed to open repository")?;

    let by_lines = lines && source.mode() == Mode::Local;
    if lines && !by_lines {
        eprintln!(
            "{} line counts are not available for remote repositories; showing bytes",
            style("note:").cyan().bold()
        );
    }

    let report = source
        .analyze(by_lines)
        .context("Failed to analyze repository")?;

    if json {
        let output = AnalysisOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository: source.display_name(),
            mode: source.mode(),
            report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", style("Repository").bold(), source.display_name());
    crate::codebase::output_table(&report.codebase);

    println!("\n{}", style("Contributors").bold());
    crate::contributors::output_table(&report.contributors, TOP_CONTRIBUTORS);

    println!("\n{}", style("Languages").bold());
    crate::languages::output_table(&report.languages);

    Ok(())
}
