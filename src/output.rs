//! Rendering of analysis results for the terminal and for export

use serde::Serialize;

use crate::batch::AnalysisOutcome;
use crate::compat::{Compatibility, normalize_loader};
use crate::provider::types::ProjectRecord;

/// Output format accepted by `--format`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

pub const CSV_HEADER: &str = "Mod Name,Provider,Version,Loader,URL";
pub const MARKDOWN_TITLE: &str = "# Minecraft Mod Matrix";

const TABLE_HEADERS: [&str; 2] = ["Minecraft Version", "Mod Loader"];

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [AnalysisOutcome],
    compatibility: JsonSummary<'a>,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    summary: &'a Compatibility,
    message: String,
}

pub fn render(
    format: OutputFormat,
    outcomes: &[AnalysisOutcome],
    summary: &Compatibility,
) -> Result<String, serde_json::Error> {
    Ok(match format {
        OutputFormat::Table => render_table(outcomes, summary),
        OutputFormat::Json => render_json(outcomes, summary)?,
        OutputFormat::Markdown => render_markdown(outcomes),
        OutputFormat::Csv => render_csv(outcomes),
    })
}

fn records(outcomes: &[AnalysisOutcome]) -> impl Iterator<Item = &ProjectRecord> {
    outcomes.iter().filter_map(AnalysisOutcome::record)
}

fn render_table(outcomes: &[AnalysisOutcome], summary: &Compatibility) -> String {
    let mut out = String::new();

    for outcome in outcomes {
        match outcome {
            AnalysisOutcome::Ok(record) => {
                out.push_str(&format!("=== {} ({}) ===\n", record.name, record.provider));
                out.push_str(&format!("Project ID: {}\n", record.project_id));
                out.push_str(&format!("URL: {}\n\n", record.source_url));

                if record.versions.is_empty() {
                    out.push_str("No version/loader data found.\n");
                } else {
                    let rows: Vec<[&str; 2]> = record
                        .versions
                        .iter()
                        .map(|p| [p.game_version.as_str(), p.loader.as_str()])
                        .collect();
                    out.push_str(&grid(&rows));
                }
            }
            AnalysisOutcome::Failed { url, error } => {
                out.push_str(&format!("[ERROR] {}: {}\n", url, error));
            }
        }
        out.push('\n');
    }

    out.push_str(&format!("Compatibility: {}\n", summary));
    out
}

fn grid(rows: &[[&str; 2]]) -> String {
    let mut widths = TABLE_HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = grid_border(&widths, '-');
    out.push_str(&grid_line(&widths, &TABLE_HEADERS));
    out.push_str(&grid_border(&widths, '='));
    for row in rows {
        out.push_str(&grid_line(&widths, row));
        out.push_str(&grid_border(&widths, '-'));
    }
    out
}

fn grid_border(widths: &[usize; 2], fill: char) -> String {
    let cells: Vec<String> = widths
        .iter()
        .map(|w| fill.to_string().repeat(w + 2))
        .collect();
    format!("+{}+\n", cells.join("+"))
}

fn grid_line(widths: &[usize; 2], cells: &[&str; 2]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!(" {:<w$} ", cell, w = *w))
        .collect();
    format!("|{}|\n", cells.join("|"))
}

fn render_json(
    outcomes: &[AnalysisOutcome],
    summary: &Compatibility,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        results: outcomes,
        compatibility: JsonSummary {
            summary,
            message: summary.to_string(),
        },
    })
}

fn render_markdown(outcomes: &[AnalysisOutcome]) -> String {
    let mut md = format!("{}\n\n", MARKDOWN_TITLE);
    for record in records(outcomes) {
        md.push_str(&format!("- **{}** ({})\n", record.name, record.provider));
        for pair in &record.versions {
            md.push_str(&format!(
                "  - {} → {}\n",
                pair.game_version,
                normalize_loader(&pair.loader)
            ));
        }
    }
    md
}

fn render_csv(outcomes: &[AnalysisOutcome]) -> String {
    let mut csv = format!("{}\n", CSV_HEADER);
    for record in records(outcomes) {
        for pair in &record.versions {
            let fields = [
                csv_field(&record.name),
                csv_field(record.provider.as_str()),
                csv_field(&pair.game_version),
                csv_field(normalize_loader(&pair.loader).as_str()),
                csv_field(&record.source_url),
            ];
            csv.push_str(&fields.join(","));
            csv.push('\n');
        }
    }
    csv
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
