/*!
 * Reporting functionality for protree
 *
 * Provides functionality for generating formatted summaries of encode and
 * decode runs using the tabled library for clean, consistent table rendering.
 */

use std::collections::HashMap;
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::error::{Issue, Result};
use crate::tokens::estimate_tokens;

/// Information about a file in the report
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReportInfo {
    /// Number of lines in the file
    pub lines: usize,
    /// Number of characters in the file
    pub chars: usize,
    /// Number of tokens in the file (if token counting is enabled)
    pub tokens: Option<usize>,
}

/// Statistics for an encode run
#[derive(Debug, Serialize)]
pub struct EncodeReport {
    /// Files written by the run
    pub output_files: Vec<String>,
    /// Time taken to scan and write
    pub duration: Duration,
    /// Number of files processed
    pub files_processed: usize,
    /// Number of directories encoded
    pub directories: usize,
    /// Total number of lines
    pub total_lines: usize,
    /// Total number of characters
    pub total_chars: usize,
    /// Total number of tokens (if token counting is enabled)
    pub total_tokens: Option<usize>,
    /// Details for each file
    pub file_details: HashMap<String, FileReportInfo>,
    /// Files whose content could not be read
    pub issues: Vec<Issue>,
}

/// Statistics for a decode run
#[derive(Debug, Serialize)]
pub struct DecodeReport {
    /// Directory the tree was rebuilt into
    pub output_dir: String,
    /// Time taken to decode
    pub duration: Duration,
    /// Directories materialized from tree text
    pub directories: usize,
    /// Files written from content text
    pub files_written: usize,
    /// Everything the decoders tolerated or skipped
    pub issues: Vec<Issue>,
}

/// Format of the report output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Console table output
    #[default]
    Table,
    /// JSON document
    Json,
}

/// Report generator for run results
pub struct Reporter {
    format: ReportFormat,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    key: String,

    #[tabled(rename = "Value")]
    value: String,
}

impl SummaryRow {
    fn new(key: &str, value: String) -> Self {
        Self {
            key: key.to_string(),
            value,
        }
    }
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate the summary of an encode run
    pub fn encode_summary(&self, report: &EncodeReport) -> Result<String> {
        match self.format {
            ReportFormat::Table => Ok(self.encode_console_report(report)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        }
    }

    /// Generate the summary of a decode run
    pub fn decode_summary(&self, report: &DecodeReport) -> Result<String> {
        match self.format {
            ReportFormat::Table => Ok(self.decode_console_report(report)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        }
    }

    // Keep the last path segments when a path is too long
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let mut segments = Vec::new();
        let mut current_len = 3; // Start with "..."
        for part in path.split('/').rev() {
            let part_len = part.chars().count() + 1; // +1 for '/'
            if current_len + part_len > max_len {
                break;
            }
            segments.push(part);
            current_len += part_len;
        }

        let mut result = String::from("...");
        for part in segments.iter().rev() {
            result.push('/');
            result.push_str(part);
        }
        result
    }

    fn styled(mut table: Table) -> String {
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));
        table.to_string()
    }

    fn issues_table(&self, issues: &[Issue]) -> String {
        #[derive(Tabled)]
        struct IssueRow {
            #[tabled(rename = "Kind")]
            kind: String,

            #[tabled(rename = "Detail")]
            detail: String,
        }

        let rows = issues.iter().map(|issue| IssueRow {
            kind: issue.kind().to_string(),
            detail: issue.to_string(),
        });
        Self::styled(Table::new(rows))
    }

    // Create a files table using the tabled crate
    fn create_files_table(&self, report: &EncodeReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Tokens")]
            tokens: String,
        }

        // Sort files by character count
        let mut files: Vec<_> = report.file_details.iter().collect();
        files.sort_by(|(a_path, a), (b_path, b)| b.chars.cmp(&a.chars).then(a_path.cmp(b_path)));
        files.truncate(if files.len() > 15 { 10 } else { files.len() });

        let rows = files.iter().map(|(path, info)| {
            let tokens = info.tokens.unwrap_or_else(|| estimate_tokens(info.chars));
            FileRow {
                path: self.format_path(path, 60),
                lines: self.format_number(info.lines),
                tokens: self.format_number(tokens),
            }
        });
        Self::styled(Table::new(rows))
    }

    fn encode_console_report(&self, report: &EncodeReport) -> String {
        let mut rows = vec![
            SummaryRow::new("📂 Output Files", report.output_files.join("\n")),
            SummaryRow::new("⏱️ Process Time", format!("{:.4?}", report.duration)),
            SummaryRow::new("📄 Files", self.format_number(report.files_processed)),
            SummaryRow::new("📁 Directories", self.format_number(report.directories)),
            SummaryRow::new("📝 Total Lines", self.format_number(report.total_lines)),
        ];

        // Use actual token count if available, otherwise use estimate
        let token_text = match report.total_tokens {
            Some(tokens) => format!("{} tokens (counted)", self.format_number(tokens)),
            None => format!(
                "{} tokens (estimated)",
                self.format_number(estimate_tokens(report.total_chars))
            ),
        };
        rows.push(SummaryRow::new("📦 LLM Tokens", token_text));

        if !report.issues.is_empty() {
            rows.push(SummaryRow::new(
                "⚠️ Unreadable Files",
                report.issues.len().to_string(),
            ));
        }

        let files_title = if report.file_details.len() > 15 {
            "📋  TOP 10 LARGEST FILES BY CHARACTER COUNT  📋"
        } else {
            "📋  PROCESSED FILES"
        };

        let mut output = format!(
            "{}\n{}\n\n✅  ENCODING COMPLETE\n{}",
            files_title,
            self.create_files_table(report),
            Self::styled(Table::new(rows))
        );
        if !report.issues.is_empty() {
            output.push_str(&format!("\n\n⚠️  ISSUES\n{}", self.issues_table(&report.issues)));
        }
        output
    }

    fn decode_console_report(&self, report: &DecodeReport) -> String {
        let rows = vec![
            SummaryRow::new("📂 Output Directory", report.output_dir.clone()),
            SummaryRow::new("⏱️ Process Time", format!("{:.4?}", report.duration)),
            SummaryRow::new("📁 Directories", self.format_number(report.directories)),
            SummaryRow::new("📄 Files Written", self.format_number(report.files_written)),
            SummaryRow::new("⚠️ Issues", report.issues.len().to_string()),
        ];

        let mut output = format!(
            "✅  RECONSTRUCTION COMPLETE\n{}",
            Self::styled(Table::new(rows))
        );
        if !report.issues.is_empty() {
            output.push_str(&format!("\n\n⚠️  ISSUES\n{}", self.issues_table(&report.issues)));
        }
        output
    }
}
