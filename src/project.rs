/*!
 * Whole-project encode and decode runs
 */

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;
use log::info;

use crate::codec::{self, ContentEncoder, TreeEncoder};
use crate::config::{DecodeConfig, EncodeConfig};
use crate::error::Result;
use crate::markdown::MarkdownWriter;
use crate::report::{DecodeReport, EncodeReport};
use crate::scanner::Scanner;

/// Write through a buffered file handle that is closed before returning
fn write_artifact<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Scan a project and write its tree text, content text and report
pub fn encode_project(config: &EncodeConfig, progress: Arc<ProgressBar>) -> Result<EncodeReport> {
    let start_time = Instant::now();

    let mut scanner = Scanner::new(config.scan.clone(), progress)?;
    let root = scanner.scan()?;

    write_artifact(&config.tree_file, |out| TreeEncoder::new().write(&root, out))?;
    info!("Wrote tree text to {}", config.tree_file.display());

    write_artifact(&config.contents_file, |out| {
        ContentEncoder::new().write(&root, out)
    })?;
    info!("Wrote content text to {}", config.contents_file.display());

    let mut output_files = vec![
        config.tree_file.display().to_string(),
        config.contents_file.display().to_string(),
    ];

    if let Some(report_file) = &config.report_file {
        let writer = MarkdownWriter::new(config.project_name.clone());
        write_artifact(report_file, |out| {
            writer.write(&root, scanner.statistics(), out)
        })?;
        info!("Wrote report to {}", report_file.display());
        output_files.push(report_file.display().to_string());
    }

    let (statistics, issues) = scanner.finish();
    Ok(EncodeReport {
        output_files,
        duration: start_time.elapsed(),
        files_processed: statistics.files_processed,
        directories: statistics.directories,
        total_lines: statistics.total_lines,
        total_chars: statistics.total_chars,
        total_tokens: statistics.total_tokens,
        file_details: statistics.file_details,
        issues,
    })
}

/// Read the configured text files and rebuild the tree they describe
pub fn decode_files(config: &DecodeConfig) -> Result<DecodeReport> {
    let start_time = Instant::now();

    let tree_text = config
        .tree_file
        .as_ref()
        .map(fs::read_to_string)
        .transpose()?;
    let content_text = config
        .contents_file
        .as_ref()
        .map(fs::read_to_string)
        .transpose()?;

    let outcome = codec::decode_project(
        tree_text.as_deref(),
        content_text.as_deref(),
        &config.output_dir,
    )?;

    Ok(DecodeReport {
        output_dir: config.output_dir.display().to_string(),
        duration: start_time.elapsed(),
        directories: outcome.directories.len(),
        files_written: outcome.files.len(),
        issues: outcome.issues,
    })
}
