/*!
 * Markdown report writer for protree
 */

use std::io::{self, Write};

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec::path::to_relative_string;
use crate::codec::tree::{FileListing, TreeEncoder};
use crate::language::Language;
use crate::scanner::ScannerStatistics;
use crate::types::{DirectoryNode, Node};
use crate::utils::{extension_of, EXCLUDED_PLACEHOLDER};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("static regex"));

/// Anchor name for a heading: punctuation dropped, spaces to `_`, lowercase
pub fn anchor_name(text: &str) -> String {
    NON_WORD.replace_all(text, "").replace(' ', "_").to_lowercase()
}

/// Backtick fence long enough not to collide with the body
fn fence_for(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in body.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat(std::cmp::max(3, longest + 1))
}

/// Markdown writer for a scanned project
pub struct MarkdownWriter {
    /// Project name used as the title
    project_name: String,
    /// Whether the generation time is stamped under the title
    timestamp: bool,
}

impl MarkdownWriter {
    /// Create a new Markdown writer
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            timestamp: true,
        }
    }

    /// Leave out the generation time, for reproducible output
    pub fn without_timestamp(mut self) -> Self {
        self.timestamp = false;
        self
    }

    /// Write the report to any sink
    pub fn write<W: Write>(
        &self,
        root: &DirectoryNode,
        stats: &ScannerStatistics,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "# {}\n", self.project_name)?;
        if self.timestamp {
            writeln!(out, "_Generated {}_\n", Local::now().to_rfc3339())?;
        }

        self.write_project_info(stats, out)?;
        self.write_directory_structure(root, out)?;

        writeln!(out, "## File Contents")?;
        self.write_file_contents(root, out)?;
        writeln!(out)?;

        Ok(())
    }

    /// Write the project totals and the file type tally
    fn write_project_info<W: Write>(&self, stats: &ScannerStatistics, out: &mut W) -> io::Result<()> {
        let code_files: usize = stats
            .file_types
            .iter()
            .filter(|(ext, _)| Language::from_extension(ext).is_code())
            .map(|(_, count)| count)
            .sum();

        writeln!(out, "## Project Information\n")?;
        writeln!(out, "- **Total files**: {}", stats.files_processed)?;
        writeln!(out, "- **Total directories**: {}", stats.directories)?;
        writeln!(out, "- **Total code files**: {}", code_files)?;
        writeln!(out, "- **Total lines of code**: {}", stats.total_lines)?;
        if let Some(tokens) = stats.total_tokens {
            writeln!(out, "- **Total tokens**: {}", tokens)?;
        }

        writeln!(out, "\n### File Types and Counts\n")?;
        for (ext, count) in &stats.file_types {
            let label = if ext.is_empty() { "No extension" } else { ext.as_str() };
            writeln!(out, "- `{}`: {}", label, count)?;
        }
        writeln!(out)?;

        Ok(())
    }

    /// Write the tree with file entries linking to their content sections
    fn write_directory_structure<W: Write>(&self, root: &DirectoryNode, out: &mut W) -> io::Result<()> {
        writeln!(out, "## Directory Structure\n")?;
        writeln!(out, "```text")?;
        TreeEncoder::new()
            .with_files(FileListing::MarkdownLinks)
            .write(root, out)?;
        writeln!(out, "```\n")?;
        Ok(())
    }

    fn write_file_contents<W: Write>(&self, dir: &DirectoryNode, out: &mut W) -> io::Result<()> {
        for node in &dir.contents {
            let (path, language, body) = match node {
                Node::Directory(child) => {
                    self.write_file_contents(child, out)?;
                    continue;
                }
                Node::File(file) => (
                    &file.path,
                    Language::from_extension(&extension_of(&file.path)),
                    file.content.as_str(),
                ),
                Node::Binary(bin) => (
                    &bin.path,
                    Language::from_extension(&extension_of(&bin.path)),
                    EXCLUDED_PLACEHOLDER,
                ),
            };

            let relative = to_relative_string(path);
            let fence = fence_for(body);
            writeln!(out, "\n### [{}](#{})", relative, anchor_name(&relative))?;
            writeln!(out, "{}{}", fence, language)?;
            out.write_all(body.as_bytes())?;
            if !body.ends_with('\n') {
                writeln!(out)?;
            }
            writeln!(out, "{}", fence)?;
        }
        Ok(())
    }
}
