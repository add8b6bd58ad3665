/*!
 * Directory and file scanning functionality
 */

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob_match::glob_match;
use ignore::WalkBuilder;
use indicatif::ProgressBar;
use log::{debug, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::codec::path::to_relative_string;
use crate::config::ScanConfig;
use crate::error::{Issue, Result};
use crate::report::FileReportInfo;
use crate::tokens::TokenCounter;
use crate::types::{BinaryNode, BinaryReason, DirectoryNode, FileContent, FileNode, Node};
use crate::utils::{
    count_lines, extension_of, format_file_size, is_excluded_extension, DEFAULT_IGNORE,
};

/// Scanner statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScannerStatistics {
    /// Number of files processed
    pub files_processed: usize,
    /// Number of directories below the root
    pub directories: usize,
    /// Total number of lines
    pub total_lines: usize,
    /// Total number of characters
    pub total_chars: usize,
    /// Total number of tokens (if token counting is enabled)
    pub total_tokens: Option<usize>,
    /// Extension to file count, "" for files without one
    pub file_types: BTreeMap<String, usize>,
    /// Details for each file
    pub file_details: HashMap<String, FileReportInfo>,
}

/// Kind of a directory entry as far as the scanner cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
    Symlink,
}

/// Scanner for directory contents
pub struct Scanner {
    /// Scanner configuration
    config: ScanConfig,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
    /// Scanner statistics
    statistics: ScannerStatistics,
    /// Files that could not be read
    issues: Vec<Issue>,
    /// Token counter, when enabled
    tokenizer: Option<TokenCounter>,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(config: ScanConfig, progress: Arc<ProgressBar>) -> Result<Self> {
        let tokenizer = if config.count_tokens {
            Some(TokenCounter::new()?)
        } else {
            None
        };

        let statistics = ScannerStatistics {
            total_tokens: tokenizer.as_ref().map(|_| 0),
            ..ScannerStatistics::default()
        };

        Ok(Self {
            config,
            progress,
            statistics,
            issues: Vec::new(),
            tokenizer,
        })
    }

    /// Get scanner statistics
    pub fn statistics(&self) -> &ScannerStatistics {
        &self.statistics
    }

    /// Files that could not be read, in traversal order
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Consume the scanner, keeping its statistics and issues
    pub fn finish(self) -> (ScannerStatistics, Vec<Issue>) {
        (self.statistics, self.issues)
    }

    /// Scan the target directory and return the directory tree
    pub fn scan(&mut self) -> Result<DirectoryNode> {
        let abs_path = fs::canonicalize(&self.config.target_dir)?;
        crate::ensure!(
            abs_path.is_dir(),
            Scanner,
            "Not a directory: {}",
            abs_path.display()
        );

        let mut root = self.scan_directory(&abs_path, Path::new(""))?;
        root.name = abs_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(root)
    }

    /// List a directory's entries sorted by name, applying ignore rules
    fn list_entries(&self, abs_path: &Path) -> io::Result<Vec<(PathBuf, EntryKind)>> {
        let mut entries = Vec::new();

        if self.config.respect_gitignore {
            // Use ignore crate's Walk to handle .gitignore patterns
            let mut walker = WalkBuilder::new(abs_path);
            walker
                .max_depth(Some(1))
                .hidden(false)
                .require_git(false)
                .sort_by_file_name(|a, b| a.cmp(b));

            // Use custom gitignore file if specified
            if let Some(gitignore_path) = &self.config.gitignore_path {
                walker.add_custom_ignore_filename(gitignore_path);
            }

            for result in walker.build() {
                let entry = match result {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping entry in {}: {}", abs_path.display(), e);
                        continue;
                    }
                };
                if entry.path() == abs_path {
                    continue;
                }
                let kind = match entry.file_type() {
                    Some(ft) if ft.is_symlink() => EntryKind::Symlink,
                    Some(ft) if ft.is_dir() => EntryKind::Directory,
                    _ => EntryKind::File,
                };
                entries.push((entry.into_path(), kind));
            }
        } else {
            // Use walkdir when not respecting .gitignore
            let walker = WalkDir::new(abs_path)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name();

            for result in walker {
                let entry = match result {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping entry in {}: {}", abs_path.display(), e);
                        continue;
                    }
                };
                let ft = entry.file_type();
                let kind = if ft.is_symlink() {
                    EntryKind::Symlink
                } else if ft.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                entries.push((entry.into_path(), kind));
            }
        }

        Ok(entries
            .into_iter()
            .filter(|(path, _)| !self.should_ignore(path))
            .filter(|(path, kind)| *kind != EntryKind::File || self.should_include(path))
            .collect())
    }

    /// Scan a directory and return its node representation
    fn scan_directory(&mut self, abs_path: &Path, rel_path: &Path) -> Result<DirectoryNode> {
        let mut contents = Vec::new();

        for (entry_path, kind) in self.list_entries(abs_path)? {
            let entry_name = entry_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let new_rel_path = rel_path.join(&entry_name);

            match kind {
                EntryKind::Symlink => {
                    debug!("Skipping symlink {}", entry_path.display());
                }
                EntryKind::Directory => match self.scan_directory(&entry_path, &new_rel_path) {
                    Ok(dir_node) => {
                        self.statistics.directories += 1;
                        contents.push(Node::Directory(dir_node));
                    }
                    Err(e) => {
                        warn!("Error processing directory {}: {}", entry_path.display(), e);
                        self.issues.push(Issue::Read {
                            path: new_rel_path,
                            source: io::Error::new(io::ErrorKind::Other, e.to_string()),
                        });
                    }
                },
                EntryKind::File => {
                    contents.push(self.process_file(&entry_path, &new_rel_path));
                }
            }
        }

        Ok(DirectoryNode {
            name: abs_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            path: rel_path.to_path_buf(),
            contents,
        })
    }

    /// Process a single file and return its node representation
    fn process_file(&mut self, abs_path: &Path, rel_path: &Path) -> Node {
        self.progress.inc(1);

        let file_name = abs_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        // Truncate if too long to avoid display issues
        let display_name = if file_name.chars().count() > 40 {
            let tail: String = file_name.chars().rev().take(37).collect();
            format!("...{}", tail.chars().rev().collect::<String>())
        } else {
            file_name.clone()
        };
        self.progress
            .set_message(format!("Current file: {}", display_name));

        let ext = extension_of(abs_path);
        *self.statistics.file_types.entry(ext.clone()).or_insert(0) += 1;
        self.statistics.files_processed += 1;
        let report_key = to_relative_string(rel_path);

        let binary = |reason| {
            Node::Binary(BinaryNode {
                name: file_name.clone(),
                path: rel_path.to_path_buf(),
                reason,
            })
        };

        if is_excluded_extension(&ext) {
            self.statistics
                .file_details
                .insert(report_key, FileReportInfo::default());
            return binary(BinaryReason::ExcludedExtension);
        }

        let content = match self.is_text_file(abs_path) {
            Ok(false) => {
                self.statistics
                    .file_details
                    .insert(report_key, FileReportInfo::default());
                return binary(BinaryReason::DetectedBinary);
            }
            Ok(true) => self.read_file_content(abs_path, &report_key),
            Err(e) => self.unreadable(abs_path, rel_path, e),
        };

        Node::File(FileNode {
            name: file_name,
            path: rel_path.to_path_buf(),
            content,
        })
    }

    /// Check if a file should be ignored based on patterns and defaults
    pub fn should_ignore(&self, path: &Path) -> bool {
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();

        // Check custom ignore patterns
        for pattern in &self.config.ignore_patterns {
            if glob_match(pattern, &file_name) {
                return true;
            }
        }

        // Check default ignore patterns
        if self.config.use_default_ignores && DEFAULT_IGNORE.iter().any(|&p| p == file_name) {
            return true;
        }

        // Don't process the run's own output files
        self.config.skip_paths.iter().any(|skip| skip == path)
    }

    /// Check if a file should be included based on patterns
    pub fn should_include(&self, path: &Path) -> bool {
        // If no include patterns, include everything
        if self.config.include_patterns.is_empty() {
            return true;
        }

        let file_name = path.file_name().unwrap_or_default().to_string_lossy();

        self.config
            .include_patterns
            .iter()
            .any(|pattern| glob_match(pattern, &file_name))
    }

    /// Sniff the start of a file to decide whether it is text
    fn is_text_file(&self, path: &Path) -> io::Result<bool> {
        let metadata = fs::metadata(path)?;
        if metadata.len() == 0 {
            return Ok(true);
        }

        // Read a sample of the file to determine type
        let mut buffer = vec![0; std::cmp::min(8192, metadata.len() as usize)];
        let mut file = File::open(path)?;
        let bytes_read = file.read(&mut buffer)?;
        buffer.truncate(bytes_read);

        // A multi-byte character may be cut at the end of the sample
        let valid = match std::str::from_utf8(&buffer) {
            Ok(_) => true,
            Err(e) => e.error_len().is_none(),
        };
        if !valid {
            return Ok(false);
        }

        // Count binary characters (0x00-0x08, 0x0E-0x1F)
        let binary_count = buffer
            .iter()
            .filter(|&&b| (b < 9) || (b > 13 && b < 32 && b != 27))
            .count();
        let binary_ratio = binary_count as f32 / buffer.len().max(1) as f32;

        Ok(binary_ratio < 0.1)
    }

    /// Read the content of a text file and update statistics
    fn read_file_content(&mut self, path: &Path, report_key: &str) -> FileContent {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => return self.unreadable(path, Path::new(report_key), e),
        };

        if metadata.len() > self.config.max_file_size {
            self.statistics
                .file_details
                .insert(report_key.to_string(), FileReportInfo::default());
            return FileContent::Placeholder(format!(
                "File too large to include content. Size: {}",
                format_file_size(metadata.len())
            ));
        }

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => return self.unreadable(path, Path::new(report_key), e),
        };

        let lines = count_lines(&text);
        let chars = text.chars().count();
        let tokens = self.tokenizer.as_ref().map(|counter| counter.count(&text));

        self.statistics.total_lines += lines;
        self.statistics.total_chars += chars;
        if let (Some(total), Some(count)) = (self.statistics.total_tokens.as_mut(), tokens) {
            *total += count;
        }
        self.statistics.file_details.insert(
            report_key.to_string(),
            FileReportInfo {
                lines,
                chars,
                tokens,
            },
        );

        FileContent::Text(text)
    }

    /// Record an unreadable file and return its placeholder
    fn unreadable(&mut self, abs_path: &Path, rel_path: &Path, error: io::Error) -> FileContent {
        let message = format!("Error reading file {}: {}", abs_path.display(), error);
        warn!("{}", message);
        self.statistics
            .file_details
            .insert(to_relative_string(rel_path), FileReportInfo::default());
        self.issues.push(Issue::Read {
            path: rel_path.to_path_buf(),
            source: error,
        });
        FileContent::Placeholder(message)
    }
}
