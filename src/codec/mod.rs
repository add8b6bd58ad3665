//! Tree text and content text codec
//!
//! The tree text carries directory nesting through box-drawing prefixes,
//! the content text carries file bodies between `<path>` / `</path>` tags.
//! Both decoders are best effort: problems are collected into a
//! [`DecodeOutcome`] instead of aborting the pass.

pub mod content;
pub mod path;
pub mod tree;

pub use content::{parse_blocks, ContentBlock, ContentDecoder, ContentEncoder};
pub use tree::{parse_tree, FileListing, PathStack, TreeDecoder, TreeEncoder};

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Issue, Result};

/// Everything a decode pass produced, including the problems it tolerated
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    /// Directories materialized from tree lines (created or already present)
    pub directories: Vec<PathBuf>,
    /// Files written from content blocks
    pub files: Vec<PathBuf>,
    /// Per-item problems, in encounter order
    pub issues: Vec<Issue>,
}

impl DecodeOutcome {
    /// Record a tolerated problem
    pub fn record(&mut self, issue: Issue) {
        warn!("{}", issue);
        self.issues.push(issue);
    }

    /// Fold another pass into this one
    pub fn merge(&mut self, other: DecodeOutcome) {
        self.directories.extend(other.directories);
        self.files.extend(other.files);
        self.issues.extend(other.issues);
    }

    /// Whether any item was lost rather than merely tolerated
    pub fn has_failures(&self) -> bool {
        self.issues.iter().any(Issue::is_failure)
    }
}

/// Create the output root; the only failure that stops a decode pass
pub(crate) fn ensure_root(root: &Path) -> Result<()> {
    fs::create_dir_all(root)?;
    Ok(())
}

/// Rebuild a project from its tree text and content text
///
/// Directories are materialized first so that empty directories survive,
/// then every content block is written.
pub fn decode_project(
    tree_text: Option<&str>,
    content_text: Option<&str>,
    output_root: &Path,
) -> Result<DecodeOutcome> {
    ensure_root(output_root)?;

    let mut outcome = DecodeOutcome::default();
    if let Some(text) = tree_text {
        outcome.merge(TreeDecoder::new().decode(text, output_root)?);
    }
    if let Some(text) = content_text {
        outcome.merge(ContentDecoder::new().decode(text, output_root)?);
    }
    Ok(outcome)
}
