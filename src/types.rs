/*!
 * Core types and data structures for protree
 */

use std::path::PathBuf;

/// Why a file's bytes were not carried into the content stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryReason {
    /// Extension is on the excluded list (images, executables)
    ExcludedExtension,
    /// Content sniffing found non-text data
    DetectedBinary,
}

/// Content captured for a text file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Raw file text, exactly as read
    Text(String),
    /// Human-readable stand-in for content that could not be captured
    Placeholder(String),
}

impl FileContent {
    /// The text written to the content stream for this file
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Placeholder(message) => message,
        }
    }

    /// Whether the real file text was captured
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// Represents a directory in the file system
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    /// Directory name (single path segment, empty for the scan root)
    pub name: String,
    /// Path relative to the scan root
    pub path: PathBuf,
    /// Directory contents in listing order
    pub contents: Vec<Node>,
}

/// Represents a text file
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File name
    pub name: String,
    /// Path relative to the scan root
    pub path: PathBuf,
    /// Captured content or placeholder
    pub content: FileContent,
}

/// Represents a file whose bytes are not carried
#[derive(Debug, Clone)]
pub struct BinaryNode {
    /// File name
    pub name: String,
    /// Path relative to the scan root
    pub path: PathBuf,
    /// Why the file was classified binary
    pub reason: BinaryReason,
}

/// A generic filesystem node
#[derive(Debug, Clone)]
pub enum Node {
    /// Directory node
    Directory(DirectoryNode),
    /// Text file node
    File(FileNode),
    /// Binary file node
    Binary(BinaryNode),
}

impl Node {
    /// Single path segment naming this node
    pub fn name(&self) -> &str {
        match self {
            Node::Directory(dir) => &dir.name,
            Node::File(file) => &file.name,
            Node::Binary(bin) => &bin.name,
        }
    }
}

/// A directory line recovered from tree text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Number of ancestor directories below the output root
    pub depth: usize,
    /// Directory name, without the trailing `/`
    pub name: String,
    /// 1-based line number in the source text
    pub line: usize,
}
