/*!
 * protree - serialize a project tree into text and rebuild it
 *
 * Encoding produces a tree text listing the directories with box-drawing
 * prefixes, a content text holding every file between `<path>` and
 * `</path>` tags, and a Markdown report. Decoding reads the two text files
 * back into a directory tree.
 */

pub mod codec;
pub mod config;
pub mod error;
pub mod language;
pub mod markdown;
pub mod project;
pub mod report;
pub mod scanner;
pub mod tokens;
pub mod types;
pub mod utils;


// Re-export main components for easier access
pub use codec::{
    decode_project, ContentBlock, ContentDecoder, ContentEncoder, DecodeOutcome, PathStack,
    TreeDecoder, TreeEncoder,
};
pub use config::{DecodeConfig, EncodeConfig, ScanConfig};
pub use error::{Issue, ProtreeError, Result};
pub use markdown::MarkdownWriter;
pub use report::{DecodeReport, EncodeReport, ReportFormat, Reporter};
pub use scanner::Scanner;
pub use types::{BinaryNode, DirectoryNode, FileContent, FileNode, Node, TreeLine};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
