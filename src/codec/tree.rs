//! Tree text: one line per directory, nesting carried by box-drawing prefixes
//!
//! ```text
//! ├── src/
//! │   ├── codec/
//! │   └── bin/
//! └── tests/
//! ```
//!
//! Every prefix token is four characters wide. Depth is the number of
//! indentation tokens in front of the connector; nothing after the
//! connector is ever inspected for structure.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use super::path::{is_valid_segment, to_relative_string};
use super::{ensure_root, DecodeOutcome};
use crate::error::{Issue, Result};
use crate::markdown::anchor_name;
use crate::types::{DirectoryNode, Node, TreeLine};

/// Connector for an entry with later siblings
pub const BRANCH: &str = "├── ";
/// Connector for the last entry of a directory
pub const LAST_BRANCH: &str = "└── ";
/// Indentation under an ancestor that has later siblings
pub const PIPE: &str = "│   ";
/// Indentation under an ancestor that was the last entry
pub const BLANK: &str = "    ";

// `tree(1)` pads its vertical bar with non-breaking spaces
const INDENT_TOKENS: [&str; 3] = [PIPE, BLANK, "│\u{a0}\u{a0} "];

/// How files appear in encoded tree text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileListing {
    /// Directory lines only
    Omit,
    /// Plain file names
    Names,
    /// Text files as Markdown links to their content section
    MarkdownLinks,
}

/// Encodes a scanned directory tree as tree text
#[derive(Debug, Clone, Copy)]
pub struct TreeEncoder {
    files: FileListing,
}

impl Default for TreeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeEncoder {
    /// Create an encoder that emits directory lines only
    pub fn new() -> Self {
        Self {
            files: FileListing::Omit,
        }
    }

    /// Choose how file entries are listed
    pub fn with_files(mut self, files: FileListing) -> Self {
        self.files = files;
        self
    }

    /// Encode the tree below `root` into a string
    pub fn encode(&self, root: &DirectoryNode) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write(root, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write the tree below `root` to `out`; the root itself is not listed
    pub fn write<W: Write>(&self, root: &DirectoryNode, out: &mut W) -> io::Result<()> {
        let mut prefix = String::new();
        self.write_children(root, &mut prefix, out)
    }

    fn write_children<W: Write>(
        &self,
        dir: &DirectoryNode,
        prefix: &mut String,
        out: &mut W,
    ) -> io::Result<()> {
        let visible: Vec<&Node> = dir
            .contents
            .iter()
            .filter(|node| self.files != FileListing::Omit || matches!(node, Node::Directory(_)))
            .collect();

        for (index, node) in visible.iter().enumerate() {
            let is_last = index + 1 == visible.len();
            let connector = if is_last { LAST_BRANCH } else { BRANCH };

            match node {
                Node::Directory(child) => {
                    writeln!(out, "{}{}{}/", prefix, connector, child.name)?;

                    let saved = prefix.len();
                    prefix.push_str(if is_last { BLANK } else { PIPE });
                    self.write_children(child, prefix, out)?;
                    prefix.truncate(saved);
                }
                Node::File(file) => {
                    let label = match self.files {
                        FileListing::MarkdownLinks => format!(
                            "[{}](#{})",
                            file.name,
                            anchor_name(&to_relative_string(&file.path))
                        ),
                        _ => file.name.clone(),
                    };
                    writeln!(out, "{}{}{}", prefix, connector, label)?;
                }
                Node::Binary(bin) => {
                    let label = match self.files {
                        FileListing::MarkdownLinks => format!("{} (Excluded)", bin.name),
                        _ => bin.name.clone(),
                    };
                    writeln!(out, "{}{}{}", prefix, connector, label)?;
                }
            }
        }

        Ok(())
    }
}

/// Result of looking at one line of tree text
#[derive(Debug, PartialEq, Eq)]
enum ParsedLine {
    /// A directory line
    Directory(TreeLine),
    /// Anything that does not end in `/`
    Skip,
}

/// Split off the leading indentation tokens, returning the depth and the rest
fn split_indent(line: &str) -> (usize, &str) {
    let mut depth = 0;
    let mut rest = line;
    while let Some(stripped) = INDENT_TOKENS.iter().find_map(|token| rest.strip_prefix(token)) {
        depth += 1;
        rest = stripped;
    }
    (depth, rest)
}

fn parse_line(raw: &str, line: usize) -> std::result::Result<ParsedLine, Issue> {
    let trimmed = raw.trim_end();
    let Some(body) = trimmed.strip_suffix('/') else {
        return Ok(ParsedLine::Skip);
    };

    let (depth, rest) = split_indent(body);
    let name = rest
        .strip_prefix(BRANCH)
        .or_else(|| rest.strip_prefix(LAST_BRANCH))
        .ok_or_else(|| Issue::MalformedLine {
            line,
            text: trimmed.to_string(),
        })?;

    if !is_valid_segment(name) {
        return Err(Issue::InvalidName {
            line,
            name: name.to_string(),
        });
    }

    Ok(ParsedLine::Directory(TreeLine {
        depth,
        name: name.to_string(),
        line,
    }))
}

/// Parse tree text into its directory lines without touching the filesystem
pub fn parse_tree(text: &str) -> (Vec<TreeLine>, Vec<Issue>) {
    let mut lines = Vec::new();
    let mut issues = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        match parse_line(raw, index + 1) {
            Ok(ParsedLine::Directory(tree_line)) => lines.push(tree_line),
            Ok(ParsedLine::Skip) => {}
            Err(issue) => issues.push(issue),
        }
    }

    (lines, issues)
}

/// Most recently materialized directory per depth
///
/// Recording depth `d` drops every entry deeper than `d`, so a stale
/// deeper path is never reused as a parent.
#[derive(Debug, Clone)]
pub struct PathStack {
    root: PathBuf,
    entries: Vec<Option<PathBuf>>,
}

impl PathStack {
    /// Create an empty stack rooted at the output directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
        }
    }

    /// The output root every depth-0 directory hangs from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory recorded at `depth`, if any
    pub fn get(&self, depth: usize) -> Option<&Path> {
        self.entries.get(depth)?.as_deref()
    }

    /// Parent for a directory at `depth`
    ///
    /// Errors with the missing ancestor depth when nothing was recorded there.
    pub fn parent(&self, depth: usize) -> std::result::Result<&Path, usize> {
        match depth.checked_sub(1) {
            None => Ok(&self.root),
            Some(above) => self.get(above).ok_or(above),
        }
    }

    /// Record `path` at `depth`, invalidating all deeper entries
    pub fn record(&mut self, depth: usize, path: PathBuf) {
        self.invalidate_from(depth);
        self.entries.resize(depth, None);
        self.entries.push(Some(path));
    }

    /// Forget the entries at `depth` and below it
    pub fn invalidate_from(&mut self, depth: usize) {
        self.entries.truncate(depth);
    }

    /// Number of depths currently tracked
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no directory has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Recreates directories described by tree text
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeDecoder;

impl TreeDecoder {
    /// Create a new tree decoder
    pub fn new() -> Self {
        Self
    }

    /// Materialize every directory line of `text` under `output_root`
    ///
    /// Only a failure to create `output_root` itself is returned as an
    /// error; everything else is recorded in the outcome.
    pub fn decode(&self, text: &str, output_root: &Path) -> Result<DecodeOutcome> {
        ensure_root(output_root)?;

        let mut outcome = DecodeOutcome::default();
        let mut stack = PathStack::new(output_root);

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let tree_line = match parse_line(raw, line) {
                Ok(ParsedLine::Directory(tree_line)) => tree_line,
                Ok(ParsedLine::Skip) => continue,
                Err(issue) => {
                    if let Issue::InvalidName { .. } = issue {
                        // Children of a rejected line must not attach to a stale sibling
                        stack.invalidate_from(split_indent(raw.trim_end()).0);
                    }
                    outcome.record(issue);
                    continue;
                }
            };

            let parent = match stack.parent(tree_line.depth) {
                Ok(parent) => parent.to_path_buf(),
                Err(missing_depth) => {
                    outcome.record(Issue::PathResolution {
                        line,
                        name: tree_line.name.clone(),
                        missing_depth,
                    });
                    stack.root().to_path_buf()
                }
            };

            let dir_path = parent.join(&tree_line.name);
            match fs::create_dir_all(&dir_path) {
                Ok(()) => {
                    debug!("Directory ready: {}", dir_path.display());
                    outcome.directories.push(dir_path.clone());
                }
                Err(source) => outcome.record(Issue::Write {
                    path: dir_path.clone(),
                    source,
                }),
            }
            stack.record(tree_line.depth, dir_path);
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use tempfile::tempdir;

    use crate::types::{BinaryNode, BinaryReason, FileContent, FileNode};

    fn dir(name: &str, path: &str, contents: Vec<Node>) -> Node {
        Node::Directory(DirectoryNode {
            name: name.to_string(),
            path: PathBuf::from(path),
            contents,
        })
    }

    fn file(name: &str, path: &str) -> Node {
        Node::File(FileNode {
            name: name.to_string(),
            path: PathBuf::from(path),
            content: FileContent::Text(String::new()),
        })
    }

    fn sample_root() -> DirectoryNode {
        DirectoryNode {
            name: String::new(),
            path: PathBuf::new(),
            contents: vec![
                file("README.md", "README.md"),
                dir(
                    "src",
                    "src",
                    vec![
                        dir("codec", "src/codec", vec![file("tree.rs", "src/codec/tree.rs")]),
                        dir("util", "src/util", vec![]),
                        file("lib.rs", "src/lib.rs"),
                    ],
                ),
                dir("tests", "tests", vec![]),
                Node::Binary(BinaryNode {
                    name: "logo.png".to_string(),
                    path: PathBuf::from("logo.png"),
                    reason: BinaryReason::ExcludedExtension,
                }),
            ],
        }
    }

    #[test]
    fn test_encode_directories_only() {
        let text = TreeEncoder::new().encode(&sample_root()).unwrap();
        assert_eq!(
            text,
            "├── src/\n│   ├── codec/\n│   └── util/\n└── tests/\n"
        );
    }

    #[test]
    fn test_encode_last_child_uses_blank_indent() {
        let root = DirectoryNode {
            name: String::new(),
            path: PathBuf::new(),
            contents: vec![dir("a", "a", vec![dir("b", "a/b", vec![dir("c", "a/b/c", vec![])])])],
        };
        let text = TreeEncoder::new().encode(&root).unwrap();
        assert_eq!(text, "└── a/\n    └── b/\n        └── c/\n");
    }

    #[test]
    fn test_encode_with_markdown_links() {
        let text = TreeEncoder::new()
            .with_files(FileListing::MarkdownLinks)
            .encode(&sample_root()).unwrap();
        assert!(text.starts_with("├── [README.md](#readmemd)\n├── src/\n"));
        assert!(text.contains("│   ├── codec/\n│   │   └── [tree.rs](#srccodectreers)\n"));
        assert!(text.ends_with("└── logo.png (Excluded)\n"));
    }

    #[test]
    fn test_parse_depth_from_leading_tokens() {
        let (lines, issues) = parse_tree("├── src/\n│   ├── util/\n│       └── deep/\n");
        assert!(issues.is_empty());
        let depths: Vec<_> = lines.iter().map(|l| (l.depth, l.name.as_str())).collect();
        assert_eq!(depths, vec![(0, "src"), (1, "util"), (2, "deep")]);
    }

    #[test]
    fn test_parse_name_containing_pipe_token() {
        let (lines, issues) = parse_tree("├── src/\n│   └── a│   b/\n");
        assert!(issues.is_empty());
        assert_eq!(lines[1].depth, 1);
        assert_eq!(lines[1].name, "a│   b");
    }

    #[test]
    fn test_parse_skips_files_and_flags_bad_lines() {
        let text = "├── [main.rs](#mainrs)\n├── notes.txt\nproject/\n├── ../\n└── ok/   \n";
        let (lines, issues) = parse_tree(text);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "ok");
        assert_eq!(lines[0].line, 5);
        assert!(matches!(issues[0], Issue::MalformedLine { line: 3, .. }));
        assert!(matches!(issues[1], Issue::InvalidName { line: 4, .. }));
    }

    #[test]
    fn test_path_stack_evicts_deeper_entries() {
        let mut stack = PathStack::new("out");
        stack.record(0, PathBuf::from("out/a"));
        stack.record(1, PathBuf::from("out/a/b"));
        stack.record(2, PathBuf::from("out/a/b/c"));
        stack.record(0, PathBuf::from("out/d"));

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.parent(1), Ok(Path::new("out/d")));
        assert_eq!(stack.parent(2), Err(1));
        assert_eq!(stack.parent(0), Ok(Path::new("out")));
    }

    #[test]
    fn test_path_stack_records_across_gap() {
        let mut stack = PathStack::new("out");
        stack.record(2, PathBuf::from("out/x"));
        assert_eq!(stack.get(0), None);
        assert_eq!(stack.get(2), Some(Path::new("out/x")));
        assert_eq!(stack.parent(3), Ok(Path::new("out/x")));
    }

    #[test]
    fn test_decode_nests_under_parent() {
        let temp = tempdir().unwrap();
        let output = temp.path().join("output");

        let outcome = TreeDecoder::new()
            .decode("├── src/\n│   ├── util/\n", &output)
            .unwrap();

        assert!(outcome.issues.is_empty());
        assert_eq!(
            outcome.directories,
            vec![output.join("src"), output.join("src").join("util")]
        );
        assert!(output.join("src").join("util").is_dir());
        assert!(!output.join("util").exists());
    }

    #[test]
    fn test_decode_uncle_transition() {
        let temp = tempdir().unwrap();
        let text = "├── a/\n│   └── b/\n│       └── c/\n└── d/\n    └── e/\n";

        TreeDecoder::new().decode(text, temp.path()).unwrap();

        assert!(temp.path().join("a/b/c").is_dir());
        assert!(temp.path().join("d/e").is_dir());
        assert!(!temp.path().join("a/b/c/e").exists());
    }

    #[test]
    fn test_decode_missing_ancestor_defaults_to_root() {
        let temp = tempdir().unwrap();
        let outcome = TreeDecoder::new()
            .decode("│   │   └── orphan/\n", temp.path())
            .unwrap();

        assert!(temp.path().join("orphan").is_dir());
        assert!(matches!(
            outcome.issues.as_slice(),
            [Issue::PathResolution { missing_depth: 1, .. }]
        ));
        assert!(!outcome.has_failures());
    }

    #[test]
    fn test_decode_children_of_invalid_line_do_not_reuse_sibling() {
        let temp = tempdir().unwrap();
        let text = "├── good/\n├── ../\n│   └── child/\n";
        let outcome = TreeDecoder::new().decode(text, temp.path()).unwrap();

        assert!(!temp.path().join("good").join("child").exists());
        assert!(temp.path().join("child").is_dir());
        assert_eq!(outcome.issues.len(), 2);
    }

    #[test]
    fn test_decode_is_idempotent() {
        let temp = tempdir().unwrap();
        let text = TreeEncoder::new().encode(&sample_root()).unwrap();

        let first = TreeDecoder::new().decode(&text, temp.path()).unwrap();
        let second = TreeDecoder::new().decode(&text, temp.path()).unwrap();

        assert!(first.issues.is_empty());
        assert!(second.issues.is_empty());
        assert_eq!(first.directories, second.directories);
    }

    #[test]
    fn test_round_trip_directory_set() {
        let temp = tempdir().unwrap();
        let root = sample_root();
        let text = TreeEncoder::new().with_files(FileListing::Names).encode(&root).unwrap();

        let outcome = TreeDecoder::new().decode(&text, temp.path()).unwrap();

        let decoded: BTreeSet<String> = outcome
            .directories
            .iter()
            .map(|p| to_relative_string(p.strip_prefix(temp.path()).unwrap()))
            .collect();
        let expected: BTreeSet<String> = ["src", "src/codec", "src/util", "tests"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(decoded, expected);
    }
}
