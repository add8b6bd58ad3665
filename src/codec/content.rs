//! Content text: file bodies between `<path>` and `</path>` tag lines
//!
//! ```text
//! <a.txt>
//! hello
//! </a.txt>
//! ```
//!
//! There is no escaping and no length prefix. A block ends at the first
//! line that is exactly its own closing tag; every other line, including
//! tag-looking lines for other paths, is body text. A block counts as
//! closable when such a line follows it before the next opening tag for
//! the same path. Two fallbacks apply only to blocks that are not closable:
//!
//! - an opening tag starts a new block and the old one is reported as
//!   unterminated;
//! - a body without a trailing newline carries its closing tag glued to the
//!   last line (`text</a.txt>`), accepted when the next line is an opening
//!   tag or the input ends there.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::debug;

use super::path::{resolve_relative, to_relative_string};
use super::{ensure_root, DecodeOutcome};
use crate::error::{Issue, Result};
use crate::types::{DirectoryNode, Node};
use crate::utils::EXCLUDED_PLACEHOLDER;

/// One file's worth of content text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    /// `/`-separated path relative to the output root
    pub path: String,
    /// Body text, byte for byte
    pub body: String,
    /// 1-based line number of the opening tag
    pub line: usize,
}

impl ContentBlock {
    fn open(path: &str, line: usize) -> Self {
        Self {
            path: path.to_string(),
            body: String::new(),
            line,
        }
    }

    fn closing_tag(&self) -> String {
        format!("</{}>", self.path)
    }
}

/// Encodes file bodies as tagged content text
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentEncoder;

impl ContentEncoder {
    /// Create a new content encoder
    pub fn new() -> Self {
        Self
    }

    /// Encode every file below `root` into a string
    pub fn encode(&self, root: &DirectoryNode) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write(root, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write one block per file, depth first, in listing order
    pub fn write<W: Write>(&self, root: &DirectoryNode, out: &mut W) -> io::Result<()> {
        for node in &root.contents {
            match node {
                Node::Directory(dir) => self.write(dir, out)?,
                Node::File(file) => {
                    let body = if file.content.is_text() {
                        file.content.as_str().to_string()
                    } else {
                        format!("{}\n", file.content.as_str())
                    };
                    write_block(out, &to_relative_string(&file.path), &body)?;
                }
                Node::Binary(bin) => {
                    let body = format!("{}\n", EXCLUDED_PLACEHOLDER);
                    write_block(out, &to_relative_string(&bin.path), &body)?;
                }
            }
        }
        Ok(())
    }

    /// Encode `(path, body)` pairs directly
    pub fn encode_blocks<'a, I>(&self, blocks: I) -> io::Result<String>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut buffer = Vec::new();
        for (path, body) in blocks {
            write_block(&mut buffer, path, body)?;
        }
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Write a single block
pub fn write_block<W: Write>(out: &mut W, path: &str, body: &str) -> io::Result<()> {
    writeln!(out, "<{}>", path)?;
    // A body without a final newline leaves the close glued to its last line
    out.write_all(body.as_bytes())?;
    writeln!(out, "</{}>", path)
}

/// Split a line into its text and whether it had a terminator
fn split_terminator(line: &str) -> (&str, bool) {
    match line.strip_suffix('\n') {
        Some(text) => (text.strip_suffix('\r').unwrap_or(text), true),
        None => (line, false),
    }
}

/// Path named by an opening tag line
fn opening_tag(text: &str, terminated: bool) -> Option<&str> {
    if !terminated || text.starts_with("</") {
        return None;
    }
    text.strip_prefix('<')?
        .strip_suffix('>')
        .filter(|path| !path.is_empty())
}

/// Path named by a line that is exactly a closing tag
fn closing_tag(text: &str) -> Option<&str> {
    text.strip_prefix("</")?
        .strip_suffix('>')
        .filter(|path| !path.is_empty())
}

/// Whether a line looks like a tag at all
fn is_tag_like(text: &str) -> bool {
    text.starts_with('<') && text.ends_with('>')
}

/// For every opening tag line, whether an exact closing tag for its path
/// follows before the next opening tag for that path
fn closable_opens(lines: &[&str]) -> Vec<bool> {
    let mut closable = vec![false; lines.len()];
    // Next event per path when scanning backwards: true for a close
    let mut next_is_close: HashMap<&str, bool> = HashMap::new();

    for (index, line) in lines.iter().enumerate().rev() {
        let (text, terminated) = split_terminator(line);
        if let Some(path) = closing_tag(text) {
            next_is_close.insert(path, true);
        } else if let Some(path) = opening_tag(text, terminated) {
            closable[index] = next_is_close.get(path).copied().unwrap_or(false);
            next_is_close.insert(path, false);
        }
    }

    closable
}

/// Parse content text into blocks without touching the filesystem
pub fn parse_blocks(text: &str) -> (Vec<ContentBlock>, Vec<Issue>) {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let closable = closable_opens(&lines);
    let opens_next = |index: usize| {
        lines.get(index + 1).map_or(true, |next| {
            let (text, terminated) = split_terminator(next);
            opening_tag(text, terminated).is_some()
        })
    };

    let mut blocks = Vec::new();
    let mut issues = Vec::new();
    // Open block and whether its exact close is still ahead
    let mut current: Option<(ContentBlock, bool)> = None;

    for (index, line) in lines.iter().enumerate() {
        let (text, terminated) = split_terminator(line);

        current = match current.take() {
            None => match opening_tag(text, terminated) {
                Some(path) => Some((ContentBlock::open(path, index + 1), closable[index])),
                None => {
                    if is_tag_like(text) {
                        issues.push(Issue::MalformedTag {
                            line: index + 1,
                            tag: text.to_string(),
                        });
                    }
                    None
                }
            },
            Some((mut block, will_close)) => {
                let close = block.closing_tag();
                if text == close {
                    blocks.push(block);
                    None
                } else if will_close {
                    block.body.push_str(line);
                    Some((block, will_close))
                } else if let Some(prefix) = text
                    .strip_suffix(close.as_str())
                    .filter(|_| opens_next(index))
                {
                    block.body.push_str(prefix);
                    blocks.push(block);
                    None
                } else if let Some(path) = opening_tag(text, terminated) {
                    issues.push(Issue::UnterminatedBlock {
                        line: index + 1,
                        path: block.path.clone(),
                    });
                    blocks.push(block);
                    Some((ContentBlock::open(path, index + 1), closable[index]))
                } else {
                    block.body.push_str(line);
                    Some((block, will_close))
                }
            }
        };
    }

    if let Some((block, _)) = current {
        debug!("Block '{}' runs to the end of input", block.path);
        blocks.push(block);
    }

    (blocks, issues)
}

/// Writes the files described by content text
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentDecoder;

impl ContentDecoder {
    /// Create a new content decoder
    pub fn new() -> Self {
        Self
    }

    /// Write every block of `text` under `output_root`
    ///
    /// Only a failure to create `output_root` itself is returned as an
    /// error; per-file failures are recorded and the pass continues.
    pub fn decode(&self, text: &str, output_root: &Path) -> Result<DecodeOutcome> {
        ensure_root(output_root)?;

        let (blocks, issues) = parse_blocks(text);
        let mut outcome = DecodeOutcome::default();
        for issue in issues {
            outcome.record(issue);
        }

        for block in blocks {
            let Some(file_path) = resolve_relative(output_root, &block.path) else {
                outcome.record(Issue::UnsafePath(block.path));
                continue;
            };

            if let Some(parent) = file_path.parent() {
                if let Err(source) = fs::create_dir_all(parent) {
                    outcome.record(Issue::Write {
                        path: parent.to_path_buf(),
                        source,
                    });
                    continue;
                }
            }

            match fs::write(&file_path, block.body.as_bytes()) {
                Ok(()) => {
                    debug!("Wrote {} ({} bytes)", file_path.display(), block.body.len());
                    outcome.files.push(file_path);
                }
                Err(source) => outcome.record(Issue::Write {
                    path: file_path,
                    source,
                }),
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use tempfile::tempdir;

    use crate::types::{BinaryNode, BinaryReason, FileContent, FileNode};

    fn decode_map(text: &str) -> HashMap<String, String> {
        parse_blocks(text)
            .0
            .into_iter()
            .map(|block| (block.path, block.body))
            .collect()
    }

    fn round_trip(body: &str) -> String {
        let text = ContentEncoder::new().encode_blocks([("a/b.txt", body)])
            .unwrap();
        decode_map(&text).remove("a/b.txt").unwrap()
    }

    #[test]
    fn test_two_blocks() {
        let blocks = decode_map("<a.txt>\nhello\n</a.txt>\n<b/c.txt>\nworld\n</b/c.txt>\n");
        assert_eq!(blocks["a.txt"], "hello\n");
        assert_eq!(blocks["b/c.txt"], "world\n");
    }

    #[test]
    fn test_body_fidelity() {
        for body in [
            "plain\n",
            "has\n\nblank line\n",
            "no trailing newline",
            "</foo>\nunrelated close\n",
            "ends with own tag</a/b.txt>",
            "</a/b.txt>x",
            "\n",
            "",
            "crlf\r\nlines\r\n",
        ] {
            assert_eq!(round_trip(body), body, "body {:?}", body);
        }
    }

    #[test]
    fn test_body_fidelity_across_blocks() {
        let files = [
            ("a.txt", "x"),
            ("b.md", "close tag example: </a.txt>\n"),
            ("c.txt", "<a.txt>\nx</a.txt>\n"),
            ("d.txt", "tail without newline"),
            ("e/f.txt", "</d.txt> inline\n<b.md>\nend\n"),
        ];
        let text = ContentEncoder::new().encode_blocks(files).unwrap();

        let (blocks, issues) = parse_blocks(&text);
        assert!(issues.is_empty(), "{:?}", issues);
        let decoded: Vec<(&str, &str)> = blocks
            .iter()
            .map(|block| (block.path.as_str(), block.body.as_str()))
            .collect();
        assert_eq!(decoded, files);
    }

    #[test]
    fn test_glued_close_needs_block_boundary() {
        let (blocks, issues) = parse_blocks("<a.txt>\nx</a.txt>\nmore\n");
        assert!(issues.is_empty());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "x</a.txt>\nmore\n");
    }

    #[test]
    fn test_no_trailing_newline_is_glued() {
        let text = ContentEncoder::new().encode_blocks([("x.txt", "abc")]).unwrap();
        assert_eq!(text, "<x.txt>\nabc</x.txt>\n");
    }

    #[test]
    fn test_foreign_tag_is_captured() {
        let text = "<a.txt>\nbefore\n<other/path.txt>\nafter\n</a.txt>\n";
        let (blocks, issues) = parse_blocks(text);
        assert!(issues.is_empty());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "before\n<other/path.txt>\nafter\n");
    }

    #[test]
    fn test_nested_stream_is_captured() {
        let inner = "<inner.txt>\nx\n</inner.txt>\n";
        let text = ContentEncoder::new()
            .encode_blocks([("dump.txt", inner), ("next.txt", "y\n")])
            .unwrap();
        let blocks = decode_map(&text);
        assert_eq!(blocks["dump.txt"], inner);
        assert_eq!(blocks["next.txt"], "y\n");
        assert!(!blocks.contains_key("inner.txt"));
    }

    #[test]
    fn test_unterminated_block_recovery() {
        let text = "<p.txt>\nfirst\nsecond\n<q.txt>\nquux\n</q.txt>\n";
        let (blocks, issues) = parse_blocks(text);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].path, "p.txt");
        assert_eq!(blocks[0].body, "first\nsecond\n");
        assert_eq!(blocks[1].path, "q.txt");
        assert_eq!(blocks[1].body, "quux\n");
        assert!(matches!(
            issues.as_slice(),
            [Issue::UnterminatedBlock { line: 4, .. }]
        ));
    }

    #[test]
    fn test_unterminated_block_before_repeated_path() {
        let text = "<p.txt>\n1\n<q.txt>\n2\n</q.txt>\n<p.txt>\n3\n</p.txt>\n";
        let (blocks, issues) = parse_blocks(text);

        let decoded: Vec<(&str, &str)> = blocks
            .iter()
            .map(|block| (block.path.as_str(), block.body.as_str()))
            .collect();
        assert_eq!(decoded, [("p.txt", "1\n"), ("q.txt", "2\n"), ("p.txt", "3\n")]);
        assert!(matches!(
            issues.as_slice(),
            [Issue::UnterminatedBlock { line: 3, .. }]
        ));
    }

    #[test]
    fn test_encode_tree() {
        let root = DirectoryNode {
            name: "root".to_string(),
            path: PathBuf::new(),
            contents: vec![
                Node::File(FileNode {
                    name: "a.txt".to_string(),
                    path: PathBuf::from("a.txt"),
                    content: FileContent::Text("x".to_string()),
                }),
                Node::Directory(DirectoryNode {
                    name: "img".to_string(),
                    path: PathBuf::from("img"),
                    contents: vec![Node::Binary(BinaryNode {
                        name: "logo.png".to_string(),
                        path: PathBuf::from("img/logo.png"),
                        reason: BinaryReason::ExcludedExtension,
                    })],
                }),
            ],
        };

        let text = ContentEncoder::new().encode(&root).unwrap();
        assert_eq!(
            text,
            "<a.txt>\nx</a.txt>\n<img/logo.png>\nExcluded file type (binary/image)\n</img/logo.png>\n"
        );
    }

    #[test]
    fn test_mismatched_close_is_body() {
        let text = "<a.txt>\n</b.txt>\nrest\n</a.txt>\n";
        let blocks = decode_map(text);
        assert_eq!(blocks["a.txt"], "</b.txt>\nrest\n");
    }

    #[test]
    fn test_last_block_runs_to_end() {
        let (blocks, issues) = parse_blocks("<a.txt>\nline one\nline two");
        assert!(issues.is_empty());
        assert_eq!(blocks[0].body, "line one\nline two");
    }

    #[test]
    fn test_idle_close_and_preamble() {
        let text = "preamble text\n</stray.txt>\n<>\n<a.txt>\nok\n</a.txt>\n";
        let (blocks, issues) = parse_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].line, 4);
        assert_eq!(issues.len(), 2);
        assert!(issues
            .iter()
            .all(|issue| matches!(issue, Issue::MalformedTag { .. })));
    }

    #[test]
    fn test_decode_writes_files() {
        let temp = tempdir().unwrap();
        let text = "<a.txt>\nhello\n</a.txt>\n<b/c.txt>\nworld\n</b/c.txt>\n";

        let outcome = ContentDecoder::new().decode(text, temp.path()).unwrap();

        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.files.len(), 2);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "hello\n");
        assert_eq!(
            fs::read_to_string(temp.path().join("b").join("c.txt")).unwrap(),
            "world\n"
        );
    }

    #[test]
    fn test_decode_rejects_escaping_paths_and_continues() {
        let temp = tempdir().unwrap();
        let output = temp.path().join("out");
        let text = "<../evil.txt>\nx\n</../evil.txt>\n<good.txt>\ny\n</good.txt>\n";

        let outcome = ContentDecoder::new().decode(text, &output).unwrap();

        assert!(!temp.path().join("evil.txt").exists());
        assert_eq!(fs::read_to_string(output.join("good.txt")).unwrap(), "y\n");
        assert!(matches!(outcome.issues.as_slice(), [Issue::UnsafePath(_)]));
        assert!(outcome.has_failures());
    }

    #[test]
    fn test_decode_write_failure_does_not_stop_pass() {
        let temp = tempdir().unwrap();
        // A file where a directory is needed makes the first write fail
        fs::write(temp.path().join("blocker"), "x").unwrap();
        let text = "<blocker/a.txt>\n1\n</blocker/a.txt>\n<b.txt>\n2\n</b.txt>\n";

        let outcome = ContentDecoder::new().decode(text, temp.path()).unwrap();

        assert!(matches!(outcome.issues.as_slice(), [Issue::Write { .. }]));
        assert_eq!(fs::read_to_string(temp.path().join("b.txt")).unwrap(), "2\n");
    }

    #[test]
    fn test_repeated_path_overwrites() {
        let temp = tempdir().unwrap();
        let text = "<a.txt>\nold\n</a.txt>\n<a.txt>\nnew\n</a.txt>\n";

        let outcome = ContentDecoder::new().decode(text, temp.path()).unwrap();

        assert_eq!(outcome.files.len(), 2);
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "new\n");
    }
}
