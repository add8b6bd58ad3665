/*!
 * Configuration handling for protree
 */

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use clap_complete::Shell;

use crate::ensure;
use crate::error::Result;
use crate::report::ReportFormat;

/// Default tree text file name
pub const DEFAULT_TREE_FILE: &str = "directory.txt";
/// Default content text file name
pub const DEFAULT_CONTENTS_FILE: &str = "contents.txt";
/// Default directory a decode run rebuilds into
pub const DEFAULT_OUTPUT_DIR: &str = "reconstructed_project";
/// Default content size limit per file (1 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Command-line arguments for protree
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "protree",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serialize a project tree into text and rebuild it",
    long_about = "Encodes a project into a directory listing (tree text), a tagged file-contents stream and a Markdown report, and decodes the two text files back into a directory tree."
)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    /// Summary format printed after a run
    #[clap(long, value_enum, global = true, default_value_t = ReportFormat::default())]
    pub format: ReportFormat,

    /// Log every created directory and written file
    #[clap(long, short, global = true)]
    pub verbose: bool,

    /// Hide the progress bar and the summary
    #[clap(long, short, global = true)]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Encode a project directory into tree text, content text and a report
    Encode(EncodeArgs),
    /// Rebuild a directory tree from tree text and content text
    Decode(DecodeArgs),
    /// Generate shell completions
    Completions {
        /// Target shell
        #[clap(value_enum)]
        shell: Shell,
    },
}

/// Arguments of the `encode` subcommand
#[derive(ClapArgs, Debug, Clone)]
pub struct EncodeArgs {
    /// Project directory to encode
    #[clap(default_value = ".")]
    pub project_path: String,

    /// Project name used in the report (defaults to the directory name)
    #[clap(long)]
    pub name: Option<String>,

    /// Directory the artifacts are written to
    #[clap(long, short, default_value = ".")]
    pub output_dir: String,

    /// Report file name (".md" is appended when missing)
    #[clap(long)]
    pub report_name: Option<String>,

    /// Skip the Markdown report
    #[clap(long)]
    pub no_report: bool,

    /// Comma-separated list of patterns to ignore
    #[clap(long, value_delimiter = ',')]
    pub ignore_patterns: Vec<String>,

    /// Comma-separated list of file patterns to include (if specified, only matching files are included)
    #[clap(long, value_delimiter = ',')]
    pub include_patterns: Vec<String>,

    /// Respect .gitignore files
    #[clap(long)]
    pub respect_gitignore: bool,

    /// Path to custom .gitignore file
    #[clap(long)]
    pub gitignore_path: Option<String>,

    /// Do not apply the built-in ignore list (VCS metadata, caches)
    #[clap(long)]
    pub no_default_ignores: bool,

    /// Largest file, in bytes, whose content is captured
    #[clap(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Count tokens for the report
    #[clap(long)]
    pub count_tokens: bool,
}

/// Arguments of the `decode` subcommand
#[derive(ClapArgs, Debug, Clone)]
pub struct DecodeArgs {
    /// Tree text file
    #[clap(long, default_value = DEFAULT_TREE_FILE)]
    pub tree: String,

    /// Content text file
    #[clap(long, default_value = DEFAULT_CONTENTS_FILE)]
    pub contents: String,

    /// Directory to rebuild into
    #[clap(long, short, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: String,

    /// Do not read a tree text file
    #[clap(long)]
    pub no_tree: bool,

    /// Do not read a content text file
    #[clap(long)]
    pub no_contents: bool,
}

/// Scanner configuration
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Target directory to process
    pub target_dir: PathBuf,

    /// Patterns to ignore
    pub ignore_patterns: Vec<String>,

    /// File patterns to include (if empty, include all)
    pub include_patterns: Vec<String>,

    /// Whether to respect .gitignore files
    pub respect_gitignore: bool,

    /// Path to custom .gitignore file
    pub gitignore_path: Option<PathBuf>,

    /// Whether the built-in ignore list applies
    pub use_default_ignores: bool,

    /// Largest file whose content is captured
    pub max_file_size: u64,

    /// Whether tokens are counted
    pub count_tokens: bool,

    /// Paths never scanned (the run's own artifacts)
    pub skip_paths: Vec<PathBuf>,
}

impl ScanConfig {
    /// Configuration scanning `target_dir` with every option at its default
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            ignore_patterns: Vec::new(),
            include_patterns: Vec::new(),
            respect_gitignore: false,
            gitignore_path: None,
            use_default_ignores: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            count_tokens: false,
            skip_paths: Vec::new(),
        }
    }
}

/// Configuration of an encode run
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    /// Scanner settings
    pub scan: ScanConfig,

    /// Project name shown in the report
    pub project_name: String,

    /// Tree text output path
    pub tree_file: PathBuf,

    /// Content text output path
    pub contents_file: PathBuf,

    /// Markdown report output path
    pub report_file: Option<PathBuf>,
}

impl EncodeConfig {
    /// Create configuration from command-line arguments
    pub fn from_args(args: EncodeArgs) -> Self {
        let target_dir = PathBuf::from(&args.project_path);
        let output_dir = PathBuf::from(&args.output_dir);

        let project_name = args.name.unwrap_or_else(|| project_name_for(&target_dir));
        let report_file = if args.no_report {
            None
        } else {
            let name = match args.report_name {
                Some(name) if name.ends_with(".md") => name,
                Some(name) => format!("{}.md", name),
                None => format!("{}_structure_with_code.md", project_name),
            };
            Some(output_dir.join(name))
        };

        let mut scan = ScanConfig::new(target_dir);
        scan.ignore_patterns = args.ignore_patterns;
        scan.include_patterns = args.include_patterns;
        scan.respect_gitignore = args.respect_gitignore;
        scan.gitignore_path = args.gitignore_path.map(PathBuf::from);
        scan.use_default_ignores = !args.no_default_ignores;
        scan.max_file_size = args.max_file_size;
        scan.count_tokens = args.count_tokens;

        let mut config = Self {
            scan,
            project_name,
            tree_file: output_dir.join(DEFAULT_TREE_FILE),
            contents_file: output_dir.join(DEFAULT_CONTENTS_FILE),
            report_file,
        };
        config.scan.skip_paths = config.artifact_paths();
        config
    }

    /// Every path this run writes
    pub fn artifact_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.tree_file.clone(), self.contents_file.clone()];
        paths.extend(self.report_file.clone());
        paths.iter().map(|path| absolute(path)).collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let target = &self.scan.target_dir;
        ensure!(
            target.is_dir(),
            PathNotFound,
            "Target directory not found: {}",
            target.display()
        );

        for artifact in self.artifact_paths() {
            if let Some(parent) = artifact.parent() {
                ensure!(
                    !parent.exists() || parent.is_dir(),
                    Config,
                    "Output location is not a directory: {}",
                    parent.display()
                );
            }
        }

        if let Some(path) = &self.scan.gitignore_path {
            ensure!(
                path.exists(),
                PathNotFound,
                "Custom .gitignore file not found: {}",
                path.display()
            );
        }

        ensure!(
            self.scan.max_file_size > 0,
            Config,
            "--max-file-size must be greater than zero"
        );
        ensure!(
            !self.project_name.trim().is_empty(),
            Config,
            "Project name must not be empty"
        );

        Ok(())
    }
}

/// Configuration of a decode run
#[derive(Clone, Debug)]
pub struct DecodeConfig {
    /// Tree text input, if any
    pub tree_file: Option<PathBuf>,

    /// Content text input, if any
    pub contents_file: Option<PathBuf>,

    /// Directory to rebuild into
    pub output_dir: PathBuf,
}

impl DecodeConfig {
    /// Create configuration from command-line arguments
    pub fn from_args(args: DecodeArgs) -> Self {
        Self {
            tree_file: (!args.no_tree).then(|| PathBuf::from(args.tree)),
            contents_file: (!args.no_contents).then(|| PathBuf::from(args.contents)),
            output_dir: PathBuf::from(args.output),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.tree_file.is_some() || self.contents_file.is_some(),
            Config,
            "Nothing to decode: both --no-tree and --no-contents were given"
        );

        for input in self.tree_file.iter().chain(self.contents_file.iter()) {
            ensure!(
                input.is_file(),
                PathNotFound,
                "Input file not found: {}",
                input.display()
            );
        }

        ensure!(
            !self.output_dir.exists() || self.output_dir.is_dir(),
            Config,
            "Output path is not a directory: {}",
            self.output_dir.display()
        );

        Ok(())
    }
}

/// Name of the project directory, following `.` and `..` to a real name
fn project_name_for(target_dir: &Path) -> String {
    fs::canonicalize(target_dir)
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string())
}

/// Absolute form of `path`, canonical where its parent exists
fn absolute(path: &Path) -> PathBuf {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let parent = match parent {
        Some(parent) => fs::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf()),
        None => std::env::current_dir().unwrap_or_default(),
    };
    match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    }
}
