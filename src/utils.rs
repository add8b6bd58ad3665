/*!
 * Utility functions for protree
 */

use std::path::Path;

use once_cell::sync::Lazy;

/// Placeholder written in place of excluded or binary file content
pub const EXCLUDED_PLACEHOLDER: &str = "Excluded file type (binary/image)";

/// Extensions whose content is never read
pub const EXCLUDED_EXTENSIONS: &[&str] = &[
    ".exe", ".dll", ".bin", ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".ico", ".svg",
];

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Lowercased extension including the leading dot, or "" when there is none
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Whether a file with this extension is excluded from content capture
pub fn is_excluded_extension(ext: &str) -> bool {
    EXCLUDED_EXTENSIONS.contains(&ext)
}

/// Line count as the report counts it: newlines plus one
pub fn count_lines(text: &str) -> usize {
    text.matches('\n').count() + 1
}

/// Default patterns to ignore
pub static DEFAULT_IGNORE: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Version Control
        ".git",
        ".svn",
        ".hg",
        ".bzr",
        // OS Files
        ".DS_Store",
        "Thumbs.db",
        // Dependencies
        "node_modules",
        ".pnpm-store",
        // Python
        "__pycache__",
        ".pytest_cache",
        ".venv",
        // Rust
        "target",
        // IDEs & Editors
        ".idea",
        ".vscode",
    ]
});
