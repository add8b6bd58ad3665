//! Syntax-highlight language tags for report code blocks

use strum::Display;

/// Language tag attached to a fenced code block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Javascript,
    C,
    Cpp,
    Go,
    Ruby,
    Php,
    Html,
    Css,
    Typescript,
    Rust,
    /// Anything without a mapping
    Text,
}

impl Language {
    /// Language for a lowercased extension with its leading dot
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".py" => Self::Python,
            ".java" => Self::Java,
            ".js" => Self::Javascript,
            ".c" => Self::C,
            ".cpp" | ".h" => Self::Cpp,
            ".go" => Self::Go,
            ".rb" => Self::Ruby,
            ".php" => Self::Php,
            ".html" => Self::Html,
            ".css" => Self::Css,
            ".ts" => Self::Typescript,
            ".rs" => Self::Rust,
            _ => Self::Text,
        }
    }

    /// Whether files of this language count as code files
    pub fn is_code(self) -> bool {
        self != Self::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tags() {
        assert_eq!(Language::from_extension(".h").to_string(), "cpp");
        assert_eq!(Language::from_extension(".js").to_string(), "javascript");
        assert_eq!(Language::from_extension(".toml").to_string(), "text");
        assert!(Language::from_extension(".py").is_code());
        assert!(!Language::from_extension("").is_code());
    }
}
