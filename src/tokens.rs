//! Token counting for the project report
//!
//! Uses the `cl100k_base` encoding, which is bundled with tiktoken and
//! needs no network access.

use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// Result type for tokenizer operations
pub type TokenizerResult<T> = Result<T, TokenizerError>;

/// Errors that can occur during tokenization
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// The BPE encoding could not be loaded
    #[error("Failed to load encoding: {0}")]
    Encoding(String),
}

/// Counts tokens in file bodies
pub struct TokenCounter {
    encoding: CoreBPE,
}

impl TokenCounter {
    /// Load the encoding
    pub fn new() -> TokenizerResult<Self> {
        let encoding =
            tiktoken_rs::cl100k_base().map_err(|e| TokenizerError::Encoding(e.to_string()))?;
        Ok(Self { encoding })
    }

    /// Number of tokens in `text`
    pub fn count(&self, text: &str) -> usize {
        self.encoding.encode_ordinary(text).len()
    }
}

/// Rough token estimate used when no counter is configured
pub fn estimate_tokens(chars: usize) -> usize {
    chars / 4
}
