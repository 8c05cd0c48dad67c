//! Error types for SPE tokenizer construction and tokenization.

use std::{fmt, io};

/// Errors that can occur when building or running an SPE tokenizer.
#[derive(Debug)]
pub enum SpeError {
    /// A merge-rule line did not contain exactly two symbols.
    MalformedRule {
        /// 1-based position among the consumed rule lines.
        line: usize,
        /// The offending line, trimmed.
        content: String,
    },
    /// Dropout probability outside the [0, 1] interval.
    InvalidDropout(f32),
    /// A glossary pattern failed to compile.
    InvalidGlossary {
        /// Pattern as supplied by the caller.
        pattern: String,
        /// Underlying regex compilation error.
        source: Box<fancy_regex::Error>,
    },
    /// Rule file could not be read.
    Io(io::Error),
}

impl fmt::Display for SpeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRule { line, content } => write!(
                f,
                "invalid line {line} in merge rules: '{content}' \
                 (each line should consist of exactly two subword units separated by whitespace)"
            ),
            Self::InvalidDropout(p) => write!(f, "dropout must be within [0, 1], got {p}"),
            Self::InvalidGlossary { pattern, source } => {
                write!(f, "glossary pattern '{pattern}' failed to compile: {source}")
            }
            Self::Io(e) => write!(f, "cannot read merge rules: {e}"),
        }
    }
}

impl std::error::Error for SpeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidGlossary { source, .. } => Some(source.as_ref()),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SpeError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
