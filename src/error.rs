//! Error types for the conversion pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single markup-to-RTF conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// Reserved. The lexer and resolver degrade every ambiguity to literal
    /// text, so nothing in the parser produces this today.
    #[error("malformed markup on line {line}: {reason}")]
    MalformedMarkup { line: usize, reason: String },

    #[error("unknown template '{name}' (available: {})", .available.join(", "))]
    UnknownTemplate {
        name: String,
        available: Vec<String>,
    },

    #[error("character {character:?} in block {block} cannot be encoded as RTF")]
    EncodingFailure { character: char, block: usize },
}

impl ConvertError {
    /// Stable name of the failure kind, used in protocol error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::MalformedMarkup { .. } => "MalformedMarkup",
            ConvertError::UnknownTemplate { .. } => "UnknownTemplate",
            ConvertError::EncodingFailure { .. } => "EncodingFailure",
        }
    }
}

/// Failures while loading template definitions.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to parse built-in templates: {source}")]
    Builtin { source: toml::de::Error },

    #[error("failed to read templates file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse templates file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid template '{name}': {source}")]
    Invalid {
        name: String,
        source: toml::de::Error,
    },
}
