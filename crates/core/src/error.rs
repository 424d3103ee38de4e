//! Error taxonomy for a compilation run.
//!
//! Only failures that make the whole input unusable are represented here.
//! Unknown fields are dropped and malformed siblings are skipped inside the
//! extractors; neither ever reaches the caller as an error.

use std::path::PathBuf;

/// A fatal failure of a compilation run. No partial output accompanies it.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// The structured schema input could not be parsed at the top level.
    #[error("invalid schema input: {0}")]
    InvalidSchema(String),

    /// The declaration text contains no recognizable schema.
    #[error("invalid schema declarations: {0}")]
    InvalidDeclarations(String),

    /// Route input could not be parsed at the top level.
    #[error("invalid route input: {0}")]
    InvalidRoutes(String),

    /// JSON decoding failure of a top-level input document.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generator configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// File access failure while reading input or writing output.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CompileError>;
