//! Rich diagnostic error types for the kiln graph core.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text so callers know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the kiln core.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text, source chains) through to the
/// caller.
#[derive(Debug, Error, Diagnostic)]
pub enum KilnError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Linker(#[from] LinkerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("sentiment {value} outside [-1.0, 1.0]")]
    #[diagnostic(
        code(kiln::validation::sentiment_range),
        help(
            "Sentiment scores must lie in [-1.0, 1.0], with -1.0 fully \
             negative and 1.0 fully positive. Clamp or re-score the value \
             before constructing the Insight."
        )
    )]
    SentimentOutOfRange { value: f32 },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: {id}")]
    #[diagnostic(
        code(kiln::graph::node_not_found),
        help(
            "The referenced node id does not exist in the graph. \
             Insert the endpoint node before wiring edges to it."
        )
    )]
    NodeNotFound { id: String },

    #[error("node {id} is a {found}, expected {expected}")]
    #[diagnostic(
        code(kiln::graph::kind_mismatch),
        help(
            "Edge endpoints are typed: HAS_COMPONENT parents must be \
             Products, YIELDS origins must be Sources, ABOUT targets must \
             be Products or Components, and SEMANTIC_MATCH only connects \
             Insights. Check the ids you are linking."
        )
    )]
    KindMismatch {
        id: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("insight {id} has no embedding")]
    #[diagnostic(
        code(kiln::graph::not_embedded),
        help(
            "SEMANTIC_MATCH edges require both insights to carry an \
             embedding. Run the embedding pass first."
        )
    )]
    NotEmbedded { id: String },
}

// ---------------------------------------------------------------------------
// Persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PersistError {
    #[error("I/O error writing snapshot to {path}")]
    #[diagnostic(
        code(kiln::persist::io),
        help(
            "A filesystem operation failed. Check that the data directory \
             exists, has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize graph snapshot: {message}")]
    #[diagnostic(
        code(kiln::persist::serialize),
        help("The in-memory graph could not be encoded as JSON. This is a bug.")
    )]
    Serialize { message: String },
}

// ---------------------------------------------------------------------------
// Linker errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LinkerError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(
        code(kiln::linker::dim_mismatch),
        help(
            "All embeddings compared in a linking pass must share the same \
             dimension. Re-embed the mismatched insight with the configured \
             provider, or check that the provider configuration has not \
             changed between runs."
        )
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding provider error: {message}")]
    #[diagnostic(
        code(kiln::linker::provider),
        help(
            "The embedding provider request failed. Check that the endpoint \
             is reachable and returns an `embedding` array of floats."
        )
    )]
    Provider { message: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(kiln::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("data directory error: {path}")]
    #[diagnostic(
        code(kiln::engine::data_dir),
        help(
            "The data directory could not be created or accessed. \
             Ensure the path exists and has read/write permissions."
        )
    )]
    DataDir { path: String },

    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(kiln::engine::config_read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {path}")]
    #[diagnostic(
        code(kiln::engine::config_parse),
        help("Check the TOML syntax in the config file.")
    )]
    ConfigParse { path: String, message: String },
}

/// Convenience alias for functions returning kiln results.
pub type KilnResult<T> = std::result::Result<T, KilnError>;
