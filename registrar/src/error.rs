//! Error types for the registration pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ConfigError`] - Invalid run configuration
//! - [`FetchError`] - Collection document retrieval and parsing errors
//! - [`FieldError`] - Malformed link fields (size, checksum, URI)
//! - [`CollectionError`] - Anything that stops processing of one collection
//! - [`RunError`] - Top-level errors returned by the run aggregator
//!
//! Failed registration calls are deliberately absent: a rejected or failed POST
//! is a [`crate::register::RegistrationOutcome`], logged and counted, never an error.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in the run-wide configuration, raised before any processing begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File mode is not an octal permission string.
    #[error("Invalid file mode '{0}': expected an octal string such as 0664")]
    InvalidFileMode(String),

    /// Provider host is empty.
    #[error("Provider host must not be empty")]
    EmptyHost,

    /// A required identifier is empty.
    #[error("Missing required value: {0}")]
    MissingValue(&'static str),

    /// No collection URL was supplied.
    #[error("At least one collection URL is required")]
    NoCollections,

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors while retrieving and parsing a collection document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("Failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("Fetching {url} returned HTTP status {status}")]
    Status { url: String, status: u16 },

    /// The collection URL uses a scheme we cannot read.
    #[error("Unsupported collection URL: {0}")]
    UnsupportedUrl(String),

    /// Reading or writing the transient copy failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document bytes could not be decoded to text.
    #[error("Failed to decode document: {0}")]
    Encoding(String),

    /// The document is not valid MARCXML.
    #[error("Invalid MARCXML: {0}")]
    Xml(String),
}

// =============================================================================
// Field Errors
// =============================================================================

/// Format errors in an electronic location and access field.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Size subfield is not a non-negative integer.
    #[error("Invalid size '{value}': {source}")]
    InvalidSize {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// No control number subfield to derive the checksum from.
    #[error("Missing control number subfield, cannot derive checksum")]
    MissingControlNumber,

    /// Control number does not carry a `<prefix>;<checksum>` pair.
    #[error("Control number '{0}' does not contain a checksum after ';'")]
    MissingChecksum(String),

    /// No URI subfield.
    #[error("Missing URI subfield")]
    MissingUri,
}

// =============================================================================
// Collection / Run Errors (top-level)
// =============================================================================

/// Errors that stop processing of a single collection.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Document retrieval or parsing error.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Malformed link field.
    #[error("{0}")]
    Field(#[from] FieldError),
}

/// Top-level run errors.
///
/// This is the error type returned by [`crate::pipeline::Registrar::run`].
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A collection failed and the run was aborted.
    #[error("Collection {url} failed: {source}")]
    Collection {
        url: String,
        #[source]
        source: CollectionError,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for document fetching.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for link field accessors.
pub type FieldResult<T> = Result<T, FieldError>;

/// Result type for a whole run.
pub type RunResult<T> = Result<T, RunError>;
