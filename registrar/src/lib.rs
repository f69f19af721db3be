//! # Marcload - bulk registration of catalogued media files
//!
//! Marcload reads MARC21 (MARCXML) collections, picks the electronic location
//! and access fields that point at HTTP-reachable video files, and registers
//! those files with a Oneprovider. Registration is metadata-only: the files
//! already sit on an imported storage and are never transferred.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Collection  │────▶│   MARCXML   │────▶│ 856 fields  │────▶│  Register   │
//! │    URL      │     │ (1st record)│     │ (HTTP+video)│     │ (POST, 201) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Run-wide configuration
//! - [`locator`] - Storage-relative file ids from URLs
//! - [`marc`] - MARCXML parsing and collection fetching
//! - [`links`] - Link field accessors and eligibility
//! - [`validation`] - Registration payload schema
//! - [`register`] - Registration client
//! - [`pipeline`] - Run aggregator
//! - [`logs`] - Run log

// Core modules
pub mod config;
pub mod error;
pub mod logs;

// Catalog side
pub mod links;
pub mod locator;
pub mod marc;

// Provider side
pub mod register;
pub mod validation;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Errors and configuration
// =============================================================================

pub use error::{CollectionError, ConfigError, FetchError, FieldError, RunError};

pub use config::{
    register_endpoint,
    CollectionErrorPolicy,
    FileMode,
    RegistrationConfig,
    RunOptions,
    DEFAULT_FILE_MODE,
};

// =============================================================================
// Re-exports - Catalog
// =============================================================================

pub use locator::strip_server_url;

pub use marc::{fetch::CollectionFetcher, parse_marcxml, DataField, Record, Subfield};

pub use links::{
    is_eligible,
    link_fields,
    parse_checksum,
    AccessMethod,
    LinkField,
    MediaType,
    ACCEPTED_TYPES,
    ELECTRONIC_LOCATION_AND_ACCESS,
};

// =============================================================================
// Re-exports - Registration
// =============================================================================

pub use register::{RegistrationClient, RegistrationOutcome, RegistrationRequest};

pub use pipeline::{FailedCollection, Registrar, RunSummary, RunTotals};

pub use logs::{LogBroadcaster, LogEntry, LogLevel};
