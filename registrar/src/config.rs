//! Run-wide configuration.
//!
//! Everything the registration client and the run aggregator need is carried
//! in explicit values built once from the command line:
//!
//! - [`RegistrationConfig`] - provider, space, storage, token and payload defaults
//! - [`RunOptions`] - progress cadence, timeouts, collection error policy

use std::fmt;
use std::str::FromStr;
use std::time::Duration;


use crate::error::{ConfigError, ConfigResult};

/// Path of the data registration endpoint on a Oneprovider.
pub const REGISTER_FILE_PATH: &str = "/api/v3/oneprovider/data/register";

/// Default POSIX mode for registered files.
pub const DEFAULT_FILE_MODE: &str = "0664";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// File Mode
// =============================================================================

/// POSIX permission mode, kept in the octal string form the provider expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMode(String);

impl FileMode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for FileMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= 5
            && trimmed.chars().all(|c| ('0'..='7').contains(&c))
            && u32::from_str_radix(trimmed, 8).is_ok_and(|bits| bits <= 0o7777);

        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ConfigError::InvalidFileMode(s.to_string()))
        }
    }
}

impl Default for FileMode {
    fn default() -> Self {
        Self(DEFAULT_FILE_MODE.to_string())
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Registration Config
// =============================================================================

/// Provider-side settings used to build and submit registration requests.
///
/// `Debug` is implemented by hand so the access token never reaches a log.
#[derive(Clone)]
pub struct RegistrationConfig {
    /// Oneprovider host, optionally with an `http://` or `https://` scheme
    pub host: String,
    /// Space in which files are registered
    pub space_id: String,
    /// Imported storage on which files are located
    pub storage_id: String,
    /// Onedata access token
    pub token: String,
    /// Mode with which files are registered
    pub file_mode: FileMode,
    /// Let the provider detect attributes and check the file exists on storage
    pub auto_detect_attributes: bool,
    /// Verify the provider's TLS certificate
    pub verify_certificates: bool,
}

impl RegistrationConfig {
    pub fn new(
        host: impl Into<String>,
        space_id: impl Into<String>,
        storage_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            space_id: space_id.into(),
            storage_id: storage_id.into(),
            token: token.into(),
            file_mode: FileMode::default(),
            auto_detect_attributes: true,
            verify_certificates: true,
        }
    }

    pub fn with_file_mode(mut self, file_mode: FileMode) -> Self {
        self.file_mode = file_mode;
        self
    }

    pub fn with_auto_detection(mut self, enabled: bool) -> Self {
        self.auto_detect_attributes = enabled;
        self
    }

    pub fn with_certificate_verification(mut self, enabled: bool) -> Self {
        self.verify_certificates = enabled;
        self
    }

    /// Reject empty required values before any network call is made.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.space_id.trim().is_empty() {
            return Err(ConfigError::MissingValue("space id"));
        }
        if self.storage_id.trim().is_empty() {
            return Err(ConfigError::MissingValue("storage id"));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingValue("access token"));
        }
        Ok(())
    }

    /// Full URL of the registration endpoint for the configured host.
    pub fn register_endpoint(&self) -> String {
        register_endpoint(&self.host)
    }
}

impl fmt::Debug for RegistrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationConfig")
            .field("host", &self.host)
            .field("space_id", &self.space_id)
            .field("storage_id", &self.storage_id)
            .field("token", &"<redacted>")
            .field("file_mode", &self.file_mode)
            .field("auto_detect_attributes", &self.auto_detect_attributes)
            .field("verify_certificates", &self.verify_certificates)
            .finish()
    }
}

/// Template the registration endpoint with a host.
///
/// A bare host gets `https://`; a host that already names `http://` or
/// `https://` is used as the base as-is.
pub fn register_endpoint(host: &str) -> String {
    let host = host.trim();
    let base = if host.starts_with("https://") || host.starts_with("http://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    };
    format!("{}{}", base, REGISTER_FILE_PATH)
}

// =============================================================================
// Run Options
// =============================================================================

/// What to do when a collection cannot be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionErrorPolicy {
    /// Stop the whole run at the first failing collection.
    #[default]
    Abort,
    /// Record the failure and move on to the next collection.
    Continue,
}

/// Options driving the run aggregator.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Log progress after every N successful registrations (0 or None disables)
    pub logging_frequency: Option<u64>,
    /// Timeout for each network call
    pub timeout: Duration,
    /// Timeout for establishing a connection
    pub connect_timeout: Duration,
    /// Collection error policy
    pub error_policy: CollectionErrorPolicy,
}

impl RunOptions {
    /// Whether `count` successes should produce a progress line.
    pub fn should_report_progress(&self, count: u64) -> bool {
        match self.logging_frequency {
            Some(freq) if freq > 0 => count > 0 && count % freq == 0,
            _ => false,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            logging_frequency: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            error_policy: CollectionErrorPolicy::Abort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_mode_parsing() {
        assert_eq!("0664".parse::<FileMode>().unwrap().as_str(), "0664");
        assert_eq!("755".parse::<FileMode>().unwrap().as_str(), "755");
        assert!("0668".parse::<FileMode>().is_err());
        assert!("rw-r--r--".parse::<FileMode>().is_err());
        assert!("".parse::<FileMode>().is_err());
        assert!("17777".parse::<FileMode>().is_err());
    }

    #[test]
    fn test_default_file_mode() {
        assert_eq!(FileMode::default().as_str(), "0664");
    }

    #[test]
    fn test_register_endpoint() {
        assert_eq!(
            register_endpoint("provider.example.org"),
            "https://provider.example.org/api/v3/oneprovider/data/register"
        );
        assert_eq!(
            register_endpoint("http://127.0.0.1:8080/"),
            "http://127.0.0.1:8080/api/v3/oneprovider/data/register"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = RegistrationConfig::new("host", "space", "storage", "secret-token");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_validate_rejects_empty_values() {
        let config = RegistrationConfig::new("host", "", "storage", "token");
        assert!(matches!(config.validate(), Err(ConfigError::MissingValue("space id"))));

        let config = RegistrationConfig::new(" ", "space", "storage", "token");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyHost)));

        let config = RegistrationConfig::new("host", "space", "storage", "token");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_progress_cadence() {
        let mut options = RunOptions::default();
        assert!(!options.should_report_progress(10));

        options.logging_frequency = Some(0);
        assert!(!options.should_report_progress(10));

        options.logging_frequency = Some(5);
        assert!(!options.should_report_progress(4));
        assert!(options.should_report_progress(5));
        assert!(options.should_report_progress(10));
        assert!(!options.should_report_progress(0));
    }
}
