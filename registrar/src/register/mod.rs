//! Registration of storage files with a Oneprovider.
//!
//! Registration is metadata-only: the provider is told where an existing
//! object lives on an imported storage, its size, mode and checksum. No file
//! content is transferred.
//!
//! ```text
//! POST https://{host}/api/v3/oneprovider/data/register
//! X-Auth-Token: {token}
//! Content-Type: application/json
//! ```
//!
//! Only `201 Created` counts as success. Any other status, any transport
//! failure, and a payload failing schema validation are logged and reported
//! as a failed [`RegistrationOutcome`]; the
//! caller moves on to the next file. There are no retries and no local
//! deduplication.

use serde::Serialize;

use crate::config::{RegistrationConfig, RunOptions};
use crate::error::{ConfigError, ConfigResult, FieldError, FieldResult};
use crate::links::LinkField;
use crate::locator::strip_server_url;
use crate::logs::{error_chain, LogBroadcaster, LogEntry};
use crate::validation::validate_registration_request;

/// Header carrying the Onedata access token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

// =============================================================================
// Request
// =============================================================================

/// Extended attributes set on the registered file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Xattrs {
    pub checksum: String,
}

/// Body of a registration call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub space_id: String,
    pub storage_id: String,
    /// Storage-relative file id
    pub storage_file_id: String,
    /// Logical path in the space, same as the storage file id
    pub destination_path: String,
    pub size: Option<u64>,
    pub mode: String,
    pub xattrs: Xattrs,
    pub auto_detect_attributes: bool,
}

impl RegistrationRequest {
    /// Build a request for one file; `uri` may be a full URL or a bare path.
    pub fn new(
        config: &RegistrationConfig,
        uri: &str,
        size: Option<u64>,
        checksum: &str,
    ) -> Self {
        let storage_file_id = strip_server_url(uri).to_string();
        Self {
            space_id: config.space_id.clone(),
            storage_id: config.storage_id.clone(),
            destination_path: storage_file_id.clone(),
            storage_file_id,
            size,
            mode: config.file_mode.to_string(),
            xattrs: Xattrs {
                checksum: checksum.to_string(),
            },
            auto_detect_attributes: config.auto_detect_attributes,
        }
    }

    /// Check the serialized payload against the registration schema.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let payload = serde_json::to_value(self).map_err(|e| vec![e.to_string()])?;
        validate_registration_request(&payload)
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of one registration call.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// `201 Created`
    Created,
    /// The provider answered with any other status.
    Rejected { status: u16, body: String },
    /// The call did not complete (connection, TLS, timeout).
    Failed { error: String },
    /// The payload failed schema validation and was not sent.
    Invalid { errors: Vec<String> },
}

impl RegistrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created)
    }
}

// =============================================================================
// Client
// =============================================================================

/// Submits registration requests to a Oneprovider.
///
/// Not `Debug`: the access token lives in the config.
#[derive(Clone)]
pub struct RegistrationClient {
    http: reqwest::Client,
    endpoint: String,
    config: RegistrationConfig,
    logs: LogBroadcaster,
}

impl RegistrationClient {
    pub fn new(
        config: RegistrationConfig,
        options: &RunOptions,
        logs: LogBroadcaster,
    ) -> ConfigResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .danger_accept_invalid_certs(!config.verify_certificates)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            endpoint: config.register_endpoint(),
            config,
            logs,
        })
    }

    /// Derive a request from an eligible link field.
    ///
    /// Format problems (missing URI, bad size, missing checksum) surface
    /// here, before any network call.
    pub fn build_request(&self, field: &LinkField<'_>) -> FieldResult<RegistrationRequest> {
        let uri = field.uri().ok_or(FieldError::MissingUri)?;
        let size = field.size()?;
        let checksum = field.checksum()?;

        Ok(RegistrationRequest::new(&self.config, uri, size, checksum))
    }

    /// Validate and submit one request. At most one network call, no retries.
    pub async fn register(&self, request: &RegistrationRequest) -> RegistrationOutcome {
        if let Err(errors) = request.validate() {
            self.logs.error(format!(
                "Registration of '{}' skipped, invalid request: {}",
                request.storage_file_id,
                errors.join("; ")
            ));
            return RegistrationOutcome::Invalid { errors };
        }

        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTH_TOKEN_HEADER, &self.config.token)
            .json(request)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                let error = error_chain(&e);
                self.logs.error(format!(
                    "Registration of {} failed due to {}",
                    request.storage_file_id, error
                ));
                return RegistrationOutcome::Failed { error };
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::CREATED {
            return RegistrationOutcome::Created;
        }

        let body = response.text().await.unwrap_or_default();
        self.logs.error(format!(
            "Registration of {} failed with HTTP status {}.",
            request.storage_file_id,
            status.as_u16()
        ));
        self.logs
            .log(LogEntry::error(format!("Response: {}", body)).with_indent(1));

        RegistrationOutcome::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileMode;
    use crate::marc::DataField;
    use serde_json::json;

    fn config() -> RegistrationConfig {
        RegistrationConfig::new("provider.example", "space-1", "storage-1", "token")
    }

    fn client() -> RegistrationClient {
        RegistrationClient::new(config(), &RunOptions::default(), LogBroadcaster::new()).unwrap()
    }

    #[test]
    fn test_payload_shape() {
        let config = config()
            .with_file_mode("0644".parse::<FileMode>().unwrap())
            .with_auto_detection(false);
        let request = RegistrationRequest::new(&config, "https://media.example/v/a.mp4", Some(1000), "abc");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "spaceId": "space-1",
                "storageId": "storage-1",
                "storageFileId": "/v/a.mp4",
                "destinationPath": "/v/a.mp4",
                "size": 1000,
                "mode": "0644",
                "xattrs": { "checksum": "abc" },
                "autoDetectAttributes": false
            })
        );
    }

    #[test]
    fn test_absent_size_serializes_as_null() {
        let request = RegistrationRequest::new(&config(), "/v/a.mp4", None, "abc");
        let payload = serde_json::to_value(&request).unwrap();
        assert!(payload["size"].is_null());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_build_request_from_field() {
        let field = DataField::new("856", '4', ' ')
            .with_subfield('u', "https://media.example/v/a.mkv")
            .with_subfield('q', "MKV")
            .with_subfield('s', "2048")
            .with_subfield('w', "(OCoLC)1;d41d8cd98f00b204e9800998ecf8427e");

        let request = client().build_request(&LinkField::new(&field)).unwrap();
        assert_eq!(request.storage_file_id, "/v/a.mkv");
        assert_eq!(request.destination_path, "/v/a.mkv");
        assert_eq!(request.size, Some(2048));
        assert_eq!(request.xattrs.checksum, "d41d8cd98f00b204e9800998ecf8427e");
        assert!(request.auto_detect_attributes);
        assert_eq!(request.mode, "0664");
    }

    #[test]
    fn test_build_request_format_errors() {
        let client = client();

        let no_uri = DataField::new("856", '4', ' ').with_subfield('w', "x;abc");
        assert!(matches!(
            client.build_request(&LinkField::new(&no_uri)),
            Err(FieldError::MissingUri)
        ));

        let no_checksum = DataField::new("856", '4', ' ')
            .with_subfield('u', "/a.mp4")
            .with_subfield('w', "(OCoLC)12345");
        assert!(matches!(
            client.build_request(&LinkField::new(&no_checksum)),
            Err(FieldError::MissingChecksum(_))
        ));

        let bad_size = DataField::new("856", '4', ' ')
            .with_subfield('u', "/a.mp4")
            .with_subfield('s', "large")
            .with_subfield('w', "x;abc");
        assert!(matches!(
            client.build_request(&LinkField::new(&bad_size)),
            Err(FieldError::InvalidSize { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_payload_is_not_sent() {
        let url_without_path = DataField::new("856", '4', ' ')
            .with_subfield('u', "https://media.example")
            .with_subfield('w', "x;abc");
        let client = client();
        let mut logs = client.logs.subscribe();

        let request = client.build_request(&LinkField::new(&url_without_path)).unwrap();
        assert_eq!(request.storage_file_id, "");

        // provider.example is never contacted
        let outcome = client.register(&request).await;
        assert!(matches!(outcome, RegistrationOutcome::Invalid { ref errors } if !errors.is_empty()));
        assert!(!outcome.is_success());
        assert!(logs.try_recv().unwrap().message.starts_with("Registration of '' skipped"));
    }

    #[test]
    fn test_client_rejects_incomplete_config() {
        let config = RegistrationConfig::new("provider.example", "space", "storage", "");
        let result = RegistrationClient::new(config, &RunOptions::default(), LogBroadcaster::new());
        assert!(matches!(result, Err(ConfigError::MissingValue(_))));
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            client().endpoint,
            "https://provider.example/api/v3/oneprovider/data/register"
        );
    }

    #[test]
    fn test_outcome_success() {
        assert!(RegistrationOutcome::Created.is_success());
        assert!(!RegistrationOutcome::Rejected { status: 403, body: String::new() }.is_success());
        assert!(!RegistrationOutcome::Failed { error: "timeout".into() }.is_success());
        assert!(!RegistrationOutcome::Invalid { errors: vec![] }.is_success());
    }
}
