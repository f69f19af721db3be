//! JSON Schema validation of registration payloads.
//!
//! Every request is checked against `schemas/register-request.json`
//! (embedded at compile time, JSON Schema Draft 7) before it is sent. A
//! request that fails the check is not sent and counts as a failed
//! registration; the run moves on to the next file.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use marcload::validation::validate_registration_request;
//!
//! let payload = json!({
//!     "spaceId": "space", "storageId": "storage",
//!     "storageFileId": "/a.mp4", "destinationPath": "/a.mp4",
//!     "size": 1000, "mode": "0664",
//!     "xattrs": { "checksum": "d41d8cd98f00b204e9800998ecf8427e" },
//!     "autoDetectAttributes": true
//! });
//! assert!(validate_registration_request(&payload).is_ok());
//! ```

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde_json::Value;

const REGISTER_REQUEST_SCHEMA: &str = include_str!("../../schemas/register-request.json");

/// Registration request validator, compiled on first use.
static REGISTER_REQUEST_VALIDATOR: Lazy<Result<Validator, String>> = Lazy::new(|| {
    let schema: Value = serde_json::from_str(REGISTER_REQUEST_SCHEMA)
        .map_err(|e| format!("Invalid embedded schema: {}", e))?;
    jsonschema::draft7::new(&schema).map_err(|e| format!("Invalid schema: {}", e))
});

/// Validate a JSON value with a compiled validator.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation otherwise
fn validate(validator: &Validator, data: &Value) -> Result<(), Vec<String>> {
    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a registration payload against the embedded schema.
pub fn validate_registration_request(data: &Value) -> Result<(), Vec<String>> {
    let validator = REGISTER_REQUEST_VALIDATOR
        .as_ref()
        .map_err(|e| vec![e.clone()])?;
    validate(validator, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "spaceId": "space-1",
            "storageId": "storage-1",
            "storageFileId": "/videos/a.mp4",
            "destinationPath": "/videos/a.mp4",
            "size": 1000,
            "mode": "0664",
            "xattrs": { "checksum": "d41d8cd98f00b204e9800998ecf8427e" },
            "autoDetectAttributes": true
        })
    }

    #[test]
    fn test_valid_payload() {
        assert!(validate_registration_request(&payload()).is_ok());
    }

    #[test]
    fn test_null_size_is_valid() {
        let mut data = payload();
        data["size"] = Value::Null;
        assert!(validate_registration_request(&data).is_ok());
    }

    #[test]
    fn test_empty_file_id_is_invalid() {
        let mut data = payload();
        data["storageFileId"] = json!("");
        data["destinationPath"] = json!("");
        let errors = validate_registration_request(&data).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_missing_checksum_is_invalid() {
        let mut data = payload();
        data["xattrs"] = json!({});
        assert!(validate_registration_request(&data).is_err());
    }

    #[test]
    fn test_non_octal_mode_is_invalid() {
        let mut data = payload();
        data["mode"] = json!("rw-r--r--");
        assert!(validate_registration_request(&data).is_err());
    }

    #[test]
    fn test_embedded_schema_compiles() {
        assert!(REGISTER_REQUEST_VALIDATOR.is_ok());
    }

    #[test]
    fn test_unknown_field_is_invalid() {
        let mut data = payload();
        data["extra"] = json!(true);
        assert!(validate_registration_request(&data).is_err());
    }
}
