//! Electronic location and access (856) fields.
//!
//! MARC21 overloads tag 856 for every kind of electronic resource and access
//! method. This module isolates those fields from a record and exposes the
//! subfields the registration pipeline needs:
//!
//! | Accessor | Source |
//! |---|---|
//! | [`LinkField::access_method`] | first indicator |
//! | [`LinkField::media_type`] | `$q` electronic format type |
//! | [`LinkField::size`] | `$s` file size |
//! | [`LinkField::uri`] | `$u` uniform resource identifier |
//! | [`LinkField::checksum`] | `$w` record control number, `<prefix>;<checksum>` |
//!
//! See <https://www.loc.gov/marc/bibliographic/ecbdlist.html>.

pub mod filter;

use crate::error::{FieldError, FieldResult};
use crate::marc::{DataField, Record};

pub use filter::{is_eligible, ACCEPTED_TYPES};

/// Tag of the electronic location and access field.
pub const ELECTRONIC_LOCATION_AND_ACCESS: &str = "856";

/// Subfield codes consumed from 856 fields.
pub mod subfield {
    pub const MEDIA_TYPE: char = 'q';
    pub const SIZE: char = 's';
    pub const URI: char = 'u';
    pub const CONTROL_NUMBER: char = 'w';
}

/// Separator between the control number prefix and the checksum.
const CHECKSUM_SEPARATOR: char = ';';

// =============================================================================
// Access Method
// =============================================================================

/// Access method coded in the first indicator of an 856 field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMethod {
    /// `#` / blank
    NoInformation,
    /// `0`
    Email,
    /// `1`
    Ftp,
    /// `2` (Telnet)
    RemoteLogin,
    /// `3`
    DialUp,
    /// `4`
    Http,
    /// `7`, method named in `$2`
    SpecifiedInSubfield2,
    /// Any other indicator value
    Other(char),
}

impl AccessMethod {
    /// Decode a first-indicator value.
    pub fn from_indicator(indicator: char) -> Self {
        match indicator {
            ' ' | '#' => Self::NoInformation,
            '0' => Self::Email,
            '1' => Self::Ftp,
            '2' => Self::RemoteLogin,
            '3' => Self::DialUp,
            '4' => Self::Http,
            '7' => Self::SpecifiedInSubfield2,
            other => Self::Other(other),
        }
    }
}

// =============================================================================
// Media Type
// =============================================================================

/// Video container types accepted for registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Mp4,
    Mkv,
    Mov,
}

impl MediaType {
    /// Parse an electronic format type. Exact, case-sensitive match only.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "MP4" => Some(Self::Mp4),
            "MKV" => Some(Self::Mkv),
            "MOV" => Some(Self::Mov),
            _ => None,
        }
    }
}

// =============================================================================
// Link Field
// =============================================================================

/// One electronic location and access field of a record.
#[derive(Debug, Clone, Copy)]
pub struct LinkField<'a> {
    field: &'a DataField,
}

impl<'a> LinkField<'a> {
    pub fn new(field: &'a DataField) -> Self {
        Self { field }
    }

    pub fn access_method(&self) -> AccessMethod {
        AccessMethod::from_indicator(self.field.indicator1)
    }

    /// First `$q` value as recorded.
    pub fn media_type_code(&self) -> Option<&'a str> {
        self.field.subfield(subfield::MEDIA_TYPE)
    }

    /// First `$q` value if it names an accepted type.
    pub fn media_type(&self) -> Option<MediaType> {
        self.media_type_code().and_then(MediaType::from_code)
    }

    /// Declared size in bytes from the first `$s` value.
    ///
    /// An absent or empty subfield is `Ok(None)`; anything that is not a
    /// non-negative integer is an error.
    pub fn size(&self) -> FieldResult<Option<u64>> {
        match self.field.subfield(subfield::SIZE).map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse::<u64>()
                .map(Some)
                .map_err(|source| FieldError::InvalidSize {
                    value: value.to_string(),
                    source,
                }),
        }
    }

    /// First `$u` value.
    pub fn uri(&self) -> Option<&'a str> {
        self.field.subfield(subfield::URI)
    }

    /// First `$w` value.
    pub fn control_number(&self) -> Option<&'a str> {
        self.field.subfield(subfield::CONTROL_NUMBER)
    }

    /// Checksum carried in the control number.
    pub fn checksum(&self) -> FieldResult<&'a str> {
        let control_number = self
            .control_number()
            .ok_or(FieldError::MissingControlNumber)?;
        parse_checksum(control_number)
    }
}

/// Extract the checksum from a `<prefix>;<checksum>` control number.
///
/// The second `;`-separated segment is the checksum; further segments are
/// ignored.
///
/// # Example
/// ```
/// use marcload::links::parse_checksum;
///
/// let checksum = parse_checksum("(OCoLC)12345;d41d8cd98f00b204e9800998ecf8427e").unwrap();
/// assert_eq!(checksum, "d41d8cd98f00b204e9800998ecf8427e");
/// assert!(parse_checksum("(OCoLC)12345").is_err());
/// ```
pub fn parse_checksum(control_number: &str) -> FieldResult<&str> {
    match control_number.split(CHECKSUM_SEPARATOR).nth(1) {
        Some(checksum) if !checksum.is_empty() => Ok(checksum),
        _ => Err(FieldError::MissingChecksum(control_number.to_string())),
    }
}

/// All link fields of a record, in source order.
///
/// An absent record has no link fields.
pub fn link_fields(record: Option<&Record>) -> Vec<LinkField<'_>> {
    record
        .map(|r| {
            r.fields_by_tag(ELECTRONIC_LOCATION_AND_ACCESS)
                .map(LinkField::new)
                .collect()
        })
        .unwrap_or_default()
}
