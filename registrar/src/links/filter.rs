//! Eligibility of link fields for registration.
//!
//! Only direct HTTP links to known video containers are registered.

use super::{AccessMethod, LinkField, MediaType};

/// Media types accepted for registration.
pub const ACCEPTED_TYPES: [MediaType; 3] = [MediaType::Mp4, MediaType::Mkv, MediaType::Mov];

/// A link field is eligible iff its access method is HTTP and its media type
/// is one of [`ACCEPTED_TYPES`].
pub fn is_eligible(field: &LinkField<'_>) -> bool {
    is_http_access_method(field) && has_accepted_type(field)
}

pub fn is_http_access_method(field: &LinkField<'_>) -> bool {
    field.access_method() == AccessMethod::Http
}

pub fn has_accepted_type(field: &LinkField<'_>) -> bool {
    field
        .media_type()
        .is_some_and(|media_type| ACCEPTED_TYPES.contains(&media_type))
}
