//! MARC21 records read from MARCXML.
//!
//! Only what the registration pipeline consumes is modelled: control fields,
//! data fields with their indicators, and subfields in source order.
//!
//! MARCXML is accepted in any of these forms (<https://www.loc.gov/standards/marcxml/>):
//! - `<collection>` root holding zero or more `<record>` elements
//! - a bare `<record>` root
//! - default namespace, `marc:`-prefixed namespace, or no namespace

pub mod encoding;
pub mod fetch;

use once_cell::sync::Lazy;
use quick_xml::de::from_str as xml_from_str;
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::{FetchError, FetchResult};

// =============================================================================
// Record model
// =============================================================================

/// One bibliographic record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Control fields (tags 001-009) as `(tag, value)` in source order
    pub control_fields: Vec<(String, String)>,
    /// Data fields in source order
    pub fields: Vec<DataField>,
}

/// A variable data field.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    pub tag: String,
    pub indicator1: char,
    pub indicator2: char,
    pub subfields: Vec<Subfield>,
}

/// A coded subfield.
#[derive(Debug, Clone, PartialEq)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: DataField) {
        self.fields.push(field);
    }

    pub fn add_control_field(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.control_fields.push((tag.into(), value.into()));
    }

    /// Value of the first control field with `tag`.
    pub fn control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// All data fields with `tag`, in source order.
    pub fn fields_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DataField> + 'a {
        self.fields.iter().filter(move |f| f.tag == tag)
    }
}

impl DataField {
    pub fn new(tag: impl Into<String>, indicator1: char, indicator2: char) -> Self {
        Self {
            tag: tag.into(),
            indicator1,
            indicator2,
            subfields: Vec::new(),
        }
    }

    pub fn add_subfield(&mut self, code: char, value: impl Into<String>) {
        self.subfields.push(Subfield {
            code,
            value: value.into(),
        });
    }

    /// Builder-style [`DataField::add_subfield`].
    pub fn with_subfield(mut self, code: char, value: impl Into<String>) -> Self {
        self.add_subfield(code, value);
        self
    }

    /// Values of every subfield with `code`, in source order.
    pub fn subfield_values(&self, code: char) -> impl Iterator<Item = &str> + '_ {
        self.subfields
            .iter()
            .filter(move |s| s.code == code)
            .map(|s| s.value.as_str())
    }

    /// Value of the first subfield with `code`.
    pub fn subfield(&self, code: char) -> Option<&str> {
        self.subfield_values(code).next()
    }
}

// =============================================================================
// MARCXML deserialization
// =============================================================================

#[derive(Debug, Deserialize)]
struct MarcxmlCollection {
    #[serde(default, rename = "record")]
    records: Vec<MarcxmlRecord>,
}

#[derive(Debug, Deserialize)]
struct MarcxmlRecord {
    #[serde(default)]
    controlfield: Vec<MarcxmlControlField>,
    #[serde(default)]
    datafield: Vec<MarcxmlDataField>,
}

#[derive(Debug, Deserialize)]
struct MarcxmlControlField {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(default, rename = "$text")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct MarcxmlDataField {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(default, rename = "@ind1")]
    ind1: String,
    #[serde(default, rename = "@ind2")]
    ind2: String,
    #[serde(default)]
    subfield: Vec<MarcxmlSubfield>,
}

#[derive(Debug, Deserialize)]
struct MarcxmlSubfield {
    #[serde(rename = "@code")]
    code: String,
    #[serde(default, rename = "$text")]
    value: String,
}

/// Comments, CDATA sections, processing instructions and declarations, or a
/// start/end tag with `1` = `/` for end tags, `2` = local name, `3` = attributes.
static MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>|<[?!][^>]*>|<(/?)(?:[A-Za-z_][\w.\-]*:)?([A-Za-z_][\w.\-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#,
    )
    .unwrap()
});

static XMLNS_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s+xmlns(?::[\w.\-]+)?\s*=\s*("[^"]*"|'[^']*')"#).unwrap());

/// Strip namespace declarations and element prefixes from tags only:
/// `<marc:record xmlns:marc="...">` becomes `<record>`.
fn strip_namespaces(xml: &str) -> String {
    MARKUP
        .replace_all(xml, |caps: &Captures| match caps.get(2) {
            Some(name) => format!(
                "<{}{}{}>",
                &caps[1],
                name.as_str(),
                XMLNS_DECL.replace_all(&caps[3], "")
            ),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Local name of the first start tag, ignoring prolog and comments.
fn root_element(xml: &str) -> Option<&str> {
    MARKUP
        .captures_iter(xml)
        .find(|caps| caps.get(2).is_some() && caps[1].is_empty())
        .and_then(|caps| caps.get(2))
        .map(|name| name.as_str())
}

/// Parse a MARCXML document into records, in document order.
pub fn parse_marcxml(xml: &str) -> FetchResult<Vec<Record>> {
    let cleaned = strip_namespaces(xml);

    let root = root_element(&cleaned)
        .ok_or_else(|| FetchError::Xml("document has no root element".to_string()))?;

    let raw_records = match root {
        "collection" => {
            let collection: MarcxmlCollection = xml_from_str(&cleaned)
                .map_err(|e| FetchError::Xml(format!("failed to parse collection: {}", e)))?;
            collection.records
        }
        "record" => {
            let record: MarcxmlRecord = xml_from_str(&cleaned)
                .map_err(|e| FetchError::Xml(format!("failed to parse record: {}", e)))?;
            vec![record]
        }
        other => {
            return Err(FetchError::Xml(format!(
                "unexpected root element <{}>, expected <collection> or <record>",
                other
            )))
        }
    };

    raw_records.into_iter().map(into_record).collect()
}

fn into_record(raw: MarcxmlRecord) -> FetchResult<Record> {
    let mut record = Record::new();

    for cf in raw.controlfield {
        record.add_control_field(cf.tag, cf.value);
    }

    for df in raw.datafield {
        let ind1 = df.ind1.chars().next().unwrap_or(' ');
        let ind2 = df.ind2.chars().next().unwrap_or(' ');
        let mut field = DataField::new(df.tag, ind1, ind2);

        for sf in df.subfield {
            let code = sf.code.chars().next().ok_or_else(|| {
                FetchError::Xml(format!("subfield without code in field {}", field.tag))
            })?;
            field.add_subfield(code, sf.value);
        }

        record.add_field(field);
    }

    Ok(record)
}
