//! Flat-map normalisation of JSON and XML documents.
//!
//! Request bodies and response templates are both reduced to one shape: a
//! single-level map from a canonical path (`a.b[0].c`) to a typed scalar.
//! Response templates additionally get a placeholder rendition in which
//! every leaf value is replaced by its `"{{KEY}}"` token.
//!
//! ## Module Structure
//!
//! - `types`: `DataType`, `ScalarValue`, `FlatValue`, `ContentType`, `FlattenError`
//! - `json`: JSON walker
//! - `xml`: XML walker built on `sxd-document`

mod json;
mod types;
mod xml;

#[allow(unused_imports)]
pub use json::{flatten_json, flatten_value};
pub use types::{ContentType, DataType, FlatMap, FlatValue, FlattenError, ScalarValue};
#[allow(unused_imports)]
pub use xml::flatten_xml;

/// Result of flattening a response template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placeholders {
    /// Leaf values discovered in the template (used as parameter defaults).
    pub values: FlatMap,
    /// The template with every leaf replaced by its token.
    pub template: String,
}

/// Flatten a document of the given content type.
pub fn flatten(document: &str, content_type: ContentType) -> Result<FlatMap, FlattenError> {
    match content_type {
        ContentType::Json => json::flatten_json(document),
        ContentType::Xml => xml::flatten_xml(document),
    }
}

/// Flatten a template and produce its tokenized rendition.
pub fn extract_placeholders(
    template: &str,
    content_type: ContentType,
) -> Result<Placeholders, FlattenError> {
    match content_type {
        ContentType::Json => json::json_placeholders(template),
        ContentType::Xml => xml::xml_placeholders(template),
    }
}

/// The exact text substituted for `key`, quotes included.
pub fn placeholder_token(key: &str) -> String {
    format!("\"{{{{{key}}}}}\"")
}
