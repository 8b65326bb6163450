//! XML flattening and placeholder template generation.
//!
//! Paths start at the root element and join element names with `.`. Sibling
//! elements sharing a name are indexed (`item[0]`, `item[1]`). Only element
//! text is flattened; attributes are carried through templates untouched.
//! Keys use local names, while templates keep namespace prefixes and
//! declarations so the served document has the source's shape.

use super::json::{child_key, index_key};
use super::types::{DataType, FlatMap, FlatValue, FlattenError, ScalarValue};
use super::Placeholders;
use std::collections::{BTreeMap, HashMap};
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};
use sxd_document::parser;

/// Flatten an XML document. A blank document yields an empty map.
pub fn flatten_xml(document: &str) -> Result<FlatMap, FlattenError> {
    Ok(xml_placeholders(document)?.values)
}

/// Flatten an XML template and rewrite every leaf text as its `"{{KEY}}"` token.
pub fn xml_placeholders(template: &str) -> Result<Placeholders, FlattenError> {
    if template.trim().is_empty() {
        return Ok(Placeholders::default());
    }

    let package = parser::parse(template).map_err(|e| FlattenError::Xml(format!("{e:?}")))?;
    let document = package.as_document();

    let root = document
        .root()
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfRoot::Element(e) => Some(e),
            _ => None,
        })
        .ok_or_else(|| FlattenError::Xml("document has no root element".to_string()))?;

    let mut values = FlatMap::new();
    let mut out = String::new();
    let name = root.name().local_part().to_string();
    walk(root, &name, &Scope::default(), &mut values, &mut out);

    Ok(Placeholders {
        values,
        template: out,
    })
}

/// Namespace bindings already written by an ancestor's start tag.
#[derive(Debug, Clone, Default)]
struct Scope<'d> {
    prefixes: BTreeMap<&'d str, &'d str>,
    default: Option<&'d str>,
}

fn walk<'d>(
    element: Element<'d>,
    path: &str,
    scope: &Scope<'d>,
    values: &mut FlatMap,
    out: &mut String,
) {
    let (name, scope) = open_tag(element, scope, out);

    let children: Vec<Element<'_>> = element
        .children()
        .into_iter()
        .filter_map(|c| match c {
            ChildOfElement::Element(e) => Some(e),
            _ => None,
        })
        .collect();

    if children.is_empty() {
        let text: String = element
            .children()
            .into_iter()
            .filter_map(|c| match c {
                ChildOfElement::Text(t) => Some(t.text().to_string()),
                _ => None,
            })
            .collect();
        values.insert(
            path.to_string(),
            FlatValue::new(ScalarValue::Str(text.trim().to_string()), DataType::XmlString),
        );
        out.push_str(&format!("\"{{{{{path}}}}}\""));
    } else {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for child in &children {
            *totals.entry(child.name().local_part()).or_default() += 1;
        }
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for child in children {
            let child_name = child.name().local_part();
            let base = child_key(path, child_name);
            let child_path = if totals.get(child_name).copied().unwrap_or(0) > 1 {
                let slot = seen.entry(child_name).or_default();
                let key = index_key(&base, *slot);
                *slot += 1;
                key
            } else {
                base
            };
            walk(child, &child_path, &scope, values, out);
        }
    }

    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

/// Write the start tag with its source prefix, re-declaring every namespace
/// binding the element introduces. Returns the tag name and the scope its
/// children see.
fn open_tag<'d>(
    element: Element<'d>,
    scope: &Scope<'d>,
    out: &mut String,
) -> (String, Scope<'d>) {
    let name = qualified(element.preferred_prefix(), element.name().local_part());
    let mut inner = scope.clone();
    out.push('<');
    out.push_str(&name);

    if element.preferred_prefix().is_none() {
        let uri = element.name().namespace_uri();
        if uri != scope.default {
            push_attribute(out, "xmlns", uri.unwrap_or(""));
            inner.default = uri;
        }
    }

    let mut declared: Vec<_> = element
        .namespaces_in_scope()
        .into_iter()
        .filter(|ns| ns.prefix() != "xml" && scope.prefixes.get(ns.prefix()) != Some(&ns.uri()))
        .collect();
    declared.sort_by_key(|ns| ns.prefix());
    for ns in declared {
        push_attribute(out, &format!("xmlns:{}", ns.prefix()), ns.uri());
        inner.prefixes.insert(ns.prefix(), ns.uri());
    }

    for attr in element.attributes() {
        let attr_name = qualified(attr.preferred_prefix(), attr.name().local_part());
        push_attribute(out, &attr_name, attr.value());
    }
    out.push('>');
    (name, inner)
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_repeated_siblings() {
        let flat = flatten_xml(
            "<order><id>12</id><item><sku>A</sku></item><item><sku>B</sku></item></order>",
        )
        .unwrap();

        assert_eq!(flat["order.id"].value, ScalarValue::Str("12".into()));
        assert_eq!(flat["order.id"].datatype, DataType::XmlString);
        assert_eq!(flat["order.item[0].sku"].value, ScalarValue::Str("A".into()));
        assert_eq!(flat["order.item[1].sku"].value, ScalarValue::Str("B".into()));
    }

    #[test]
    fn test_placeholder_template() {
        let p = xml_placeholders(r#"<user kind="a"><name>Ann</name></user>"#).unwrap();
        assert_eq!(p.template, r#"<user kind="a"><name>"{{user.name}}"</name></user>"#);
        assert_eq!(p.values.len(), 1);
    }

    #[test]
    fn test_placeholder_template_keeps_namespaces() {
        let envelope = concat!(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<soap:Body><m:Price xmlns:m="urn:x" m:currency="EUR">10</m:Price></soap:Body>"#,
            "</soap:Envelope>"
        );
        let p = xml_placeholders(envelope).unwrap();
        assert_eq!(
            p.template,
            concat!(
                r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
                r#"<soap:Body><m:Price xmlns:m="urn:x" m:currency="EUR">"{{Envelope.Body.Price}}"</m:Price>"#,
                "</soap:Body></soap:Envelope>"
            )
        );
        assert_eq!(p.values["Envelope.Body.Price"].value, ScalarValue::Str("10".into()));
    }

    #[test]
    fn test_placeholder_template_keeps_default_namespace() {
        let p = xml_placeholders(r#"<feed xmlns="urn:feed"><id>1</id></feed>"#).unwrap();
        assert_eq!(p.template, r#"<feed xmlns="urn:feed"><id>"{{feed.id}}"</id></feed>"#);
    }

    #[test]
    fn test_malformed_xml_rejected() {
        assert!(matches!(flatten_xml("<a><b></a>"), Err(FlattenError::Xml(_))));
    }
}
