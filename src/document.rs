//! Document tree for parsed XML payloads.
//!
//! An XML payload is converted into a generic tree of mappings, sequences and
//! scalar strings before any path expression is evaluated against it. The tree
//! shape follows the usual untyped XML-to-map conventions:
//!
//! - the root element becomes the single key of the top-level mapping
//! - an element without attributes or child elements becomes a scalar string
//! - attributes and child elements become mapping keys (local names only)
//! - a child name that repeats becomes a sequence, in document order
//! - text mixed with attributes or children is stored under the empty key `""`
//! - `xsi:nil="true"` elements become [`Node::Empty`]

use indexmap::map::Entry;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Key under which mixed text content is stored
pub const TEXT_KEY: &str = "";

/// Leading `<?xml ... ?>` declaration.
static XML_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\?xml[^>]*\?>").expect("valid regex"));

/// A node of a parsed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Mapping(IndexMap<String, Node>),
    Sequence(Vec<Node>),
    Scalar(String),
    Empty,
}

impl Node {
    /// The canonical "not found" value: an empty mapping.
    pub fn empty_mapping() -> Self {
        Node::Mapping(IndexMap::new())
    }

    pub fn is_empty_mapping(&self) -> bool {
        matches!(self, Node::Mapping(map) if map.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key when this node is a mapping.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Mapping(map) => map.get(key),
            _ => None,
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(value)
    }
}

impl From<Vec<String>> for Node {
    fn from(values: Vec<String>) -> Self {
        Node::Sequence(values.into_iter().map(Node::Scalar).collect())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Scalar(s) => write!(f, "{}", s),
            Node::Empty => write!(f, "null"),
            other => {
                let json = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

/// Error type for document parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The payload is not well-formed XML
    Xml(String),
    /// The payload is not textual
    NotText(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Xml(msg) => write!(f, "{}", msg),
            ParseError::NotText(kind) => write!(f, "Expected an XML string payload, got {}", kind),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<roxmltree::Error> for ParseError {
    fn from(err: roxmltree::Error) -> Self {
        ParseError::Xml(err.to_string())
    }
}

/// Remove every `<?xml ... ?>` declaration from the payload.
pub fn strip_xml_header(xml: &str) -> Cow<'_, str> {
    XML_HEADER.replace_all(xml, "")
}

/// Parse an XML string into a document tree.
///
/// # Example
///
/// ```
/// use xmlsift::document::{parse_xml, Node};
///
/// let tree = parse_xml("<root><item>1</item><item>2</item></root>").unwrap();
/// let items = tree.get("root").and_then(|root| root.get("item")).unwrap();
/// assert_eq!(items, &Node::from(vec!["1".to_string(), "2".to_string()]));
/// ```
pub fn parse_xml(xml: &str) -> Result<Node, ParseError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(xml, options)?;
    let root = document.root_element();

    let mut tree = IndexMap::new();
    tree.insert(root.tag_name().name().to_string(), convert_element(root));
    Ok(Node::Mapping(tree))
}

fn is_nil(element: roxmltree::Node<'_, '_>) -> bool {
    element
        .attribute((XSI_NAMESPACE, "nil"))
        .is_some_and(|value| value.trim() == "true")
}

fn convert_element(element: roxmltree::Node<'_, '_>) -> Node {
    if is_nil(element) {
        return Node::Empty;
    }

    let attributes: Vec<_> = element
        .attributes()
        .filter(|attr| !(attr.namespace() == Some(XSI_NAMESPACE) && attr.name() == "nil"))
        .collect();
    let has_child_elements = element.children().any(|child| child.is_element());

    let text: String = element
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect();

    if attributes.is_empty() && !has_child_elements {
        return Node::Scalar(text);
    }

    let mut map = IndexMap::new();
    for attr in attributes {
        insert_repeated(&mut map, attr.name(), Node::Scalar(attr.value().to_string()));
    }
    for child in element.children().filter(|child| child.is_element()) {
        insert_repeated(&mut map, child.tag_name().name(), convert_element(child));
    }

    let text = text.trim();
    if !text.is_empty() {
        insert_repeated(&mut map, TEXT_KEY, Node::Scalar(text.to_string()));
    }

    Node::Mapping(map)
}

/// Insert a value, promoting a repeated key to a sequence.
fn insert_repeated(map: &mut IndexMap<String, Node>, name: &str, value: Node) {
    match map.entry(name.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            Node::Sequence(items) => items.push(value),
            existing => {
                let first = std::mem::replace(existing, Node::Empty);
                *existing = Node::Sequence(vec![first, value]);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_json(node: &Node) -> serde_json::Value {
        serde_json::to_value(node).unwrap()
    }

    #[test]
    fn test_root_is_wrapped() {
        let tree = parse_xml("<Customers><Name>Maria</Name></Customers>").unwrap();
        assert_eq!(to_json(&tree), json!({"Customers": {"Name": "Maria"}}));
    }

    #[test]
    fn test_repeated_children_become_sequence() {
        let xml = "<Customer><ContactName>Maria</ContactName><ContactName>Anna</ContactName><ContactTitle>Owner</ContactTitle></Customer>";
        let tree = parse_xml(xml).unwrap();

        assert_eq!(
            to_json(&tree),
            json!({"Customer": {"ContactName": ["Maria", "Anna"], "ContactTitle": "Owner"}})
        );
    }

    #[test]
    fn test_attributes_and_mixed_text() {
        let tree = parse_xml(r#"<order id="7">rush<item sku="A1">pen</item></order>"#).unwrap();

        assert_eq!(
            to_json(&tree),
            json!({"order": {"id": "7", "item": {"sku": "A1", "": "pen"}, "": "rush"}})
        );
    }

    #[test]
    fn test_empty_element_is_empty_string() {
        let tree = parse_xml("<a><b/></a>").unwrap();
        assert_eq!(tree.get("a").and_then(|a| a.get("b")), Some(&Node::from("")));
    }

    #[test]
    fn test_xsi_nil_is_empty() {
        let xml = r#"<a xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><b xsi:nil="true"/></a>"#;
        let tree = parse_xml(xml).unwrap();
        assert_eq!(tree.get("a").and_then(|a| a.get("b")), Some(&Node::Empty));
    }

    #[test]
    fn test_namespace_prefixes_dropped() {
        let xml = r#"<ns:a xmlns:ns="urn:x"><ns:b>1</ns:b></ns:a>"#;
        let tree = parse_xml(xml).unwrap();
        assert_eq!(to_json(&tree), json!({"a": {"b": "1"}}));
    }

    #[test]
    fn test_malformed_xml_fails() {
        let result = parse_xml("<unclosed>");
        assert!(matches!(result, Err(ParseError::Xml(_))));
    }

    #[test]
    fn test_strip_xml_header() {
        let xml = r#"<?xml version="1.0" encoding="UTF-16"?><a>1</a>"#;
        assert_eq!(strip_xml_header(xml), "<a>1</a>");
        assert_eq!(strip_xml_header("<a>1</a>"), "<a>1</a>");
    }

    #[test]
    fn test_display() {
        assert_eq!(Node::from("x").to_string(), "x");
        assert_eq!(Node::Empty.to_string(), "null");
        assert_eq!(Node::empty_mapping().to_string(), "{}");
        assert_eq!(Node::from(vec!["a".to_string()]).to_string(), r#"["a"]"#);
    }
}
