//! Path expressions and tree navigation.
//!
//! A path expression addresses a value in a document tree and optionally
//! renames, filters and trims it:
//!
//! ```text
//! lookup.path<alias><filter-regex><extract-regex>
//! ```
//!
//! The bracket groups are positional. A filter can only be given once an
//! alias is present, and an extract pattern only after a filter.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::Node;
use crate::postprocess::{post_process, ExtractPattern, FilterPattern};

static PATH_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^<]*)(?:<([^>]+)>)?(?:<([^>]+)>)?(?:<([^>]+)>)?").expect("valid regex")
});

/// Delimiter used when none is configured: a literal dot.
pub const DEFAULT_DELIMITER: &str = r"\.";

/// A parsed path expression
#[derive(Debug, Clone)]
pub struct PathSpec {
    /// The expression as configured
    pub raw: String,
    /// Delimiter-separated field names to walk
    pub lookup_path: String,
    /// Key under which the result lands in the output map
    pub output_id: String,
    pub filter: Option<FilterPattern>,
    pub extract: Option<ExtractPattern>,
}

impl PathSpec {
    /// Parse a path expression.
    ///
    /// Never fails. Expressions that do not yield a lookup path are used
    /// verbatim as both lookup path and output id, and patterns that do not
    /// compile are dropped with a warning.
    ///
    /// This means `<alias>` alone is not an alias for the document root: its
    /// output id is `<alias>` and it looks up a field literally named so,
    /// which yields an empty mapping.
    ///
    /// # Example
    ///
    /// ```
    /// use xmlsift::PathSpec;
    ///
    /// let spec = PathSpec::parse("Customers.Customer.Phone<phone><\\d+.*>");
    /// assert_eq!(spec.lookup_path, "Customers.Customer.Phone");
    /// assert_eq!(spec.output_id, "phone");
    /// assert!(spec.filter.is_some());
    /// assert!(spec.extract.is_none());
    /// ```
    pub fn parse(expression: &str) -> Self {
        let Some(captures) = PATH_EXPRESSION.captures(expression) else {
            return Self::verbatim(expression);
        };

        let lookup_path = match captures.get(1) {
            Some(m) if !m.as_str().is_empty() => m.as_str().to_string(),
            _ => return Self::verbatim(expression),
        };

        let output_id = captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| lookup_path.clone());

        let filter = captures.get(3).and_then(|m| {
            FilterPattern::new(m.as_str())
                .map_err(|e| {
                    tracing::warn!(
                        "Ignoring invalid filter pattern '{}' in '{}': {}",
                        m.as_str(),
                        expression,
                        e
                    )
                })
                .ok()
        });

        let extract = captures.get(4).and_then(|m| {
            ExtractPattern::new(m.as_str())
                .map_err(|e| {
                    tracing::warn!(
                        "Ignoring invalid extract pattern '{}' in '{}': {}",
                        m.as_str(),
                        expression,
                        e
                    )
                })
                .ok()
        });

        Self {
            raw: expression.to_string(),
            lookup_path,
            output_id,
            filter,
            extract,
        }
    }

    fn verbatim(expression: &str) -> Self {
        Self {
            raw: expression.to_string(),
            lookup_path: expression.to_string(),
            output_id: expression.to_string(),
            filter: None,
            extract: None,
        }
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Regex that splits a lookup path into field names
#[derive(Debug, Clone)]
pub struct Delimiter(Regex);

impl Delimiter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Split a lookup path into field names.
    ///
    /// Consecutive delimiters yield empty field names, but trailing empty
    /// fields are dropped: `a.b.` walks the same path as `a.b`. A path with
    /// no delimiter at all is a single field, even when empty.
    pub fn split<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut fields: Vec<&str> = self.0.split(path).collect();
        if fields.len() > 1 {
            while fields.last().is_some_and(|field| field.is_empty()) {
                fields.pop();
            }
        }
        fields.into_iter()
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self(Regex::new(DEFAULT_DELIMITER).expect("valid regex"))
    }
}

/// Walk `tree` along `lookup_path`.
///
/// A step on a sequence projects the field out of every mapping element
/// (non-mappings and missing values are dropped). A step on a mapping whose
/// key is missing, or on anything else, ends the walk with an empty mapping.
pub fn navigate(tree: &Node, lookup_path: &str, delimiter: &Delimiter) -> Node {
    let mut current = Cow::Borrowed(tree);

    for field in delimiter.split(lookup_path) {
        let next = match current {
            Cow::Borrowed(node) => step(node, field),
            Cow::Owned(ref node) => step(node, field).map(|n| Cow::Owned(n.into_owned())),
        };

        match next {
            Some(node) => current = node,
            None => return Node::empty_mapping(),
        }
    }

    current.into_owned()
}

fn step<'a>(node: &'a Node, field: &str) -> Option<Cow<'a, Node>> {
    match node {
        Node::Sequence(items) => {
            let projected = items
                .iter()
                .filter_map(|item| match item {
                    Node::Mapping(map) => map.get(field),
                    _ => None,
                })
                .filter(|value| !matches!(value, Node::Empty))
                .cloned()
                .collect();
            Some(Cow::Owned(Node::Sequence(projected)))
        }
        Node::Mapping(map) => match map.get(field) {
            None | Some(Node::Empty) => None,
            Some(value) => Some(Cow::Borrowed(value)),
        },
        Node::Scalar(_) | Node::Empty => None,
    }
}

/// Trait for trees that path expressions can be evaluated against
pub trait Extractor {
    /// Navigate to the spec's lookup path and post-process the result.
    fn extract(&self, spec: &PathSpec, delimiter: &Delimiter) -> Node;
}

impl Extractor for Node {
    fn extract(&self, spec: &PathSpec, delimiter: &Delimiter) -> Node {
        let located = navigate(self, &spec.lookup_path, delimiter);
        post_process(located, spec.filter.as_ref(), spec.extract.as_ref())
    }
}
