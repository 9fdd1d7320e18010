//! Filtering, extraction and deduplication of navigated values.
//!
//! Both steps only act on sequences and always build new sequences. Values
//! that are not sequences pass through untouched.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use crate::document::Node;

/// Pattern that a candidate string must match in full
#[derive(Clone)]
pub struct FilterPattern {
    source: String,
    anchored: Regex,
}

impl FilterPattern {
    /// Compile `pattern` for whole-string matching.
    ///
    /// The pattern must be valid on its own before it is anchored, so that
    /// unbalanced input like `a)|(b` cannot escape the anchors.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern)?;
        let anchored = Regex::new(&format!(r"\A(?:{})\z", pattern))?;
        Ok(Self {
            source: pattern.to_string(),
            anchored,
        })
    }

    /// Pattern as configured, without anchoring.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, candidate: &str) -> bool {
        self.anchored.is_match(candidate)
    }
}

impl fmt::Debug for FilterPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FilterPattern").field(&self.source).finish()
    }
}

/// Pattern whose first match anywhere in a string replaces that string
#[derive(Debug, Clone)]
pub struct ExtractPattern(Regex);

impl ExtractPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// First matching substring, if any.
    pub fn first_match<'h>(&self, haystack: &'h str) -> Option<&'h str> {
        self.0.find(haystack).map(|m| m.as_str())
    }
}

/// Drop repeated strings, keeping the first occurrence of each.
pub fn dedup_preserving_order<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Keep the string elements of a sequence that fully match `pattern`, deduplicated.
///
/// Non-string elements are discarded. Non-sequences are returned unchanged.
pub fn filter_and_dedup(value: Node, pattern: &FilterPattern) -> Node {
    match value {
        Node::Sequence(items) => {
            let kept = items.into_iter().filter_map(|item| match item {
                Node::Scalar(s) if pattern.is_full_match(&s) => Some(s),
                _ => None,
            });
            Node::from(dedup_preserving_order(kept))
        }
        other => other,
    }
}

/// Replace every string of a sequence with the first match of `pattern`.
///
/// Strings without a match are dropped and the results deduplicated. Only
/// sequences made up entirely of strings are touched.
pub fn extract_and_dedup(value: Node, pattern: &ExtractPattern) -> Node {
    let items = match value {
        Node::Sequence(items) => items,
        other => return other,
    };

    if !items.iter().all(|item| matches!(item, Node::Scalar(_))) {
        return Node::Sequence(items);
    }

    let extracted = items.iter().filter_map(|item| {
        item.as_str()
            .and_then(|s| pattern.first_match(s))
            .map(str::to_string)
    });
    Node::from(dedup_preserving_order(extracted))
}

/// Apply the optional filter, then the optional extract step.
pub fn post_process(
    value: Node,
    filter: Option<&FilterPattern>,
    extract: Option<&ExtractPattern>,
) -> Node {
    let value = match filter {
        Some(pattern) => filter_and_dedup(value, pattern),
        None => value,
    };

    match extract {
        Some(pattern) => extract_and_dedup(value, pattern),
        None => value,
    }
}
