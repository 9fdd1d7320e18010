//! Extraction pipeline: raw XML in, flat output map out.
//!
//! For every configured path expression the pipeline navigates the parsed
//! document, post-processes the located value and stores it under the
//! expression's output id. The original payload and a creation timestamp are
//! added last.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use indexmap::IndexMap;

use crate::document::{parse_xml, strip_xml_header, Node};
use crate::extraction::{Delimiter, Extractor, PathSpec};
use crate::runtime::config_loader::{ConfigError, TransformConfig};

/// Output key holding the creation timestamp
pub const CREATED_KEY: &str = "created";

/// Format of the creation timestamp (`yyyy-MM-dd HH:mm:ss`)
pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flat map produced for one document
pub type OutputMap = IndexMap<String, Node>;

/// Error type for transform operations
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The payload is missing, not text, or not well-formed XML
    InvalidArgument(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for TransformError {}

/// Pre-parsed path expressions plus the settings needed to apply them.
///
/// Immutable once built; share it between threads freely.
#[derive(Debug, Clone)]
pub struct XmlExtractor {
    specs: Vec<PathSpec>,
    delimiter: Delimiter,
    xml_map_key: String,
}

impl XmlExtractor {
    pub fn new(specs: Vec<PathSpec>, delimiter: Delimiter, xml_map_key: impl Into<String>) -> Self {
        Self {
            specs,
            delimiter,
            xml_map_key: xml_map_key.into(),
        }
    }

    /// Parse every configured path expression once.
    ///
    /// # Example
    /// ```
    /// use xmlsift::{TransformConfig, XmlExtractor};
    ///
    /// let config = TransformConfig::new(["order.id<id>"]).with_xml_map_key("blob");
    /// let extractor = XmlExtractor::from_config(&config).unwrap();
    ///
    /// let output = extractor.transform("<order><id>42</id></order>").unwrap();
    /// assert_eq!(output["id"].as_str(), Some("42"));
    /// assert!(output.contains_key("blob"));
    /// assert!(output.contains_key("created"));
    /// ```
    pub fn from_config(config: &TransformConfig) -> Result<Self, ConfigError> {
        let delimiter = config.compile_delimiter()?;
        let specs = config.keys.iter().map(|key| PathSpec::parse(key)).collect();

        Ok(Self::new(specs, delimiter, config.xml_map_key.clone()))
    }

    pub fn specs(&self) -> &[PathSpec] {
        &self.specs
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    pub fn xml_map_key(&self) -> &str {
        &self.xml_map_key
    }

    /// Transform one XML payload, stamping it with the local time.
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidArgument`] if the payload is not
    /// well-formed XML. Nothing else fails: missing values become empty
    /// mappings.
    pub fn transform(&self, raw_xml: &str) -> Result<OutputMap, TransformError> {
        self.transform_at(raw_xml, Local::now())
    }

    /// Transform one XML payload with an explicit creation time.
    pub fn transform_at<Tz>(
        &self,
        raw_xml: &str,
        created: DateTime<Tz>,
    ) -> Result<OutputMap, TransformError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let tree = parse_document(raw_xml)?;

        let mut output: OutputMap = self
            .specs
            .iter()
            .map(|spec| {
                let value = tree.extract(spec, &self.delimiter);
                tracing::debug!("Extracted '{}' from '{}'", spec.output_id, spec.lookup_path);
                (spec.output_id.clone(), value)
            })
            .collect();

        output.insert(self.xml_map_key.clone(), Node::from(raw_xml));
        output.insert(
            CREATED_KEY.to_string(),
            Node::Scalar(created.format(CREATED_FORMAT).to_string()),
        );

        Ok(output)
    }
}

/// Strip the XML declaration and parse the rest into a document tree.
fn parse_document(raw_xml: &str) -> Result<Node, TransformError> {
    parse_xml(&strip_xml_header(raw_xml)).map_err(|e| {
        tracing::debug!("Rejecting payload that is not well-formed XML: {}", e);
        TransformError::InvalidArgument(e.to_string())
    })
}

/// One-shot transform without a prepared [`XmlExtractor`].
///
/// Parses `keys` on every call; prefer [`XmlExtractor`] when the same keys
/// are applied to many documents.
pub fn xml_to_map<S: AsRef<str>>(
    raw_xml: &str,
    keys: &[S],
    delimiter: &Delimiter,
    xml_map_key: &str,
) -> Result<OutputMap, TransformError> {
    let specs = keys.iter().map(|key| PathSpec::parse(key.as_ref())).collect();
    XmlExtractor::new(specs, delimiter.clone(), xml_map_key).transform(raw_xml)
}
