//! Host record envelope and the XML-to-JSON record transform.
//!
//! A record carries a key and a value slot plus metadata. The transform reads
//! the XML payload from one slot and writes the output map back into the same
//! slot, leaving everything else as it was.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::ParseError;
use crate::runtime::config_loader::{ConfigError, TransformConfig};
use crate::runtime::pipeline::{TransformError, XmlExtractor};
use crate::serialization::to_json_object;

/// Short description of the transform
pub const OVERVIEW_DOC: &str = "Generate Json from XML blob with and XML field keys";

/// Which record slot holds the XML payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSlot {
    Key,
    Value,
}

impl fmt::Display for RecordSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSlot::Key => write!(f, "key"),
            RecordSlot::Value => write!(f, "value"),
        }
    }
}

/// A record as handed over by the host pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub topic: String,

    pub partition: Option<i32>,

    /// Schema companion of the key, opaque to the transform
    pub key_schema: Option<serde_json::Value>,

    pub key: Option<serde_json::Value>,

    /// Schema companion of the value, opaque to the transform
    pub value_schema: Option<serde_json::Value>,

    pub value: Option<serde_json::Value>,

    pub timestamp: Option<DateTime<Utc>>,
}

impl Record {
    /// Create a record with only a value.
    pub fn new(topic: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            key_schema: None,
            key: None,
            value_schema: None,
            value: Some(value),
            timestamp: None,
        }
    }

    pub fn with_key(mut self, key: serde_json::Value) -> Self {
        self.key = Some(key);
        self
    }

    pub fn slot(&self, slot: RecordSlot) -> Option<&serde_json::Value> {
        match slot {
            RecordSlot::Key => self.key.as_ref(),
            RecordSlot::Value => self.value.as_ref(),
        }
    }

    /// Copy of this record with `slot` replaced and its schema cleared.
    pub fn with_slot(&self, slot: RecordSlot, updated: serde_json::Value) -> Self {
        let mut record = self.clone();
        match slot {
            RecordSlot::Key => {
                record.key_schema = None;
                record.key = Some(updated);
            }
            RecordSlot::Value => {
                record.value_schema = None;
                record.value = Some(updated);
            }
        }
        record
    }
}

/// Record transform turning an XML payload into a JSON object
#[derive(Debug, Clone)]
pub struct XmlToJson {
    slot: RecordSlot,
    extractor: XmlExtractor,
}

impl XmlToJson {
    pub fn new(slot: RecordSlot, extractor: XmlExtractor) -> Self {
        Self { slot, extractor }
    }

    /// Build the transform for one slot from configuration.
    pub fn configure(slot: RecordSlot, config: &TransformConfig) -> Result<Self, ConfigError> {
        let extractor = XmlExtractor::from_config(config)?;
        tracing::info!(
            "Configured XML transform on record {} with {} keys",
            slot,
            extractor.specs().len()
        );
        Ok(Self::new(slot, extractor))
    }

    pub fn slot(&self) -> RecordSlot {
        self.slot
    }

    pub fn extractor(&self) -> &XmlExtractor {
        &self.extractor
    }

    pub fn config_doc(&self) -> &'static str {
        OVERVIEW_DOC
    }

    /// Transform the configured slot of `record`.
    ///
    /// # Errors
    /// Fails with [`TransformError::InvalidArgument`] if the slot is empty,
    /// does not hold a string, or the string is not well-formed XML.
    pub fn apply(&self, record: &Record) -> Result<Record, TransformError> {
        let payload = match record.slot(self.slot) {
            Some(serde_json::Value::String(xml)) => xml,
            other => {
                let kind = other.map_or("null", json_kind);
                let err = ParseError::NotText(kind.to_string());
                tracing::debug!("Record {} holds no XML payload: {}", self.slot, err);
                return Err(TransformError::InvalidArgument(err.to_string()));
            }
        };

        let output = self.extractor.transform(payload)?;
        let object = to_json_object(output)
            .map_err(|e| TransformError::InvalidArgument(e.to_string()))?;

        Ok(record.with_slot(self.slot, serde_json::Value::Object(object)))
    }

    /// Release resources. The transform holds none.
    pub fn close(&self) {}
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const XML: &str = "<Customers><Customer><ContactName>Maria</ContactName><ContactTitle>Owner</ContactTitle></Customer></Customers>";

    fn config() -> TransformConfig {
        TransformConfig::new([
            "Customers.Customer.ContactName<ContactName>",
            "Customers.Customer.ContactTitle<ContactTitle>",
            "Customers.Customer.ContactName",
        ])
        .with_xml_map_key("blob")
    }

    fn record() -> Record {
        let mut record = Record::new("customers", json!(XML)).with_key(json!(XML));
        record.partition = Some(3);
        record.key_schema = Some(json!("string"));
        record.value_schema = Some(json!("string"));
        record
    }

    #[test]
    fn test_value_slot() {
        let transform = XmlToJson::configure(RecordSlot::Value, &config()).unwrap();
        let source = record();

        let result = transform.apply(&source).unwrap();

        assert_eq!(result.key, source.key);
        assert_eq!(result.key_schema, source.key_schema);
        assert_eq!(result.value_schema, None);
        assert_eq!(result.topic, "customers");
        assert_eq!(result.partition, Some(3));

        let value = result.value.unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("ContactName"));
        assert!(object.contains_key("ContactTitle"));
        assert!(object.contains_key("Customers.Customer.ContactName"));
        assert!(!object.contains_key("Customers.Customer.ContactTitle"));
        assert_eq!(object["blob"], json!(XML));
    }

    #[test]
    fn test_key_slot() {
        let transform = XmlToJson::configure(RecordSlot::Key, &config()).unwrap();
        let source = record();

        let result = transform.apply(&source).unwrap();

        assert_eq!(result.value, source.value);
        assert_eq!(result.value_schema, source.value_schema);
        assert_eq!(result.key_schema, None);
        assert!(result.key.unwrap().is_object());
    }

    #[test]
    fn test_operating_slot() {
        let source = Record::new("t", json!("value")).with_key(json!("key"));

        assert_eq!(source.slot(RecordSlot::Key), Some(&json!("key")));
        assert_eq!(source.slot(RecordSlot::Value), Some(&json!("value")));
    }

    #[test]
    fn test_non_string_payload() {
        let transform = XmlToJson::configure(RecordSlot::Value, &config()).unwrap();
        let source = Record::new("t", json!(42));

        let err = transform.apply(&source).unwrap_err();
        assert_eq!(
            err,
            TransformError::InvalidArgument("Expected an XML string payload, got number".to_string())
        );
    }

    #[test]
    fn test_missing_payload() {
        let transform = XmlToJson::configure(RecordSlot::Key, &config()).unwrap();
        let source = Record::new("t", json!(XML));

        let err = transform.apply(&source).unwrap_err();
        assert_eq!(
            err,
            TransformError::InvalidArgument("Expected an XML string payload, got null".to_string())
        );

        let source = Record::new("t", serde_json::Value::Null);
        let transform = XmlToJson::configure(RecordSlot::Value, &config()).unwrap();
        assert!(matches!(
            transform.apply(&source),
            Err(TransformError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_malformed_payload() {
        let transform = XmlToJson::configure(RecordSlot::Value, &config()).unwrap();
        let source = Record::new("t", json!("<unclosed>"));

        assert!(matches!(
            transform.apply(&source),
            Err(TransformError::InvalidArgument(_))
        ));
    }
}
